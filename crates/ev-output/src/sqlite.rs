//! SQLite backend (feature `sqlite`): `evacuation.db` with one table per
//! stream, same columns as the CSV files.  Snapshot batches commit in one
//! transaction each.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, OutputError, OutputResult, RouteEventRow, TickSummaryRow};

pub const DB_FILE: &str = "evacuation.db";

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS agent_snapshots (
        agent_id    INTEGER NOT NULL,
        tick        INTEGER NOT NULL,
        x           REAL    NOT NULL,
        y           REAL    NOT NULL,
        z           REAL    NOT NULL,
        state       TEXT    NOT NULL,
        in_flood    INTEGER NOT NULL,
        is_driving  INTEGER NOT NULL,
        water_depth REAL    NOT NULL,
        PRIMARY KEY (tick, agent_id)
    );
    CREATE TABLE IF NOT EXISTS tick_summaries (
        tick         INTEGER PRIMARY KEY,
        sim_secs     REAL    NOT NULL,
        active       INTEGER NOT NULL,
        idle         INTEGER NOT NULL,
        arrived      INTEGER NOT NULL,
        stranded     INTEGER NOT NULL,
        flooded      INTEGER NOT NULL,
        water_volume REAL    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS route_events (
        tick         INTEGER NOT NULL,
        generation   INTEGER NOT NULL,
        target_count INTEGER NOT NULL,
        targets      TEXT    NOT NULL
    );";

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Open or create [`DB_FILE`] in `dir`.  Existing tables are appended to.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        if !dir.is_dir() {
            return Err(OutputError::MissingDir(dir.to_path_buf()));
        }
        let conn = Connection::open(dir.join(DB_FILE))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO agent_snapshots VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.agent_id,
                    r.tick as i64,
                    f64::from(r.x),
                    f64::from(r.y),
                    f64::from(r.z),
                    r.state.as_str(),
                    r.in_flood,
                    r.is_driving,
                    f64::from(r.water_depth),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, r: &TickSummaryRow) -> OutputResult<()> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO tick_summaries VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)")?
            .execute(params![
                r.tick as i64,
                r.sim_secs,
                r.active as i64,
                r.idle as i64,
                r.arrived as i64,
                r.stranded as i64,
                r.flooded as i64,
                r.water_volume,
            ])?;
        Ok(())
    }

    fn write_route_event(&mut self, r: &RouteEventRow) -> OutputResult<()> {
        self.conn
            .prepare_cached("INSERT INTO route_events VALUES (?1, ?2, ?3, ?4)")?
            .execute(params![r.tick as i64, r.generation as i64, r.targets.len() as i64, r.targets_joined()])?;
        Ok(())
    }

    /// Checkpoint the WAL into the main database file.
    fn flush(&mut self) -> OutputResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
