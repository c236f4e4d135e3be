//! CSV backend: one file per stream in the output directory.
//!
//! | File                   | Columns                                                                  |
//! |------------------------|--------------------------------------------------------------------------|
//! | `agent_snapshots.csv`  | `agent_id,tick,x,y,z,state,in_flood,is_driving,water_depth`              |
//! | `tick_summaries.csv`   | `tick,sim_secs,active,idle,arrived,stranded,flooded,water_volume`        |
//! | `route_events.csv`     | `tick,generation,target_count,targets`                                   |
//!
//! Floats are written with three decimals, flags as `0`/`1`, and the target
//! list space-separated.

use std::fs::File;
use std::path::Path;

use ::csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, OutputError, OutputResult, RouteEventRow, TickSummaryRow};

pub const SNAPSHOT_HEADER: [&str; 9] =
    ["agent_id", "tick", "x", "y", "z", "state", "in_flood", "is_driving", "water_depth"];
pub const SUMMARY_HEADER: [&str; 8] =
    ["tick", "sim_secs", "active", "idle", "arrived", "stranded", "flooded", "water_volume"];
pub const ROUTE_HEADER: [&str; 4] = ["tick", "generation", "target_count", "targets"];

pub struct CsvWriter {
    snapshots: Writer<File>,
    summaries: Writer<File>,
    routes:    Writer<File>,
}

impl CsvWriter {
    /// Create (truncating) the three files in `dir` and write their headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        if !dir.is_dir() {
            return Err(OutputError::MissingDir(dir.to_path_buf()));
        }
        Ok(Self {
            snapshots: create(dir, "agent_snapshots.csv", &SNAPSHOT_HEADER)?,
            summaries: create(dir, "tick_summaries.csv", &SUMMARY_HEADER)?,
            routes:    create(dir, "route_events.csv", &ROUTE_HEADER)?,
        })
    }
}

fn create(dir: &Path, name: &str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = Writer::from_path(dir.join(name))?;
    w.write_record(header)?;
    Ok(w)
}

#[inline]
fn f3(v: impl Into<f64>) -> String {
    format!("{:.3}", v.into())
}

#[inline]
fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        for r in rows {
            self.snapshots.write_record([
                r.agent_id.to_string(),
                r.tick.to_string(),
                f3(r.x),
                f3(r.y),
                f3(r.z),
                r.state.as_str().to_owned(),
                flag(r.in_flood).to_owned(),
                flag(r.is_driving).to_owned(),
                f3(r.water_depth),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, r: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record([
            r.tick.to_string(),
            f3(r.sim_secs),
            r.active.to_string(),
            r.idle.to_string(),
            r.arrived.to_string(),
            r.stranded.to_string(),
            r.flooded.to_string(),
            f3(r.water_volume),
        ])?;
        Ok(())
    }

    fn write_route_event(&mut self, r: &RouteEventRow) -> OutputResult<()> {
        self.routes.write_record([
            r.tick.to_string(),
            r.generation.to_string(),
            r.targets.len().to_string(),
            r.targets_joined(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.snapshots.flush()?;
        self.summaries.flush()?;
        self.routes.flush()?;
        Ok(())
    }
}
