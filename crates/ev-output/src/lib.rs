//! `ev-output` — persists simulation runs for offline analysis.
//!
//! [`SimOutputObserver`] plugs into any run driver and forwards three streams
//! to an [`OutputWriter`]:
//!
//! - **agent snapshots**, every `output_interval_ticks`, one row per agent
//!   with position, state, flags and the water depth under it;
//! - **tick summaries**, every tick, population counts and flood volume;
//! - **route events**, whenever a next-hop map for a new target set goes live
//!   during a tick.
//!
//! | Feature   | Backend                | Files                                                      |
//! |-----------|------------------------|------------------------------------------------------------|
//! | *(none)*  | [`CsvWriter`]          | `agent_snapshots.csv`, `tick_summaries.csv`, `route_events.csv` |
//! | `sqlite`  | `SqliteWriter`         | `evacuation.db`                                            |
//!
//! ```rust,ignore
//! std::fs::create_dir_all("output")?;
//! let mut obs = SimOutputObserver::new(CsvWriter::new(Path::new("output"))?);
//! sim.run_until_settled(1.0 / 60.0, 100_000, &mut obs);
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output incomplete: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentSnapshotRow, RouteEventRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
