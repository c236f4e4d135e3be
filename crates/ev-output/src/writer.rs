//! Backend interface.

use crate::{AgentSnapshotRow, OutputResult, RouteEventRow, TickSummaryRow};

/// A sink for the three output streams.
///
/// Writers stay usable after [`flush`](Self::flush), so one writer can serve
/// several `run_ticks` calls on the same simulation.
pub trait OutputWriter {
    /// All agents at one snapshot tick.
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    fn write_route_event(&mut self, row: &RouteEventRow) -> OutputResult<()>;

    /// Push buffered rows to storage.
    fn flush(&mut self) -> OutputResult<()>;
}
