//! Bridge from simulation callbacks to an [`OutputWriter`].

use ev_agent::{Agent, PopulationCounts};
use ev_core::{NodeId, Tick};
use ev_flood::FloodField;
use ev_sim::{SimObserver, TickSummary};
use log::error;

use crate::row::{AgentSnapshotRow, RouteEventRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Records every tick summary, each snapshot and each route install.
///
/// Observer callbacks cannot fail, so the first write error is kept (and
/// logged) for [`take_error`](Self::take_error); later ones are dropped.
/// Writing continues after an error.
pub struct SimOutputObserver<W: OutputWriter> {
    writer:    W,
    tick:      Tick,
    first_err: Option<OutputError>,
    rows:      u64,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, tick: Tick::default(), first_err: None, rows: 0 }
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.first_err.take()
    }

    /// Rows handed to the writer so far, across all streams.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn record(&mut self, rows: usize, result: OutputResult<()>) {
        match result {
            Ok(()) => self.rows += rows as u64,
            Err(e) if self.first_err.is_none() => {
                error!("output write failed at {}: {e}", self.tick);
                self.first_err = Some(e);
            }
            Err(_) => {}
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_start(&mut self, tick: Tick) {
        self.tick = tick;
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(summary));
        self.record(1, result);
    }

    fn on_snapshot(&mut self, tick: Tick, agents: &[Agent], flood: &FloodField) {
        if agents.is_empty() {
            return;
        }
        let rows: Vec<AgentSnapshotRow> = agents
            .iter()
            .map(|a| AgentSnapshotRow::from_agent(tick, a, flood))
            .collect();
        let result = self.writer.write_snapshots(&rows);
        self.record(rows.len(), result);
    }

    fn on_routes_installed(&mut self, generation: u64, targets: &[NodeId]) {
        let result = self.writer.write_route_event(&RouteEventRow::new(self.tick, generation, targets));
        self.record(1, result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick, _counts: &PopulationCounts) {
        let result = self.writer.flush();
        self.record(0, result);
    }
}
