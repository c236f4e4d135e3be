//! Background next-hop recomputation.
//!
//! Jobs go to a dedicated thread over an `mpsc` channel; finished maps come
//! back over a second channel.  The graph is shared as `Arc<RoadGraph>` and
//! never mutated while a job is in flight, and each result carries the
//! target-set generation it was computed for so the caller can drop stale
//! ones.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use ev_core::NodeId;
use ev_network::{NextHopMap, RoadGraph};

use crate::{SimError, SimResult};

/// How next-hop maps are produced after a target change.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RouteMode {
    /// Compute on a worker thread; agents wait idle at nodes meanwhile.
    #[default]
    Background,
    /// Compute inline inside the target mutation call.
    Blocking,
}

struct RouteJob {
    graph:      Arc<RoadGraph>,
    targets:    Vec<NodeId>,
    generation: u64,
}

pub(crate) struct RouteWorker {
    jobs:    Option<mpsc::Sender<RouteJob>>,
    results: mpsc::Receiver<NextHopMap>,
    handle:  Option<JoinHandle<()>>,
}

impl RouteWorker {
    pub(crate) fn spawn() -> SimResult<Self> {
        let (job_tx, job_rx) = mpsc::channel::<RouteJob>();
        let (result_tx, result_rx) = mpsc::channel::<NextHopMap>();

        let handle = std::thread::Builder::new()
            .name("ev-route-worker".into())
            .spawn(move || run_worker(job_rx, result_tx))
            .map_err(|e| SimError::RouteWorker(e.to_string()))?;

        Ok(RouteWorker { jobs: Some(job_tx), results: result_rx, handle: Some(handle) })
    }

    pub(crate) fn request(&self, graph: Arc<RoadGraph>, targets: Vec<NodeId>, generation: u64) -> SimResult<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| SimError::RouteWorker("worker already shut down".into()))?;
        jobs.send(RouteJob { graph, targets, generation })
            .map_err(|_| SimError::RouteWorker("worker thread exited".into()))
    }

    /// Every result that has arrived so far, oldest first.
    pub(crate) fn drain(&self) -> Vec<NextHopMap> {
        let mut out = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(map) => out.push(map),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::error!("route worker disconnected; no further next-hop updates");
                    break;
                }
            }
        }
        out
    }

    /// Block up to `timeout` for the next result.
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Option<NextHopMap> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for RouteWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("route worker panicked");
            }
        }
    }
}

fn run_worker(jobs: mpsc::Receiver<RouteJob>, results: mpsc::Sender<NextHopMap>) {
    while let Ok(mut job) = jobs.recv() {
        // Only the newest queued job matters.
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }
        let map = job.graph.compute_shortest_path(&job.targets).with_generation(job.generation);
        if results.send(map).is_err() {
            return;
        }
    }
}
