//! `ev-sim` — tick loop orchestrator for the rust_evac simulator.
//!
//! # Tick loop
//!
//! ```text
//! tick(frame):
//!   paused?           → return
//!   frame > max       → frame = stall frame
//!   ① Routes  — install finished next-hop maps for the current targets
//!   ② Flood   — FloodField::update(frame, time_multiplier)
//!   ③ Agents  — Population::update(frame × time_multiplier)
//!   ④ Counts  — observer.on_tick_end, snapshot every N ticks
//! ```
//!
//! Target changes never block the loop in [`RouteMode::Background`]: the
//! next-hop computation runs on a worker thread and its result is installed
//! by a later tick, provided the target set has not changed again since.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Plans flood outflows on Rayon's thread pool.           |
//! | `osm`      | Enables `ev_network::OsmPbfSource`.                    |
//! | `serde`    | Serde derives on config and count types.               |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ev_sim::{NoopObserver, Scenario};
//!
//! let scenario = Scenario::load(config, bounds, &source, &raster)?;
//! let mut sim = scenario.into_builder().targets(vec![shelter]).build()?;
//! sim.start();
//! sim.run_until_settled(1.0 / 60.0, 1_000_000, &mut NoopObserver);
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod routes;
pub mod scenario;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TickSummary};
pub use routes::RouteMode;
pub use scenario::Scenario;
pub use sim::Sim;
