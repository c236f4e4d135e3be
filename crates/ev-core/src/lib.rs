//! `ev-core` — foundational types for the `rust_evac` flood evacuation
//! simulator.
//!
//! This crate is a dependency of every other `ev-*` crate.  It has no `ev-*`
//! dependencies and only a handful of external ones (`glam`, `rand`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`                                       |
//! | [`geo`]         | `GeoPoint`, `GeoBounds`, `LocalProjection`                |
//! | [`sample`]      | `GridSample<T>` — in-bounds reading vs. clamped fallback  |
//! | [`elevation`]   | `ElevationSampler` trait, `ElevationRaster` (bilinear)    |
//! | [`time`]        | `Tick`, `SimClock`                                        |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`config`]      | `SimConfig`, `AgentParams`, `CollisionParams`, `FloodParams` |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Coordinate convention
//!
//! Positions are `glam::Vec3` in metres relative to the centre of the study
//! area: `x` grows east, `y` is height, `z` grows north.  The planar
//! footprint of a position is `(x, z)`.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to config and geo types.    |

pub mod config;
pub mod elevation;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod sample;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AgentParams, CollisionParams, FloodParams, SimConfig, ValueRange};
pub use elevation::{ElevationRaster, ElevationSampler};
pub use error::{CoreError, CoreResult};
pub use geo::{GeoBounds, GeoPoint, LocalProjection};
pub use glam::{Vec2, Vec3, Vec3Swizzles};
pub use ids::{AgentId, NodeId};
pub use rng::{AgentRng, SimRng};
pub use sample::GridSample;
pub use time::{SimClock, Tick};
