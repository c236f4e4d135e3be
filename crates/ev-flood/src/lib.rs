//! `ev-flood` — cellular flood-height field with explicit water transport.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`grid`]    | `GridDims`, `CellCoord`, `GridGeometry` (planar ↔ cell)    |
//! | [`terrain`] | `TerrainGrid` (one terrain height per cell)                |
//! | [`field`]   | `FloodField`, `WaterSource`, `StepReport`                  |
//! | [`error`]   | `FloodError`, `FloodResult<T>`                             |
//!
//! # Model
//!
//! Each cell holds a water height over an immutable terrain height.  A fixed
//! substep moves water from every cell above the minimum height toward each
//! axis neighbour whose water surface is lower, proportionally to
//! `gravity * sqrt(h) * head_difference * friction`.  Per-neighbour flow is
//! capped at an even share of the cell, total outflow never exceeds the
//! cell, and evaporation is floored at zero, so heights stay non-negative.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Plans per-cell outflows with Rayon.                     |
//! | `serde`    | Derives `Serialize`/`Deserialize` on `WaterSource`.     |

pub mod error;
pub mod field;
pub mod grid;
pub mod terrain;


pub use error::{FloodError, FloodResult};
pub use field::{FloodField, StepReport, WaterSource};
pub use grid::{CellCoord, GridDims, GridGeometry};
pub use terrain::TerrainGrid;
