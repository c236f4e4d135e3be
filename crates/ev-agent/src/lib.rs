//! `ev-agent` — evacuees and their per-tick behaviour.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`agent`]       | `Agent`, `Segment`, `AgentState`                          |
//! | [`collision`]   | `Avoidance`, `avoid_collisions` (forward-cone check)      |
//! | [`grid`]        | `AgentGrid` — hashed uniform grid over agent positions    |
//! | [`spawn`]       | `SpawnDensity` — building-weighted spawn sampling         |
//! | [`population`]  | `Population`, `PopulationBuilder`, `StepContext`, `PopulationCounts` |
//! | [`error`]       | `AgentError`, `AgentResult<T>`                            |
//!
//! # Movement model
//!
//! An agent always sits on one straight segment ending at a graph node and
//! tracks its progress along it in `[0, 1]`.  On reaching the end node it
//! either arrives (the node is a target) or asks the current
//! [`NextHopMap`](ev_network::NextHopMap) for the next node.  Agents never
//! store whole routes, so a target change only requires a new map.
//!
//! # Update order
//!
//! Agents update in population order and read each other's in-progress
//! state: agent `i` sees where agents `0..i` moved to during this tick.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | `Serialize` on `AgentState` and `PopulationCounts`.     |

pub mod agent;
pub mod collision;
pub mod error;
pub mod grid;
pub mod population;
pub mod spawn;


pub use agent::{Agent, AgentState, Segment};
pub use collision::{avoid_collisions, Avoidance};
pub use error::{AgentError, AgentResult};
pub use grid::AgentGrid;
pub use population::{Population, PopulationBuilder, PopulationCounts, StepContext};
pub use spawn::SpawnDensity;
