//! FieldSim Core - Robot Field Simulation Engine
//!
//! An ECS-based simulation of a robotics competition field: robots drive
//! around scooping up and shooting cargo, balls roll and bounce and collide,
//! and anything that leaves the field or drops into the hub is held in a
//! delay station before coming back.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Cargo, robots, obstacles
//! - **Components**: Pure data attached to entities (BodyId, BodyKind, Body, Hopper)
//! - **Systems**: Per-body physics, collisions, robot behavior, hub and stations
//!
//! Bodies are stepped one at a time in ascending id order, and each sees the
//! state left by the bodies stepped before it. All randomness comes from a
//! single seeded generator, so a config and seed always replay the same run.
//!
//! # Example
//!
//! ```rust,no_run
//! use fieldsim_core::prelude::*;
//! use fieldsim_logic::config::ArenaConfig;
//!
//! let mut arena = Arena::new(ArenaConfig::default()).unwrap();
//!
//! // Ten simulated seconds at 50 steps per second
//! for _ in 0..500 {
//!     let summary = arena.step().unwrap();
//!     println!("t={:.2} scored={}", summary.elapsed_s, summary.scored);
//! }
//! ```

pub mod components;
pub mod engine;
pub mod stats;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::Arena;
    pub use crate::stats::Summary;
}
