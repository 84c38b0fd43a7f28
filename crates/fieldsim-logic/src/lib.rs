//! Pure physics logic for fieldsim.
//!
//! This crate contains the numerically sensitive parts of the field
//! simulation that are independent of any ECS, engine, or runtime. Functions
//! take plain data and return results, making them unit-testable and usable
//! from the arena engine, the headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bucket`] | Conical-frustum capture zone: inside tests, signed distance, projection |
//! | [`capture`] | Stochastic bounce-and-capture decision for a ball landing in a bucket |
//! | [`collision`] | Sphere overlap, restitution velocity exchange, positional de-penetration |
//! | [`config`] | Arena, station and hub configuration with validation |
//! | [`constants`] | Field dimensions, wall heights, gravity, friction, body presets |
//! | [`delay`] | Latency- and throughput-bounded FIFO for processing stations |
//! | [`error`] | `SimError` and `SimResult` |
//! | [`space`] | Dense-row spatial index with optional toroidal wraparound |
//! | [`vector`] | `Vec3` math used everywhere else |

pub mod bucket;
pub mod capture;
pub mod collision;
pub mod config;
pub mod constants;
pub mod delay;
pub mod error;
pub mod space;
pub mod vector;

pub use error::{SimError, SimResult};
pub use vector::Vec3;
