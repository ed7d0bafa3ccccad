//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by particle index)
//! - No rendering, sensor or platform dependencies

pub mod boundary;
pub mod clock;
pub mod collision;
pub mod gravity;
pub mod settle;
pub mod state;
pub mod tick;

pub use boundary::{WallParams, enforce_walls, reclamp_walls};
pub use clock::SimulationClock;
pub use collision::{
    CollisionParams, Contact, contact, resolve_collisions, resolve_pair,
    topple_wall_stacks,
};
pub use gravity::{GravityFeed, GravityState, SensorSmoother};
pub use settle::{UprightParams, settle_rotation};
pub use state::{Bounds, ParticleStore, ShapeKind};
pub use tick::{StepParams, integrate, step};
