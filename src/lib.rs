//! Confetti Burst - tilt-driven confetti physics
//!
//! Core modules:
//! - `sim`: Deterministic simulation (particle store, integrator, collisions)
//! - `frame`: Render-facing snapshot publishing
//! - `sensor`: Tilt sensor port and scripted sources
//! - `engine`: Burst lifecycle (start/stop/tick) tying it all together
//! - `config`: Data-driven tuning

pub mod config;
pub mod engine;
pub mod frame;
pub mod sensor;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{BurstConfig, ConfigError};
pub use engine::{BurstStats, ConfettiEngine, EngineState};
pub use frame::{FrameReader, FrameSnapshot, SpriteStyle, SpriteTransform};
pub use sensor::{ScriptedSensor, SensorSource};
pub use sim::{Bounds, ShapeKind};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum fixed steps per real frame; anything beyond is dropped
    pub const MAX_STEPS_PER_TICK: u32 = 3;
    /// Largest real-frame delta accepted (seconds)
    pub const MAX_FRAME_DELTA: f64 = 0.1;

    /// Particles per burst
    pub const DEFAULT_PARTICLE_COUNT: usize = 15;

    /// Standard gravity in device g-units (m/s²)
    pub const STANDARD_GRAVITY: f64 = 9.81;
    /// Device m/s² to simulation units/s²
    pub const GRAVITY_SCALE: f64 = 2400.0 / STANDARD_GRAVITY;

    /// Velocity retained per step while airborne
    pub const AIR_FRICTION: f64 = 0.998;
    /// Angular velocity retained per step
    pub const ANGULAR_DECAY: f64 = 0.98;

    /// Wall bounce (heavily damped)
    pub const WALL_RESTITUTION: f64 = 0.15;
    /// Tangential velocity retained on floor/ceiling contact
    pub const FLOOR_FRICTION: f64 = 0.85;
    /// Inbound wall speed below which velocity is zeroed
    pub const SETTLE_SPEED: f64 = 3.0;

    /// Gravity smoothing factor
    pub const SMOOTHING: f64 = 0.2;
    /// Gravity smoothing factor after a sign flip
    pub const SNAP_SMOOTHING: f64 = 0.45;
    /// Minimum |raw| on an axis for a sign change to count as a flip
    pub const FLIP_THRESHOLD: f64 = 50.0;

    /// Linear speed (|vx| + |vy|) below which shapes ease upright
    pub const UPRIGHT_SPEED: f64 = 60.0;
    /// Second, slower tier
    pub const UPRIGHT_SLOW_SPEED: f64 = 20.0;
    /// Fraction of the way to upright covered per step
    pub const UPRIGHT_BLEND: f64 = 0.06;
    /// Same, below `UPRIGHT_SLOW_SPEED`
    pub const UPRIGHT_SLOW_BLEND: f64 = 0.15;
    /// Angular velocity retained per step while easing upright
    pub const UPRIGHT_SPIN_DECAY: f64 = 0.85;
    /// Angular velocity snapped to zero below this
    pub const SPIN_EPSILON: f64 = 0.01;

    /// Particle-particle restitution
    pub const COLLISION_RESTITUTION: f64 = 0.15;
    /// Total |v| across all particles below which few iterations suffice
    pub const LOW_ENERGY_THRESHOLD: f64 = 200.0;
    /// Collision sweeps per step while nearly at rest
    pub const LOW_ENERGY_ITERATIONS: u32 = 3;
    /// Collision sweeps per step while moving
    pub const HIGH_ENERGY_ITERATIONS: u32 = 12;

    /// Launch cone half-angle about straight up (~53 degrees)
    pub const SPAWN_CONE_HALF_ANGLE: f64 = 0.925;
    /// Launch speed range (units/s, max exclusive)
    pub const SPAWN_SPEED_MIN: f64 = 450.0;
    pub const SPAWN_SPEED_MAX: f64 = 1000.0;
    /// Spawn position scatter around the origin
    pub const SPAWN_JITTER: f64 = 8.0;
    /// Initial angular velocity range (rad/s, symmetric)
    pub const SPAWN_SPIN: f64 = 10.0;
}

/// Nearest multiple of 2π (the upright pose)
#[inline]
pub fn nearest_upright(rotation: f64) -> f64 {
    use std::f64::consts::TAU;
    (rotation / TAU).round() * TAU
}

/// Device acceleration sample to screen-space gravity
///
/// Device y points up, screen y points down.
#[inline]
pub fn device_to_screen(ax: f64, ay: f64, scale: f64) -> DVec2 {
    DVec2::new(ax * scale, -ay * scale)
}

/// Sum of |vx| + |vy|
#[inline]
pub fn manhattan_speed(vel: DVec2) -> f64 {
    vel.x.abs() + vel.y.abs()
}
