//! Burst tuning
//!
//! Every physics constant lives here so hosts can ship a JSON override
//! without recompiling. The config is fixed once an engine is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a [`BurstConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Physics and spawn parameters for one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    /// Particles spawned when `start` is not given an explicit count
    pub particle_count: usize,

    // === Integrator ===
    pub dt: f64,
    pub max_steps_per_tick: u32,
    pub max_frame_delta: f64,
    pub air_friction: f64,
    pub angular_decay: f64,

    // === Gravity ===
    pub gravity_scale: f64,
    pub smoothing: f64,
    pub snap_smoothing: f64,
    pub flip_threshold: f64,

    // === Walls ===
    pub wall_restitution: f64,
    pub floor_friction: f64,
    pub settle_speed: f64,

    // === Upright settling ===
    pub upright_speed: f64,
    pub upright_slow_speed: f64,
    pub upright_blend: f64,
    pub upright_slow_blend: f64,
    pub upright_spin_decay: f64,
    pub spin_epsilon: f64,

    // === Collisions ===
    pub collision_restitution: f64,
    pub low_energy_threshold: f64,
    pub low_energy_iterations: u32,
    pub high_energy_iterations: u32,

    // === Spawn ===
    pub spawn_cone_half_angle: f64,
    pub spawn_speed_min: f64,
    pub spawn_speed_max: f64,
    pub spawn_jitter: f64,
    pub spawn_spin: f64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,

            dt: SIM_DT,
            max_steps_per_tick: MAX_STEPS_PER_TICK,
            max_frame_delta: MAX_FRAME_DELTA,
            air_friction: AIR_FRICTION,
            angular_decay: ANGULAR_DECAY,

            gravity_scale: GRAVITY_SCALE,
            smoothing: SMOOTHING,
            snap_smoothing: SNAP_SMOOTHING,
            flip_threshold: FLIP_THRESHOLD,

            wall_restitution: WALL_RESTITUTION,
            floor_friction: FLOOR_FRICTION,
            settle_speed: SETTLE_SPEED,

            upright_speed: UPRIGHT_SPEED,
            upright_slow_speed: UPRIGHT_SLOW_SPEED,
            upright_blend: UPRIGHT_BLEND,
            upright_slow_blend: UPRIGHT_SLOW_BLEND,
            upright_spin_decay: UPRIGHT_SPIN_DECAY,
            spin_epsilon: SPIN_EPSILON,

            collision_restitution: COLLISION_RESTITUTION,
            low_energy_threshold: LOW_ENERGY_THRESHOLD,
            low_energy_iterations: LOW_ENERGY_ITERATIONS,
            high_energy_iterations: HIGH_ENERGY_ITERATIONS,

            spawn_cone_half_angle: SPAWN_CONE_HALF_ANGLE,
            spawn_speed_min: SPAWN_SPEED_MIN,
            spawn_speed_max: SPAWN_SPEED_MAX,
            spawn_jitter: SPAWN_JITTER,
            spawn_spin: SPAWN_SPIN,
        }
    }
}

impl BurstConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Straight-down gravity in simulation units (device at rest, upright)
    pub fn default_gravity(&self) -> f64 {
        self.gravity_scale * STANDARD_GRAVITY
    }

    /// Reject values that would make the simulation unstable or NaN
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
            ConfigError::Invalid { field, reason }
        }
        fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(invalid(field, "must be within [0, 1]"))
            }
        }
        fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(invalid(field, "must be finite and non-negative"))
            }
        }

        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid("dt", "must be positive"));
        }
        if self.max_steps_per_tick == 0 {
            return Err(invalid("max_steps_per_tick", "must be at least 1"));
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(invalid("max_frame_delta", "must be positive"));
        }
        if !(self.gravity_scale.is_finite()) {
            return Err(invalid("gravity_scale", "must be finite"));
        }
        for (field, alpha) in [
            ("smoothing", self.smoothing),
            ("snap_smoothing", self.snap_smoothing),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(invalid(field, "must be within (0, 1]"));
            }
        }

        unit("air_friction", self.air_friction)?;
        unit("angular_decay", self.angular_decay)?;
        unit("wall_restitution", self.wall_restitution)?;
        unit("floor_friction", self.floor_friction)?;
        unit("upright_blend", self.upright_blend)?;
        unit("upright_slow_blend", self.upright_slow_blend)?;
        unit("upright_spin_decay", self.upright_spin_decay)?;
        unit("collision_restitution", self.collision_restitution)?;

        non_negative("flip_threshold", self.flip_threshold)?;
        non_negative("settle_speed", self.settle_speed)?;
        non_negative("upright_speed", self.upright_speed)?;
        non_negative("upright_slow_speed", self.upright_slow_speed)?;
        non_negative("spin_epsilon", self.spin_epsilon)?;
        non_negative("low_energy_threshold", self.low_energy_threshold)?;
        non_negative("spawn_cone_half_angle", self.spawn_cone_half_angle)?;
        non_negative("spawn_jitter", self.spawn_jitter)?;
        non_negative("spawn_spin", self.spawn_spin)?;
        non_negative("spawn_speed_min", self.spawn_speed_min)?;

        if !(self.spawn_speed_max.is_finite() && self.spawn_speed_max > self.spawn_speed_min) {
            return Err(invalid("spawn_speed_max", "must exceed spawn_speed_min"));
        }
        if self.low_energy_iterations == 0 || self.high_energy_iterations == 0 {
            return Err(invalid("low_energy_iterations", "iteration counts must be at least 1"));
        }

        Ok(())
    }
}
