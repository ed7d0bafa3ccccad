//! Fixed timestep physics step
//!
//! Integrate → walls → upright settle → collisions → wall re-clamp.
//! The collision pass also re-clamps after every sweep and first tips over
//! particles balanced on a neighbour against a side wall.

use glam::DVec2;

use super::boundary::{WallParams, enforce_walls, reclamp_walls};
use super::collision::{CollisionParams, resolve_collisions, topple_wall_stacks};
use super::settle::{UprightParams, settle_rotation};
use super::state::{Bounds, ParticleStore};
use crate::config::BurstConfig;
use crate::manhattan_speed;

/// Everything one fixed step needs, pulled out of [`BurstConfig`] once
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub dt: f64,
    pub air_friction: f64,
    pub angular_decay: f64,
    pub walls: WallParams,
    pub upright: UprightParams,
    pub collisions: CollisionParams,
}

impl From<&BurstConfig> for StepParams {
    fn from(config: &BurstConfig) -> Self {
        Self {
            dt: config.dt,
            air_friction: config.air_friction,
            angular_decay: config.angular_decay,
            walls: WallParams {
                restitution: config.wall_restitution,
                floor_friction: config.floor_friction,
                settle_speed: config.settle_speed,
            },
            upright: UprightParams {
                speed: config.upright_speed,
                slow_speed: config.upright_slow_speed,
                blend: config.upright_blend,
                slow_blend: config.upright_slow_blend,
                spin_decay: config.upright_spin_decay,
                spin_epsilon: config.spin_epsilon,
            },
            collisions: CollisionParams {
                restitution: config.collision_restitution,
                low_energy_threshold: config.low_energy_threshold,
                low_iterations: config.low_energy_iterations,
                high_iterations: config.high_energy_iterations,
            },
        }
    }
}

/// Semi-implicit Euler with air drag
pub fn integrate(store: &mut ParticleStore, gravity: DVec2, params: &StepParams) {
    let dt = params.dt;
    for i in 0..store.len() {
        store.step_speed[i] = manhattan_speed(store.vel[i]);
        let vel = (store.vel[i] + gravity * dt) * params.air_friction;
        store.vel[i] = vel;
        store.pos[i] += vel * dt;
        store.rotation[i] += store.spin[i] * dt;
        store.spin[i] *= params.angular_decay;
    }
}

/// Advance the store by one fixed step
pub fn step(store: &mut ParticleStore, gravity: DVec2, bounds: Bounds, params: &StepParams) {
    integrate(store, gravity, params);
    enforce_walls(store, bounds, &params.walls);
    settle_rotation(store, &params.upright);
    topple_wall_stacks(store, bounds);
    resolve_collisions(store, bounds, &params.collisions);
    // Collisions can push particles back through a wall
    reclamp_walls(store, bounds);
}
