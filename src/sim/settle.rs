//! Upright settling
//!
//! Slow shapes ease toward the nearest upright pose and stop spinning.
//! Not a real angular spring; it only has to look calm at rest.

use super::state::ParticleStore;
use crate::nearest_upright;

#[derive(Debug, Clone, Copy)]
pub struct UprightParams {
    /// Below this speed settling begins
    pub speed: f64,
    /// Below this speed the stronger blend applies
    pub slow_speed: f64,
    pub blend: f64,
    pub slow_blend: f64,
    pub spin_decay: f64,
    pub spin_epsilon: f64,
}

/// Ease slow particles upright
///
/// Speed is taken from `step_speed`, so the gravity added this step does not
/// keep a particle resting on a neighbour from counting as slow.
pub fn settle_rotation(store: &mut ParticleStore, params: &UprightParams) {
    for i in 0..store.len() {
        let speed = store.step_speed[i];
        if speed >= params.speed {
            continue;
        }

        let blend = if speed < params.slow_speed {
            params.slow_blend
        } else {
            params.blend
        };
        let rotation = store.rotation[i];
        store.rotation[i] = rotation + (nearest_upright(rotation) - rotation) * blend;

        let spin = store.spin[i] * params.spin_decay;
        store.spin[i] = if spin.abs() < params.spin_epsilon { 0.0 } else { spin };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ShapeKind;
    use glam::DVec2;
    use std::f64::consts::TAU;

    const PARAMS: UprightParams = UprightParams {
        speed: 60.0,
        slow_speed: 20.0,
        blend: 0.06,
        slow_blend: 0.15,
        spin_decay: 0.85,
        spin_epsilon: 0.01,
    };

    fn single(vel: DVec2, rotation: f64, spin: f64) -> ParticleStore {
        let mut store = ParticleStore::default();
        store.push(DVec2::new(50.0, 50.0), vel, rotation, spin, ShapeKind::Diamond);
        store
    }

    #[test]
    fn test_fast_particles_keep_spinning() {
        let mut store = single(DVec2::new(100.0, 0.0), 1.0, 3.0);
        settle_rotation(&mut store, &PARAMS);
        assert_eq!(store.rotation[0], 1.0);
        assert_eq!(store.spin[0], 3.0);
    }

    #[test]
    fn test_resting_on_neighbour_counts_as_slow() {
        let mut store = single(DVec2::new(0.0, 23.0), 1.0, 0.01);
        // This step's gravity kick, not yet cancelled by the collision pass
        store.vel[0].y = 63.0;
        settle_rotation(&mut store, &PARAMS);
        assert!((store.rotation[0] - 0.94).abs() < 1e-12);
        assert_eq!(store.spin[0], 0.0);
    }

    #[test]
    fn test_slow_tier_blends_harder() {
        let mut medium = single(DVec2::new(40.0, 0.0), 1.0, 0.0);
        let mut slow = single(DVec2::new(5.0, 0.0), 1.0, 0.0);
        settle_rotation(&mut medium, &PARAMS);
        settle_rotation(&mut slow, &PARAMS);
        assert!((medium.rotation[0] - 0.94).abs() < 1e-12);
        assert!((slow.rotation[0] - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_eases_toward_nearest_turn() {
        let mut store = single(DVec2::ZERO, TAU - 0.5, 0.0);
        for _ in 0..200 {
            settle_rotation(&mut store, &PARAMS);
        }
        assert!((store.rotation[0] - TAU).abs() < 1e-6);
    }

    #[test]
    fn test_spin_snaps_to_zero() {
        let mut store = single(DVec2::ZERO, 0.0, 4.0);
        let mut steps = 0;
        while store.spin[0] != 0.0 {
            settle_rotation(&mut store, &PARAMS);
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(store.spin[0], 0.0);
    }
}
