//! Viewport walls
//!
//! Two passes: [`enforce_walls`] bounces with restitution and floor friction,
//! [`reclamp_walls`] runs after collisions and only repositions.

use super::state::{Bounds, ParticleStore};

/// Wall response parameters
#[derive(Debug, Clone, Copy)]
pub struct WallParams {
    pub restitution: f64,
    pub floor_friction: f64,
    pub settle_speed: f64,
}

/// New normal velocity after a wall contact
///
/// `inbound` is the speed into the wall (positive when approaching).
/// Returns the outbound speed away from the wall.
#[inline]
fn bounce(inbound: f64, params: &WallParams) -> f64 {
    if inbound < params.settle_speed {
        0.0
    } else {
        inbound * params.restitution
    }
}

/// First pass: reposition onto the wall and bounce
pub fn enforce_walls(store: &mut ParticleStore, bounds: Bounds, params: &WallParams) {
    for i in 0..store.len() {
        let r = store.radius[i];
        let pos = &mut store.pos[i];
        let vel = &mut store.vel[i];

        // Side walls: no extra friction
        if pos.x < r {
            pos.x = r;
            vel.x = bounce(-vel.x, params);
        } else if pos.x > bounds.width - r {
            pos.x = bounds.width - r;
            vel.x = -bounce(vel.x, params);
        }

        // Ceiling and floor
        if pos.y < r {
            pos.y = r;
            vel.y = bounce(-vel.y, params);
            vel.x *= params.floor_friction;
        } else if pos.y > bounds.height - r {
            pos.y = bounds.height - r;
            vel.y = -bounce(vel.y, params);
            vel.x *= params.floor_friction;
        }
    }
}

/// Second pass: reposition and zero outward velocity, no restitution
pub fn reclamp_walls(store: &mut ParticleStore, bounds: Bounds) {
    for i in 0..store.len() {
        let r = store.radius[i];
        let pos = &mut store.pos[i];
        let vel = &mut store.vel[i];

        if pos.x < r {
            pos.x = r;
            vel.x = vel.x.max(0.0);
        } else if pos.x > bounds.width - r {
            pos.x = bounds.width - r;
            vel.x = vel.x.min(0.0);
        }

        if pos.y < r {
            pos.y = r;
            vel.y = vel.y.max(0.0);
        } else if pos.y > bounds.height - r {
            pos.y = bounds.height - r;
            vel.y = vel.y.min(0.0);
        }
    }
}
