//! Pairwise collision detection and response
//!
//! Equal-mass circles: overlapping pairs are pushed apart by half the overlap
//! each, then an impulse along the contact normal removes the approaching
//! component of their relative velocity. Tangential velocity is untouched.

use glam::DVec2;

use super::boundary::reclamp_walls;
use super::state::{Bounds, ParticleStore};

/// Pairs closer than this (squared) are treated as coincident and skipped
const COINCIDENT_DIST_SQ: f64 = 1e-6;

/// Horizontal offset below which a resting contact counts as a vertical stack
const STACK_ALIGN: f64 = 0.5;
/// Gap still treated as touching when looking for stacks
const STACK_CONTACT_SLOP: f64 = 0.5;
/// Sideways shift given to the upper particle of a wall stack
const STACK_NUDGE: f64 = 1.0;
const WALL_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct CollisionParams {
    pub restitution: f64,
    /// Total |v| below which `low_iterations` are used
    pub low_energy_threshold: f64,
    pub low_iterations: u32,
    pub high_iterations: u32,
}

impl CollisionParams {
    /// Spend effort only while things are moving
    pub fn iterations_for(&self, total_speed: f64) -> u32 {
        if total_speed < self.low_energy_threshold {
            self.low_iterations
        } else {
            self.high_iterations
        }
    }
}

/// Result of a single pair check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal from `i` toward `j`
    pub normal: DVec2,
    pub overlap: f64,
}

/// Contact between two circles, if they overlap
///
/// `cutoff_sq` rejects distant pairs before the square root.
#[inline]
pub fn contact(pos_i: DVec2, r_i: f64, pos_j: DVec2, r_j: f64, cutoff_sq: f64) -> Option<Contact> {
    let delta = pos_j - pos_i;
    let dist_sq = delta.length_squared();
    if dist_sq > cutoff_sq || dist_sq < COINCIDENT_DIST_SQ {
        return None;
    }
    let dist = dist_sq.sqrt();
    let overlap = (r_i + r_j) - dist;
    if overlap <= 0.0 {
        return None;
    }
    Some(Contact {
        normal: delta / dist,
        overlap,
    })
}

/// Separate and exchange momentum for one pair. Returns true on contact.
pub fn resolve_pair(store: &mut ParticleStore, i: usize, j: usize, cutoff_sq: f64, restitution: f64) -> bool {
    let Some(Contact { normal, overlap }) =
        contact(store.pos[i], store.radius[i], store.pos[j], store.radius[j], cutoff_sq)
    else {
        return false;
    };

    let correction = normal * (overlap * 0.5);
    store.pos[i] -= correction;
    store.pos[j] += correction;

    // Positive when approaching
    let approach = (store.vel[i] - store.vel[j]).dot(normal);
    if approach > 0.0 {
        let impulse = normal * (approach * 0.5 * (1.0 + restitution));
        store.vel[i] -= impulse;
        store.vel[j] += impulse;
    }
    true
}

/// One sweep over every unordered pair. Returns the number of contacts.
pub fn resolve_all_pairs(store: &mut ParticleStore, cutoff_sq: f64, restitution: f64) -> usize {
    let n = store.len();
    let mut contacts = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            if resolve_pair(store, i, j, cutoff_sq, restitution) {
                contacts += 1;
            }
        }
    }
    contacts
}

/// Iterated resolution with an energy-adaptive iteration count
///
/// Walls are re-clamped after every sweep so that a particle pushed into a
/// wall is separated from its neighbours again by the next sweep.
pub fn resolve_collisions(store: &mut ParticleStore, bounds: Bounds, params: &CollisionParams) {
    let max_radius = store.max_radius();
    let cutoff_sq = 4.0 * max_radius * max_radius;
    let iterations = params.iterations_for(store.total_speed());
    for _ in 0..iterations {
        let contacts = resolve_all_pairs(store, cutoff_sq, params.restitution);
        reclamp_walls(store, bounds);
        if contacts == 0 {
            break;
        }
    }
}

/// Tip over particles balanced directly on a neighbour against a side wall
///
/// A vertical contact normal has no sideways component and the wall blocks
/// the upper particle, so the stack would never come apart. Shifting the
/// upper particle off the wall lets the next sweep roll it down.
pub fn topple_wall_stacks(store: &mut ParticleStore, bounds: Bounds) {
    let n = store.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let delta = store.pos[j] - store.pos[i];
            if delta.x.abs() >= STACK_ALIGN
                || delta.length() > store.radius[i] + store.radius[j] + STACK_CONTACT_SLOP
            {
                continue;
            }

            let upper = if store.pos[i].y < store.pos[j].y { i } else { j };
            let r = store.radius[upper];
            let x = &mut store.pos[upper].x;
            if *x <= r + WALL_EPS {
                *x += STACK_NUDGE;
            } else if *x >= bounds.width - r - WALL_EPS {
                *x -= STACK_NUDGE;
            }
        }
    }
}
