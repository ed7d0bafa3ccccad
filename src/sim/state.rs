//! Particle storage and burst spawning
//!
//! Particles live in parallel arrays indexed by particle id. The count is
//! fixed for the lifetime of a burst.

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::BurstConfig;

/// Confetti shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Squircle,
    Diamond,
    Triangle,
}

impl ShapeKind {
    /// Spawn rotation order
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Circle,
        ShapeKind::Squircle,
        ShapeKind::Diamond,
        ShapeKind::Triangle,
    ];

    /// Radius used for wall and pair collisions
    pub fn collision_radius(self) -> f64 {
        match self {
            ShapeKind::Circle => 12.0,
            ShapeKind::Squircle => 11.0,
            ShapeKind::Diamond => 10.0,
            ShapeKind::Triangle => 9.0,
        }
    }

    /// Edge length of the sprite the renderer draws
    pub fn visual_size(self) -> f64 {
        match self {
            ShapeKind::Circle => 26.0,
            ShapeKind::Squircle => 24.0,
            ShapeKind::Diamond => 24.0,
            ShapeKind::Triangle => 22.0,
        }
    }

    pub fn half_size(self) -> f64 {
        self.visual_size() / 2.0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Squircle => "squircle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Triangle => "triangle",
        }
    }
}

/// Viewport size (top-left origin, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when a particle of `max_radius` cannot fit between opposite
    /// walls, or the extents are not finite and positive
    pub fn is_degenerate(&self, max_radius: f64) -> bool {
        let min_extent = 2.0 * max_radius;
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.width >= min_extent
            && self.height >= min_extent)
    }
}

/// Structure-of-arrays particle store
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    pub pos: Vec<DVec2>,
    pub vel: Vec<DVec2>,
    /// Rotation (radians)
    pub rotation: Vec<f64>,
    /// Angular velocity (rad/s)
    pub spin: Vec<f64>,
    pub radius: Vec<f64>,
    /// |vx| + |vy| at the start of the current step, before gravity
    pub step_speed: Vec<f64>,
    shape: Vec<ShapeKind>,
}

impl ParticleStore {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            pos: Vec::with_capacity(count),
            vel: Vec::with_capacity(count),
            rotation: Vec::with_capacity(count),
            spin: Vec::with_capacity(count),
            radius: Vec::with_capacity(count),
            step_speed: Vec::with_capacity(count),
            shape: Vec::with_capacity(count),
        }
    }

    /// Append one particle (spawn time only)
    pub fn push(&mut self, pos: DVec2, vel: DVec2, rotation: f64, spin: f64, shape: ShapeKind) {
        self.pos.push(pos);
        self.vel.push(vel);
        self.rotation.push(rotation);
        self.spin.push(spin);
        self.radius.push(shape.collision_radius());
        self.step_speed.push(crate::manhattan_speed(vel));
        self.shape.push(shape);
    }

    /// Launch `count` particles from `origin` in an upward cone
    ///
    /// Shapes are assigned round-robin; everything else comes from `rng`.
    pub fn spawn(origin: DVec2, count: usize, config: &BurstConfig, rng: &mut Pcg32) -> Self {
        let mut store = Self::with_capacity(count);
        let cone = config.spawn_cone_half_angle;
        for i in 0..count {
            let angle = -std::f64::consts::FRAC_PI_2 + lerp(-cone, cone, rng.random::<f64>());
            let speed = lerp(config.spawn_speed_min, config.spawn_speed_max, rng.random::<f64>());
            let jitter = DVec2::new(
                lerp(-config.spawn_jitter, config.spawn_jitter, rng.random::<f64>()),
                lerp(-config.spawn_jitter, config.spawn_jitter, rng.random::<f64>()),
            );
            let rotation = lerp(0.0, std::f64::consts::TAU, rng.random::<f64>());
            let spin = lerp(-config.spawn_spin, config.spawn_spin, rng.random::<f64>());

            let vel = DVec2::new(angle.cos() * speed, angle.sin() * speed);
            let shape = ShapeKind::ALL[i % ShapeKind::ALL.len()];
            store.push(origin + jitter, vel, rotation, spin, shape);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    pub fn shape(&self, index: usize) -> ShapeKind {
        self.shape[index]
    }

    pub fn shapes(&self) -> &[ShapeKind] {
        &self.shape
    }

    /// Largest collision radius (0 when empty)
    pub fn max_radius(&self) -> f64 {
        self.radius.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of |vx| + |vy| over all particles
    pub fn total_speed(&self) -> f64 {
        self.vel.iter().map(|v| crate::manhattan_speed(*v)).sum()
    }

    /// Total kinetic energy assuming unit mass
    pub fn kinetic_energy(&self) -> f64 {
        self.vel.iter().map(|v| 0.5 * v.length_squared()).sum()
    }
}

/// `lo + (hi - lo) * t`
#[inline]
fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    lo + (hi - lo) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_round_robin_shapes() {
        let mut rng = Pcg32::seed_from_u64(7);
        let store = ParticleStore::spawn(DVec2::new(100.0, 100.0), 6, &BurstConfig::default(), &mut rng);
        assert_eq!(store.len(), 6);
        assert_eq!(store.shape(0), ShapeKind::Circle);
        assert_eq!(store.shape(3), ShapeKind::Triangle);
        assert_eq!(store.shape(4), ShapeKind::Circle);
        assert_eq!(store.radius[1], ShapeKind::Squircle.collision_radius());
    }

    #[test]
    fn test_spawn_velocities_in_upward_cone() {
        let config = BurstConfig::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let store = ParticleStore::spawn(DVec2::new(187.0, 100.0), 200, &config, &mut rng);
        for v in &store.vel {
            let speed = v.length();
            assert!(speed >= config.spawn_speed_min - 1e-9);
            assert!(speed < config.spawn_speed_max + 1e-9);
            // Upward (screen y down)
            assert!(v.y < 0.0);
            let off_vertical = (v.x / speed).asin().abs();
            assert!(off_vertical <= config.spawn_cone_half_angle + 1e-9);
        }
    }

    #[test]
    fn test_spawn_is_seeded() {
        let config = BurstConfig::default();
        let a = ParticleStore::spawn(DVec2::ZERO, 15, &config, &mut Pcg32::seed_from_u64(3));
        let b = ParticleStore::spawn(DVec2::ZERO, 15, &config, &mut Pcg32::seed_from_u64(3));
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.vel, b.vel);
        assert_eq!(a.spin, b.spin);
    }

    #[test]
    fn test_collision_radius_smaller_than_sprite() {
        for shape in ShapeKind::ALL {
            assert!(shape.collision_radius() > 0.0);
            assert!(shape.collision_radius() < shape.half_size());
        }
    }

    #[test]
    fn test_degenerate_bounds() {
        assert!(Bounds::new(0.0, 800.0).is_degenerate(12.0));
        assert!(Bounds::new(375.0, -1.0).is_degenerate(12.0));
        assert!(Bounds::new(f64::NAN, 800.0).is_degenerate(12.0));
        assert!(!Bounds::new(375.0, 800.0).is_degenerate(12.0));
    }

    #[test]
    fn test_bounds_too_narrow_for_largest_particle() {
        assert!(Bounds::new(10.0, 800.0).is_degenerate(12.0));
        assert!(Bounds::new(375.0, 23.9).is_degenerate(12.0));
        assert!(!Bounds::new(24.0, 24.0).is_degenerate(12.0));
        assert!(!Bounds::new(10.0, 800.0).is_degenerate(5.0));
    }
}
