//! Burst lifecycle
//!
//! A [`ConfettiEngine`] is either Inactive (nothing allocated) or Active
//! (particles, clock and gravity smoother for one burst). The host drives it
//! with `tick` from its own frame loop; the engine never schedules anything.

use std::sync::Arc;

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::BurstConfig;
use crate::frame::{FramePublisher, FrameReader, FrameSnapshot, SpriteStyle, assign_styles};
use crate::manhattan_speed;
use crate::sensor::SensorSource;
use crate::sim::{
    Bounds, GravityFeed, GravityState, ParticleStore, SensorSmoother, SimulationClock, StepParams,
    step,
};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No particles, ticks are ignored
    Inactive,
    /// A burst is running
    Active,
}

/// Diagnostics for the running burst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstStats {
    /// Seed the burst was spawned from (replay with `start(.., Some(seed))`)
    pub seed: u64,
    pub particle_count: usize,
    /// Ticks processed
    pub frame: u64,
    /// Fixed steps executed across all ticks
    pub total_steps: u64,
    pub steps_last_tick: u32,
    pub gravity: GravityState,
    pub kinetic_energy: f64,
    /// Every particle is slow and has stopped spinning
    pub resting: bool,
}

/// Everything owned by one burst; dropped wholesale on stop
#[derive(Debug)]
struct Burst {
    seed: u64,
    store: ParticleStore,
    bounds: Bounds,
    clock: SimulationClock,
    smoother: SensorSmoother,
    styles: Arc<[SpriteStyle]>,
    frame: u64,
    total_steps: u64,
    steps_last_tick: u32,
}

/// Confetti physics engine
pub struct ConfettiEngine {
    config: BurstConfig,
    params: StepParams,
    feed: GravityFeed,
    publisher: Arc<FramePublisher>,
    sensor: Option<Box<dyn SensorSource>>,
    burst: Option<Burst>,
}

impl std::fmt::Debug for ConfettiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfettiEngine")
            .field("state", &self.state())
            .field("has_sensor", &self.sensor.is_some())
            .field("burst", &self.burst)
            .finish()
    }
}

impl Default for ConfettiEngine {
    fn default() -> Self {
        Self::new(BurstConfig::default())
    }
}

impl ConfettiEngine {
    pub fn new(config: BurstConfig) -> Self {
        let params = StepParams::from(&config);
        let feed = GravityFeed::new(&config);
        Self {
            config,
            params,
            feed,
            publisher: Arc::new(FramePublisher::new()),
            sensor: None,
            burst: None,
        }
    }

    /// Attach a tilt sensor, subscribed for the duration of each burst
    pub fn with_sensor(mut self, sensor: impl SensorSource + 'static) -> Self {
        self.set_sensor(Box::new(sensor));
        self
    }

    /// Replace the tilt sensor
    pub fn set_sensor(&mut self, mut sensor: Box<dyn SensorSource>) {
        if let Some(old) = self.sensor.as_mut() {
            old.unsubscribe();
        }
        if self.burst.is_some() {
            sensor.subscribe(self.feed.clone());
        }
        self.sensor = Some(sensor);
    }

    pub fn config(&self) -> &BurstConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        if self.burst.is_some() {
            EngineState::Active
        } else {
            EngineState::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        self.burst.is_some()
    }

    /// Start a burst with the configured particle count and a random seed
    pub fn start_default(&mut self, origin: DVec2, bounds: Bounds) -> u64 {
        self.start(origin, bounds, self.config.particle_count, None)
    }

    /// Launch `count` particles from `origin`. Calling this while active
    /// discards the running burst first. Returns the seed used.
    pub fn start(&mut self, origin: DVec2, bounds: Bounds, count: usize, seed: Option<u64>) -> u64 {
        if self.burst.is_some() {
            log::debug!("Restarting active burst");
            self.stop();
        }

        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let store = ParticleStore::spawn(origin, count, &self.config, &mut rng);
        if bounds.is_degenerate(store.max_radius()) {
            log::warn!(
                "Burst started with degenerate bounds {}x{}; physics will not step",
                bounds.width,
                bounds.height
            );
        }

        let styles = assign_styles(&store);
        self.publisher.publish(FrameSnapshot::capture(&store, 0));

        self.feed.connect();
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.subscribe(self.feed.clone());
        }

        self.burst = Some(Burst {
            seed,
            store,
            bounds,
            clock: SimulationClock::new(),
            smoother: SensorSmoother::new(&self.config),
            styles,
            frame: 0,
            total_steps: 0,
            steps_last_tick: 0,
        });
        log::info!("Confetti burst started: {count} particles, seed {seed}");
        seed
    }

    /// Halt and discard the burst. No-op when inactive.
    pub fn stop(&mut self) {
        let Some(burst) = self.burst.take() else {
            return;
        };
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.unsubscribe();
        }
        self.feed.disconnect();
        self.publisher.clear();
        log::info!(
            "Confetti burst stopped after {} frames ({} steps)",
            burst.frame,
            burst.total_steps
        );
    }

    /// Device acceleration sample (m/s², device axes)
    ///
    /// Only records the raw vector; smoothing happens once per fixed step of
    /// the next tick.
    pub fn on_sensor_sample(&self, ax: f64, ay: f64) {
        self.feed.push_sample(ax, ay);
    }

    /// Handle for a sensor callback running in another context
    pub fn gravity_feed(&self) -> GravityFeed {
        self.feed.clone()
    }

    /// Advance by the real time elapsed since the previous tick and publish
    /// a new snapshot
    pub fn tick(&mut self, timestamp_ms: f64) {
        let Some(burst) = self.burst.as_mut() else {
            return;
        };
        if burst.bounds.is_degenerate(burst.store.max_radius()) {
            burst.steps_last_tick = 0;
            return;
        }

        let steps = burst.clock.advance(
            timestamp_ms,
            self.config.dt,
            self.config.max_frame_delta,
            self.config.max_steps_per_tick,
        );
        let raw = self.feed.raw();
        for _ in 0..steps {
            let gravity = burst.smoother.ingest(raw);
            step(&mut burst.store, gravity, burst.bounds, &self.params);
        }

        burst.frame += 1;
        burst.total_steps += u64::from(steps);
        burst.steps_last_tick = steps;
        log::trace!("Frame {}: {} steps", burst.frame, steps);

        self.publisher
            .publish(FrameSnapshot::capture(&burst.store, burst.frame));
    }

    /// Latest published frame (empty while inactive)
    pub fn snapshot(&self) -> Arc<FrameSnapshot> {
        self.publisher.latest()
    }

    /// Read handle for a renderer on another thread
    pub fn frame_reader(&self) -> FrameReader {
        FrameReader::new(Arc::clone(&self.publisher))
    }

    /// Shape and color per particle index, fixed at start
    pub fn styles(&self) -> Option<Arc<[SpriteStyle]>> {
        self.burst.as_ref().map(|b| Arc::clone(&b.styles))
    }

    /// Read-only view of the particle store
    pub fn particles(&self) -> Option<&ParticleStore> {
        self.burst.as_ref().map(|b| &b.store)
    }

    pub fn stats(&self) -> Option<BurstStats> {
        let burst = self.burst.as_ref()?;
        let store = &burst.store;
        let resting = (0..store.len()).all(|i| {
            manhattan_speed(store.vel[i]) < self.config.upright_speed && store.spin[i] == 0.0
        });
        Some(BurstStats {
            seed: burst.seed,
            particle_count: store.len(),
            frame: burst.frame,
            total_steps: burst.total_steps,
            steps_last_tick: burst.steps_last_tick,
            gravity: burst.smoother.state(),
            kinetic_energy: store.kinetic_energy(),
            resting,
        })
    }
}

impl Drop for ConfettiEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ScriptedSensor;

    const ORIGIN: DVec2 = DVec2::new(187.0, 100.0);
    const BOUNDS: Bounds = Bounds {
        width: 375.0,
        height: 800.0,
    };

    fn run_frames(engine: &mut ConfettiEngine, frames: u32) {
        for frame in 0..=frames {
            engine.tick(frame as f64 * 1000.0 / 60.0);
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut engine = ConfettiEngine::default();
        assert_eq!(engine.state(), EngineState::Inactive);
        // Ticks and stops while inactive are no-ops
        engine.tick(0.0);
        engine.stop();
        assert!(engine.snapshot().is_empty());

        engine.start(ORIGIN, BOUNDS, 15, Some(1));
        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(engine.snapshot().len(), 15);
        assert_eq!(engine.styles().map(|s| s.len()), Some(15));

        engine.stop();
        assert_eq!(engine.state(), EngineState::Inactive);
        assert!(engine.snapshot().is_empty());
        assert!(engine.stats().is_none());
        assert!(engine.styles().is_none());
    }

    #[test]
    fn test_restart_fully_resets() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, BOUNDS, 15, Some(9));
        let initial = engine.snapshot();
        run_frames(&mut engine, 30);
        engine.on_sensor_sample(9.81, 0.0);
        engine.tick(600.0);
        assert_eq!(engine.stats().map(|s| s.frame), Some(32));

        engine.start(ORIGIN, BOUNDS, 15, Some(9));
        let stats = engine.stats().expect("active");
        assert_eq!(stats.frame, 0);
        assert_eq!(stats.total_steps, 0);
        assert!((stats.gravity.raw.y - 2400.0).abs() < 1e-9);
        assert_eq!(*engine.snapshot(), *initial);
    }

    #[test]
    fn test_single_large_jump_runs_at_most_three_steps() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, BOUNDS, 15, Some(3));
        engine.tick(0.0);
        engine.tick(5_000.0);
        let stats = engine.stats().expect("active");
        assert_eq!(stats.steps_last_tick, 3);
        assert_eq!(stats.total_steps, 4);
    }

    #[test]
    fn test_degenerate_bounds_do_not_step() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, Bounds::new(0.0, -10.0), 5, Some(2));
        let before = engine.snapshot();
        run_frames(&mut engine, 10);
        let after = engine.snapshot();
        assert_eq!(*before, *after);
        assert!(after.as_flat().iter().all(|v| v.is_finite()));
    }

    /// Worst pairwise penetration in the store
    fn worst_overlap(store: &ParticleStore) -> f64 {
        let mut worst = 0.0f64;
        for i in 0..store.len() {
            for j in (i + 1)..store.len() {
                let dist = store.pos[i].distance(store.pos[j]);
                worst = worst.max(store.radius[i] + store.radius[j] - dist);
            }
        }
        worst
    }

    #[test]
    fn test_burst_settles_upright_on_floor() {
        for seed in 0..24 {
            let mut engine = ConfettiEngine::default();
            engine.start(ORIGIN, BOUNDS, 15, Some(seed));
            run_frames(&mut engine, 300);

            let store = engine.particles().expect("active");
            for i in 0..store.len() {
                let floor = BOUNDS.height - store.radius[i];
                assert!(
                    (store.pos[i].y - floor).abs() <= 1.0,
                    "seed {seed}: particle {i} at y={} (floor {floor})",
                    store.pos[i].y
                );
                assert_eq!(store.spin[i], 0.0, "seed {seed}: particle {i} still spinning");
            }
            assert!(engine.stats().is_some_and(|s| s.resting), "seed {seed}");
        }
    }

    #[test]
    fn test_particles_stay_apart_every_frame() {
        for seed in 0..24 {
            let mut engine = ConfettiEngine::default();
            engine.start(ORIGIN, BOUNDS, 15, Some(seed));
            for frame in 0..=300 {
                engine.tick(frame as f64 * 1000.0 / 60.0);
                let overlap = worst_overlap(engine.particles().expect("active"));
                assert!(overlap <= 2.0, "seed {seed} frame {frame}: overlap {overlap}");
            }
            let overlap = worst_overlap(engine.particles().expect("active"));
            assert!(overlap <= 0.01, "seed {seed} at rest: overlap {overlap}");
        }
    }

    #[test]
    fn test_zero_step_tick_leaves_gravity_alone() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, BOUNDS, 15, Some(6));
        engine.on_sensor_sample(9.81, 0.0);
        engine.tick(100.0);
        let smoothed = engine.stats().expect("active").gravity.smoothed;
        assert!(smoothed.x > 0.0);

        // Same timestamp, earlier timestamp and NaN all run zero steps
        for ts in [100.0, 50.0, f64::NAN] {
            engine.tick(ts);
            let stats = engine.stats().expect("active");
            assert_eq!(stats.steps_last_tick, 0);
            assert_eq!(stats.gravity.smoothed, smoothed);
        }
    }

    #[test]
    fn test_smoothing_follows_simulated_time() {
        let converge = |frame_ms: f64, ticks: u32| {
            let mut engine = ConfettiEngine::default();
            engine.start(ORIGIN, BOUNDS, 15, Some(6));
            engine.on_sensor_sample(9.81, 0.0);
            for tick in 0..ticks {
                engine.tick(f64::from(tick) * frame_ms);
            }
            let stats = engine.stats().expect("active");
            (stats.total_steps, stats.gravity.smoothed)
        };

        // Half a second at 60 Hz and at 120 Hz
        let (steps_60, smoothed_60) = converge(1000.0 / 60.0, 31);
        let (steps_120, smoothed_120) = converge(1000.0 / 120.0, 61);
        assert_eq!(steps_60, steps_120);
        assert!((smoothed_60 - smoothed_120).length() < 1e-9);
    }

    #[test]
    fn test_viewport_narrower_than_a_particle_does_not_step() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, Bounds::new(10.0, 800.0), 15, Some(2));
        let before = engine.snapshot();
        run_frames(&mut engine, 10);
        assert_eq!(*before, *engine.snapshot());
        assert_eq!(engine.stats().map(|s| s.total_steps), Some(0));
    }

    #[test]
    fn test_same_seed_same_frames() {
        let samples: Vec<(f64, f64)> = (0..120)
            .map(|i| {
                let t = i as f64 * 0.05;
                (t.sin() * 6.0, -9.81 * t.cos())
            })
            .collect();

        let run = || {
            let sensor = ScriptedSensor::new(samples.clone());
            let mut engine = ConfettiEngine::default().with_sensor(sensor.clone());
            engine.start(ORIGIN, BOUNDS, 15, Some(0xC0FFEE));
            let mut frames = Vec::new();
            for frame in 0..120 {
                sensor.emit_next();
                engine.tick(frame as f64 * 1000.0 / 60.0);
                frames.push(engine.snapshot().as_flat().to_vec());
            }
            frames
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_sensor_subscribed_only_while_active() {
        let sensor = ScriptedSensor::new([(0.0, 9.81), (0.0, 9.81)]);
        let mut engine = ConfettiEngine::default().with_sensor(sensor.clone());
        assert!(!sensor.is_subscribed());

        engine.start(ORIGIN, BOUNDS, 4, Some(5));
        assert!(sensor.is_subscribed());
        assert!(sensor.emit_next());
        engine.tick(0.0);
        let gravity = engine.stats().expect("active").gravity;
        assert!(gravity.raw.y < 0.0);

        engine.stop();
        assert!(!sensor.is_subscribed());
        assert!(!sensor.emit_next());
        assert!(!engine.gravity_feed().is_connected());
    }

    #[test]
    fn test_device_flip_snaps_gravity() {
        fn ticks_to_reverse(config: BurstConfig) -> u32 {
            let mut engine = ConfettiEngine::new(config);
            engine.start(ORIGIN, BOUNDS, 15, Some(11));
            engine.on_sensor_sample(0.0, -9.81);
            engine.tick(0.0);
            engine.on_sensor_sample(0.0, 9.81);
            let mut ticks = 0;
            while engine.stats().expect("active").gravity.smoothed.y >= 0.0 {
                ticks += 1;
                engine.tick(ticks as f64 * 1000.0 / 60.0);
                assert!(ticks < 100);
            }
            ticks
        }

        let config = BurstConfig::default();
        let plain = BurstConfig {
            snap_smoothing: config.smoothing,
            ..config.clone()
        };
        assert!(ticks_to_reverse(config) < ticks_to_reverse(plain));
    }

    #[test]
    fn test_renderer_reads_from_another_thread() {
        let mut engine = ConfettiEngine::default();
        engine.start(ORIGIN, BOUNDS, 15, Some(4));
        let reader = engine.frame_reader();
        let renderer = std::thread::spawn(move || {
            (0..500)
                .map(|_| reader.latest())
                .all(|frame| frame.len() == 15 && frame.as_flat().iter().all(|v| v.is_finite()))
        });
        run_frames(&mut engine, 120);
        assert!(renderer.join().expect("renderer thread"));
    }
}
