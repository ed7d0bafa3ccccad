//! Confetti Burst entry point
//!
//! Native builds run a headless burst with a scripted tilt sequence and print
//! the resting frame as JSON. The browser build is driven through
//! `confetti_burst::wasm` instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use confetti_burst::consts::{SIM_DT, STANDARD_GRAVITY};
    use confetti_burst::{Bounds, BurstConfig, ConfettiEngine, ScriptedSensor};
    use glam::DVec2;
    use serde::Serialize;

    /// Frames simulated (8 seconds at 60 Hz)
    const FRAMES: u32 = 480;

    #[derive(Serialize)]
    struct Report<'a> {
        stats: confetti_burst::BurstStats,
        styles: &'a [confetti_burst::SpriteStyle],
        frame: &'a confetti_burst::FrameSnapshot,
    }

    /// Upright for two seconds, tilted right, turned over, then upright again
    fn tilt_script() -> Vec<(f64, f64)> {
        let upright = (0.0, -STANDARD_GRAVITY);
        let tilted = (4.0, -STANDARD_GRAVITY * 0.9);
        let flipped = (0.0, STANDARD_GRAVITY);
        let mut samples = Vec::with_capacity(FRAMES as usize);
        for frame in 0..FRAMES {
            samples.push(match frame {
                0..120 => upright,
                120..200 => tilted,
                200..260 => flipped,
                _ => upright,
            });
        }
        samples
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let config = match std::env::args().nth(1) {
            Some(path) => {
                log::info!("Loading config from {path}");
                BurstConfig::load(path)?
            }
            None => BurstConfig::default(),
        };

        let sensor = ScriptedSensor::new(tilt_script());
        let mut engine = ConfettiEngine::new(config).with_sensor(sensor.clone());
        let bounds = Bounds::new(375.0, 800.0);
        let seed = engine.start_default(DVec2::new(bounds.width / 2.0, 100.0), bounds);

        let frame_ms = SIM_DT * 1000.0;
        for frame in 0..FRAMES {
            sensor.emit_next();
            engine.tick(frame as f64 * frame_ms);
        }

        let stats = engine.stats().ok_or("burst stopped unexpectedly")?;
        let styles = engine.styles().ok_or("burst stopped unexpectedly")?;
        let frame = engine.snapshot();
        log::info!(
            "Seed {seed}: {} steps over {} frames, resting: {}",
            stats.total_steps,
            stats.frame,
            stats.resting
        );

        let report = Report {
            stats,
            styles: &styles,
            frame: &frame,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);

        engine.stop();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Confetti Burst (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is confetti_burst::wasm, this is just to satisfy the compiler
}
