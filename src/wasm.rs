//! Browser binding
//!
//! The page owns the `requestAnimationFrame` loop and the `devicemotion`
//! listener; it forwards both here and draws from `snapshot()`.

use glam::DVec2;
use wasm_bindgen::prelude::*;

use crate::{Bounds, BurstConfig, ConfettiEngine};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    // Another binding may have installed a logger already
    let _ = console_log::init_with_level(log::Level::Info);
}

/// JS-facing confetti engine
#[wasm_bindgen]
pub struct WasmConfetti {
    engine: ConfettiEngine,
}

#[wasm_bindgen]
impl WasmConfetti {
    /// Build with default tuning, or from a JSON override
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmConfetti, JsError> {
        let config = match config_json {
            Some(json) => BurstConfig::from_json(&json)?,
            None => BurstConfig::default(),
        };
        Ok(Self {
            engine: ConfettiEngine::new(config),
        })
    }

    /// Launch a burst; returns the seed as a float for JS
    pub fn start(&mut self, x: f64, y: f64, width: f64, height: f64, count: Option<usize>) -> f64 {
        let count = count.unwrap_or(self.engine.config().particle_count);
        let seed = self.engine.start(DVec2::new(x, y), Bounds::new(width, height), count, None);
        seed as f64
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    /// `DeviceMotionEvent.accelerationIncludingGravity` x/y
    #[wasm_bindgen(js_name = onSensorSample)]
    pub fn on_sensor_sample(&self, ax: f64, ay: f64) {
        self.engine.on_sensor_sample(ax, ay);
    }

    /// `requestAnimationFrame` timestamp (ms)
    pub fn tick(&mut self, timestamp_ms: f64) {
        self.engine.tick(timestamp_ms);
    }

    /// Flat `[x, y, rotation, ...]` per particle
    pub fn snapshot(&self) -> Vec<f64> {
        self.engine.snapshot().as_flat().to_vec()
    }

    /// Shape names per particle index
    pub fn shapes(&self) -> Vec<String> {
        self.engine
            .styles()
            .map(|styles| styles.iter().map(|s| s.shape.as_str().to_string()).collect())
            .unwrap_or_default()
    }

    /// 0xRRGGBB per particle index
    pub fn colors(&self) -> Vec<u32> {
        self.engine
            .styles()
            .map(|styles| styles.iter().map(|s| s.color).collect())
            .unwrap_or_default()
    }
}
