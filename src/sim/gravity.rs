//! Tilt-driven gravity
//!
//! Raw samples arrive from the sensor context through a [`GravityFeed`];
//! the simulation pulls the latest raw vector once per tick and smooths it
//! with a [`SensorSmoother`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::BurstConfig;

/// Raw and smoothed screen-space gravity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityState {
    pub raw: DVec2,
    pub smoothed: DVec2,
}

impl GravityState {
    /// Device upright and at rest
    pub fn straight_down(magnitude: f64) -> Self {
        let down = DVec2::new(0.0, magnitude);
        Self {
            raw: down,
            smoothed: down,
        }
    }
}

#[derive(Debug)]
struct FeedSlot {
    raw: DVec2,
    connected: bool,
}

/// Shared raw-gravity slot written by the sensor, read by the integrator
///
/// Cloning yields another handle to the same slot. The whole vector is
/// written and read under one lock.
#[derive(Debug, Clone)]
pub struct GravityFeed {
    slot: Arc<Mutex<FeedSlot>>,
    scale: f64,
    rest: DVec2,
}

impl GravityFeed {
    pub fn new(config: &BurstConfig) -> Self {
        let rest = DVec2::new(0.0, config.default_gravity());
        Self {
            slot: Arc::new(Mutex::new(FeedSlot {
                raw: rest,
                connected: false,
            })),
            scale: config.gravity_scale,
            rest,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed one device sample (m/s², device axes)
    ///
    /// Returns false when the sample was dropped (feed disconnected or
    /// non-finite input).
    pub fn push_sample(&self, ax: f64, ay: f64) -> bool {
        if !(ax.is_finite() && ay.is_finite()) {
            log::warn!("Dropping non-finite sensor sample ({ax}, {ay})");
            return false;
        }
        let raw = crate::device_to_screen(ax, ay, self.scale);
        let mut slot = self.lock();
        if !slot.connected {
            return false;
        }
        slot.raw = raw;
        true
    }

    /// Latest raw screen-space gravity
    pub fn raw(&self) -> DVec2 {
        self.lock().raw
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Reset to straight down and start accepting samples
    pub fn connect(&self) {
        let mut slot = self.lock();
        slot.raw = self.rest;
        slot.connected = true;
    }

    /// Stop accepting samples and forget the last one
    pub fn disconnect(&self) {
        let mut slot = self.lock();
        slot.raw = self.rest;
        slot.connected = false;
    }
}

/// Exponential smoothing with a faster snap when "down" reverses
#[derive(Debug, Clone)]
pub struct SensorSmoother {
    state: GravityState,
    smoothing: f64,
    snap_smoothing: f64,
    flip_threshold: f64,
}

impl SensorSmoother {
    pub fn new(config: &BurstConfig) -> Self {
        Self {
            state: GravityState::straight_down(config.default_gravity()),
            smoothing: config.smoothing,
            snap_smoothing: config.snap_smoothing,
            flip_threshold: config.flip_threshold,
        }
    }

    pub fn state(&self) -> GravityState {
        self.state
    }

    pub fn smoothed(&self) -> DVec2 {
        self.state.smoothed
    }

    /// True when either axis of `raw` opposes the smoothed sign with enough
    /// magnitude to mean the device was turned over
    pub fn is_flip(&self, raw: DVec2) -> bool {
        let smoothed = self.state.smoothed;
        let flipped = |r: f64, s: f64| r * s < 0.0 && r.abs() > self.flip_threshold;
        flipped(raw.x, smoothed.x) || flipped(raw.y, smoothed.y)
    }

    /// Move the smoothed vector toward `raw`
    pub fn ingest(&mut self, raw: DVec2) -> DVec2 {
        let alpha = if self.is_flip(raw) {
            log::debug!("Gravity flip detected, snapping toward {raw}");
            self.snap_smoothing
        } else {
            self.smoothing
        };
        self.state.raw = raw;
        self.state.smoothed += (raw - self.state.smoothed) * alpha;
        self.state.smoothed
    }
}
