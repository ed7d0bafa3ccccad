//! Tilt sensor port
//!
//! The host's motion sensor is modeled as a [`SensorSource`] that pushes
//! device acceleration samples into a [`GravityFeed`] while subscribed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sim::GravityFeed;

/// Anything that can deliver acceleration-including-gravity samples
pub trait SensorSource: Send {
    /// Begin delivering samples into `feed`
    fn subscribe(&mut self, feed: GravityFeed);
    /// Stop delivering samples
    fn unsubscribe(&mut self);
}

#[derive(Debug, Default)]
struct Script {
    samples: VecDeque<(f64, f64)>,
    feed: Option<GravityFeed>,
}

/// Replays a fixed list of `(ax, ay)` samples on demand
///
/// Clones share the same script, so a test can keep one handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSensor {
    pub fn new(samples: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                samples: samples.into_iter().collect(),
                feed: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue more samples
    pub fn extend(&self, samples: impl IntoIterator<Item = (f64, f64)>) {
        self.lock().samples.extend(samples);
    }

    /// Deliver the next sample. Returns false when the script is exhausted
    /// or nobody is subscribed.
    pub fn emit_next(&self) -> bool {
        let mut script = self.lock();
        let Some(feed) = script.feed.clone() else {
            return false;
        };
        match script.samples.pop_front() {
            Some((ax, ay)) => feed.push_sample(ax, ay),
            None => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock().feed.is_some()
    }
}

impl SensorSource for ScriptedSensor {
    fn subscribe(&mut self, feed: GravityFeed) {
        self.lock().feed = Some(feed);
    }

    fn unsubscribe(&mut self) {
        self.lock().feed = None;
    }
}
