//! Render-facing frame snapshots
//!
//! After each tick the engine publishes an immutable [`FrameSnapshot`]. The
//! publisher swaps an `Arc` under a short lock, so a reader on any thread
//! sees either the previous frame or the new one, never a mix.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::sim::{ParticleStore, ShapeKind};

/// Top-left sprite origin plus rotation for one particle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct SpriteTransform {
    pub x: f64,
    pub y: f64,
    /// Radians
    pub rotation: f64,
}

/// Per-index appearance, fixed when the burst starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteStyle {
    pub shape: ShapeKind,
    /// 0xRRGGBB
    pub color: u32,
}

/// Confetti palette, assigned round-robin
pub const PALETTE: [u32; 5] = [0xFF5A5F, 0xFFB400, 0x00A699, 0x7B61FF, 0x3DA5FF];

/// Appearance table for a freshly spawned store
pub fn assign_styles(store: &ParticleStore) -> Arc<[SpriteStyle]> {
    store
        .shapes()
        .iter()
        .enumerate()
        .map(|(i, &shape)| SpriteStyle {
            shape,
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}

/// One published frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Number of ticks since the burst started (0 before the first tick)
    pub frame: u64,
    transforms: Box<[SpriteTransform]>,
}

impl FrameSnapshot {
    /// Capture the store, offsetting centers by each sprite's half size
    pub fn capture(store: &ParticleStore, frame: u64) -> Self {
        let transforms = (0..store.len())
            .map(|i| {
                let half = store.shape(i).half_size();
                SpriteTransform {
                    x: store.pos[i].x - half,
                    y: store.pos[i].y - half,
                    rotation: store.rotation[i],
                }
            })
            .collect();
        Self { frame, transforms }
    }

    pub fn transforms(&self) -> &[SpriteTransform] {
        &self.transforms
    }

    /// `[x0, y0, rot0, x1, y1, rot1, ...]`
    pub fn as_flat(&self) -> &[f64] {
        bytemuck::cast_slice(&self.transforms[..])
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Holder of the latest snapshot
#[derive(Debug, Default)]
pub struct FramePublisher {
    current: Mutex<Arc<FrameSnapshot>>,
}

impl FramePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Arc<FrameSnapshot>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in a new frame
    pub fn publish(&self, snapshot: FrameSnapshot) {
        let next = Arc::new(snapshot);
        *self.lock() = next;
    }

    /// Publish an empty frame (burst stopped)
    pub fn clear(&self) {
        self.publish(FrameSnapshot::default());
    }

    pub fn latest(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.lock())
    }
}

/// Cloneable read handle for the renderer
#[derive(Debug, Clone)]
pub struct FrameReader {
    publisher: Arc<FramePublisher>,
}

impl FrameReader {
    pub(crate) fn new(publisher: Arc<FramePublisher>) -> Self {
        Self { publisher }
    }

    pub fn latest(&self) -> Arc<FrameSnapshot> {
        self.publisher.latest()
    }
}
