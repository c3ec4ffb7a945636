use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Frames rendered so far, published by the render thread.
///
/// Single writer (the renderer), any number of readers. Reading gives the
/// device time at the start of the next block to be rendered, which is the
/// earliest time a newly scheduled event can still land on.
#[derive(Debug, Clone)]
pub struct RenderClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl RenderClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub(crate) fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Release);
    }
}
