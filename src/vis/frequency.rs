use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

// f32 bits; 0 means nothing is sounding.
const SILENT: u32 = 0;

/// The "currently relevant" pitch, written by the session and read each frame.
///
/// Cloning shares the value. Only one party is expected to write.
#[derive(Debug, Clone, Default)]
pub struct ActiveFrequency {
    bits: Arc<AtomicU32>,
}

impl ActiveFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, hz: f32) {
        let bits = if hz.is_finite() && hz > 0.0 {
            hz.to_bits()
        } else {
            SILENT
        };
        self.bits.store(bits, Ordering::Release);
    }

    pub fn clear(&self) {
        self.bits.store(SILENT, Ordering::Release);
    }

    pub fn get(&self) -> Option<f32> {
        match self.bits.load(Ordering::Acquire) {
            SILENT => None,
            bits => Some(f32::from_bits(bits)),
        }
    }
}
