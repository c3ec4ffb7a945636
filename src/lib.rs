pub mod audio; // Audio context boundary and the realtime graph renderer
pub mod config;
pub mod dsp;
pub mod engine; // Note lifecycle: key -> voice table
pub mod error;
pub mod input; // Raw key events -> semantic commands
pub mod scale;
pub mod session; // Wiring and exactly-once teardown
pub mod vis; // Frame-driven particle visualization

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f64 = 1.0 / 48_000.0;
