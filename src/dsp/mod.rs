//! Low-level DSP primitives used by the render graph.
//!
//! These components are allocation-free after construction and realtime-safe,
//! making them safe to embed directly inside render-graph node slots. They
//! stay focused on the signal math; node lifetime and routing live in
//! [`crate::audio::renderer`].

/// Timestamped parameter automation (set-value and exponential ramps).
pub mod automation;
/// Phase-accumulating oscillator waveforms.
pub mod oscillator;

pub use automation::AutomatedParam;
pub use oscillator::{Oscillator, Waveform};
