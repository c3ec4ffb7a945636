//! Frame-driven particle visualization.
//!
//! The loop never touches the note engine. It learns about notes from the
//! session (`on_note_on` / `on_silence`) and samples the shared
//! [`ActiveFrequency`] once per frame.

/// Single-writer frequency value shared with the frame loop and the host.
pub mod frequency;
/// The particle loop itself.
pub mod particles;
/// Rendering surface and frame-callback boundary.
pub mod surface;

pub use frequency::ActiveFrequency;
pub use particles::{LoopState, VisConfig, VisualizationLoop};
pub use surface::{FrameHandle, Particle, Surface};
