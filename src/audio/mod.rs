//! The audio-rendering boundary.
//!
//! [`AudioContext`] is the seam the note engine talks to: create nodes,
//! connect them, schedule timestamped parameter changes. Nothing behind it
//! blocks. [`RenderContext`] implements it by turning every call into a
//! [`RenderMessage`] for a [`GraphRenderer`], which runs either on the audio
//! device thread ([`RealtimeContext`]) or inline for offline rendering
//! ([`OfflineContext`]).

/// Device-time clock shared between the render and control threads.
pub mod clock;
/// The `AudioContext` trait and node handle types.
pub mod context;
/// Control → render messages.
pub mod message;
/// `AudioContext` implementations backed by a `GraphRenderer`.
pub mod render_context;
/// Oscillator → gain → destination graph rendered per block.
pub mod renderer;

pub use clock::RenderClock;
pub use context::{AudioContext, NodeId, Param, Target};
pub use message::{MessageReceiver, MessageSink, RenderMessage};
pub use render_context::{OfflineContext, RenderContext};
#[cfg(feature = "rtrb")]
pub use render_context::{realtime, RealtimeContext};
pub use renderer::GraphRenderer;
