use crate::{dsp::Waveform, error::AudioError};

/// Opaque handle to a node in the render graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Automatable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Oscillator frequency in Hz.
    Frequency,
    /// Gain node multiplier (1.0 = full scale).
    Gain,
}

/// Where a node's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    /// The device output.
    Destination,
}

/// An audio-rendering context: node creation plus scheduling at device time.
///
/// Every method must return promptly; implementations queue work for the
/// render thread instead of waiting on it. Times are in seconds on the
/// context's own clock (see [`AudioContext::current_time`]).
pub trait AudioContext {
    /// Current render-clock time in seconds.
    fn current_time(&self) -> f64;

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, AudioError>;

    fn create_gain(&mut self) -> Result<NodeId, AudioError>;

    fn connect(&mut self, source: NodeId, target: Target) -> Result<(), AudioError>;

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: Param,
        value: f32,
        time: f64,
    ) -> Result<(), AudioError>;

    fn exponential_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: Param,
        value: f32,
        time: f64,
    ) -> Result<(), AudioError>;

    /// Begin rendering an oscillator at `time`.
    fn start(&mut self, node: NodeId, time: f64) -> Result<(), AudioError>;

    /// Stop rendering an oscillator at `time`.
    fn stop(&mut self, node: NodeId, time: f64) -> Result<(), AudioError>;

    /// Drop the handle. The node is disconnected and freed once it falls silent.
    fn release(&mut self, node: NodeId) -> Result<(), AudioError>;

    /// Release the context itself. Later calls fail with [`AudioError::Closed`].
    fn close(&mut self);
}
