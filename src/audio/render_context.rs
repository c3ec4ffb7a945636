use std::collections::{HashSet, VecDeque};

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    audio::{
        clock::RenderClock,
        context::{AudioContext, NodeId, Param, Target},
        message::{MessageSink, RenderMessage},
        renderer::GraphRenderer,
    },
    dsp::Waveform,
    error::AudioError,
    MAX_BLOCK_SIZE,
};

/// [`AudioContext`] that schedules onto a [`GraphRenderer`] through a message sink.
///
/// Node ids are allocated here on the control thread, so creating a node
/// never waits for the renderer to acknowledge it.
pub struct RenderContext<S: MessageSink> {
    sink: S,
    clock: RenderClock,
    next_id: u32,
    issued: HashSet<NodeId>,
    closed: bool,
}

/// Context feeding the audio device thread over a lock-free ring.
#[cfg(feature = "rtrb")]
pub type RealtimeContext = RenderContext<Producer<RenderMessage>>;

/// Context that owns its renderer and renders on demand.
pub type OfflineContext = RenderContext<GraphRenderer<VecDeque<RenderMessage>>>;

/// Build a realtime context and the renderer to move into the audio callback.
///
/// `capacity` bounds the number of messages in flight; scheduling past it
/// fails with [`AudioError::QueueFull`].
#[cfg(feature = "rtrb")]
pub fn realtime(
    sample_rate: f32,
    capacity: usize,
) -> (RealtimeContext, GraphRenderer<Consumer<RenderMessage>>) {
    let clock = RenderClock::new(sample_rate);
    let (tx, rx) = RingBuffer::<RenderMessage>::new(capacity);
    let renderer = GraphRenderer::new(rx, clock.clone());
    (RenderContext::new(tx, clock), renderer)
}

impl<S: MessageSink> RenderContext<S> {
    pub fn new(sink: S, clock: RenderClock) -> Self {
        Self {
            sink,
            clock,
            next_id: 1,
            issued: HashSet::new(),
            closed: false,
        }
    }

    pub fn clock(&self) -> &RenderClock {
        &self.clock
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn send(&mut self, msg: RenderMessage) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }
        self.sink.push(msg)
    }

    fn check(&self, node: NodeId) -> Result<(), AudioError> {
        if self.closed {
            Err(AudioError::Closed)
        } else if self.issued.contains(&node) {
            Ok(())
        } else {
            Err(AudioError::UnknownNode(node))
        }
    }

    fn allocate(&mut self, create: impl FnOnce(NodeId) -> RenderMessage) -> Result<NodeId, AudioError> {
        let id = NodeId(self.next_id);
        self.send(create(id))?;
        self.next_id = self.next_id.wrapping_add(1);
        self.issued.insert(id);
        Ok(id)
    }
}

impl<S: MessageSink> AudioContext for RenderContext<S> {
    fn current_time(&self) -> f64 {
        self.clock.seconds()
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, AudioError> {
        self.allocate(|id| RenderMessage::CreateOscillator { id, waveform })
    }

    fn create_gain(&mut self) -> Result<NodeId, AudioError> {
        self.allocate(|id| RenderMessage::CreateGain { id })
    }

    fn connect(&mut self, source: NodeId, target: Target) -> Result<(), AudioError> {
        self.check(source)?;
        if let Target::Node(node) = target {
            self.check(node)?;
        }
        self.send(RenderMessage::Connect { source, target })
    }

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: Param,
        value: f32,
        time: f64,
    ) -> Result<(), AudioError> {
        self.check(node)?;
        if !value.is_finite() {
            return Err(AudioError::InvalidValue {
                param: param_name(param),
                value,
            });
        }
        self.send(RenderMessage::SetValueAtTime {
            node,
            param,
            value,
            time,
        })
    }

    fn exponential_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: Param,
        value: f32,
        time: f64,
    ) -> Result<(), AudioError> {
        self.check(node)?;
        if !value.is_finite() || value == 0.0 {
            return Err(AudioError::InvalidValue {
                param: param_name(param),
                value,
            });
        }
        self.send(RenderMessage::ExponentialRamp {
            node,
            param,
            value,
            time,
        })
    }

    fn start(&mut self, node: NodeId, time: f64) -> Result<(), AudioError> {
        self.check(node)?;
        self.send(RenderMessage::Start { node, time })
    }

    fn stop(&mut self, node: NodeId, time: f64) -> Result<(), AudioError> {
        self.check(node)?;
        self.send(RenderMessage::Stop { node, time })
    }

    fn release(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.check(node)?;
        self.send(RenderMessage::Release { node })?;
        self.issued.remove(&node);
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.sink.push(RenderMessage::Shutdown) {
            log::warn!("audio context closed without reaching the renderer: {e}");
        }
        self.issued.clear();
        self.closed = true;
    }
}

fn param_name(param: Param) -> &'static str {
    match param {
        Param::Frequency => "frequency",
        Param::Gain => "gain",
    }
}

impl OfflineContext {
    pub fn offline(sample_rate: f32) -> Self {
        let renderer = GraphRenderer::offline(sample_rate);
        let clock = renderer.clock().clone();
        Self::new(renderer, clock)
    }

    /// Offline context whose output is not attenuated by the master gain.
    pub fn offline_unity(sample_rate: f32) -> Self {
        let renderer = GraphRenderer::offline(sample_rate).with_master_gain(1.0);
        let clock = renderer.clock().clone();
        Self::new(renderer, clock)
    }

    /// Render `frames` samples of mono output, advancing the clock.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.sink.render_block(chunk);
        }
        out
    }

    pub fn renderer(&self) -> &GraphRenderer<VecDeque<RenderMessage>> {
        &self.sink
    }
}
