use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::{
    audio::context::{NodeId, Param, Target},
    dsp::Waveform,
    error::AudioError,
};

/// Work scheduled by the control thread for the render thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderMessage {
    CreateOscillator { id: NodeId, waveform: Waveform },
    CreateGain { id: NodeId },
    Connect { source: NodeId, target: Target },
    SetValueAtTime { node: NodeId, param: Param, value: f32, time: f64 },
    ExponentialRamp { node: NodeId, param: Param, value: f32, time: f64 },
    Start { node: NodeId, time: f64 },
    Stop { node: NodeId, time: f64 },
    Release { node: NodeId },
    Shutdown,
}

/// Render-thread end of the message queue.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<RenderMessage>;
}

/// Control-thread end of the message queue. Must never block.
pub trait MessageSink {
    fn push(&mut self, msg: RenderMessage) -> Result<(), AudioError>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<RenderMessage> {
    fn pop(&mut self) -> Option<RenderMessage> {
        Consumer::pop(self).ok()
    }
}

#[cfg(feature = "rtrb")]
impl MessageSink for Producer<RenderMessage> {
    fn push(&mut self, msg: RenderMessage) -> Result<(), AudioError> {
        Producer::push(self, msg).map_err(|_| AudioError::QueueFull)
    }
}

impl MessageReceiver for VecDeque<RenderMessage> {
    fn pop(&mut self) -> Option<RenderMessage> {
        self.pop_front()
    }
}

impl MessageSink for VecDeque<RenderMessage> {
    fn push(&mut self, msg: RenderMessage) -> Result<(), AudioError> {
        self.push_back(msg);
        Ok(())
    }
}
