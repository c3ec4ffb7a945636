use std::collections::VecDeque;

use crate::{
    audio::{
        clock::RenderClock,
        context::{NodeId, Param, Target},
        message::{MessageReceiver, MessageSink, RenderMessage},
    },
    dsp::{AutomatedParam, Oscillator, Waveform},
    error::AudioError,
    MAX_BLOCK_SIZE,
};

/*
Render Graph
============

The graph is deliberately shallow. It only has to express what a voice needs:

    ┌────────────┐     ┌──────┐     ┌─────────────┐
    │ Oscillator │ ──→ │ Gain │ ──→ │ Destination │
    └────────────┘     └──────┘     └─────────────┘
     frequency param    gain param      × master gain

Each block:
  1. Drain control messages (create, connect, schedule, release).
  2. For every gain routed to the destination, sum the oscillators feeding
     it, multiply by the gain param sample by sample, add to the output.
  3. Advance the shared clock.
  4. Free released nodes that can no longer make sound.

Time inside a block is `(block_start_frame + i) / sample_rate`, so scheduled
events land on the exact sample regardless of block size.

Node storage is two Vecs with capacity reserved at construction. Creating a
node past capacity drops the request instead of allocating on the audio
thread; freeing uses `retain`, which never allocates.
*/

pub const MAX_OSCILLATORS: usize = 64;
pub const MAX_GAINS: usize = 64;
pub const DEFAULT_MASTER_GAIN: f32 = 0.25;

struct OscillatorSlot {
    id: NodeId,
    osc: Oscillator,
    frequency: AutomatedParam,
    start: Option<f64>,
    stop: Option<f64>,
    output: Option<Target>,
    released: bool,
}

impl OscillatorSlot {
    fn new(id: NodeId, waveform: Waveform) -> Self {
        Self {
            id,
            osc: Oscillator::new(waveform),
            frequency: AutomatedParam::new(440.0),
            start: None,
            stop: None,
            output: None,
            released: false,
        }
    }

    fn is_sounding(&self, t: f64) -> bool {
        self.start.is_some_and(|s| t >= s) && self.stop.map_or(true, |e| t < e)
    }

    /// Add this oscillator's output into `mix`.
    fn render_into(&mut self, mix: &mut [f32], start_frame: u64, sample_rate: f32) {
        for (i, out) in mix.iter_mut().enumerate() {
            let t = (start_frame + i as u64) as f64 / sample_rate as f64;
            let frequency = self.frequency.value_at(t);
            if self.is_sounding(t) {
                *out += self.osc.next_sample(frequency, sample_rate);
            }
        }
    }
}

struct GainSlot {
    id: NodeId,
    gain: AutomatedParam,
    output: Option<Target>,
    released: bool,
}

pub struct GraphRenderer<R: MessageReceiver> {
    rx: R,
    clock: RenderClock,
    oscillators: Vec<OscillatorSlot>,
    gains: Vec<GainSlot>,
    master_gain: f32,
    mix_buffer: Vec<f32>,
    scratch: Vec<f32>,
    shut_down: bool,
}

impl<R: MessageReceiver> GraphRenderer<R> {
    pub fn new(rx: R, clock: RenderClock) -> Self {
        Self {
            rx,
            clock,
            oscillators: Vec::with_capacity(MAX_OSCILLATORS),
            gains: Vec::with_capacity(MAX_GAINS),
            master_gain: DEFAULT_MASTER_GAIN,
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            shut_down: false,
        }
    }

    pub fn with_master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    pub fn clock(&self) -> &RenderClock {
        &self.clock
    }

    /// Oscillators still held by the graph (playing, tailing or pending).
    pub fn live_oscillators(&self) -> usize {
        self.oscillators.len()
    }

    pub fn live_gains(&self) -> usize {
        self.gains.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Render one block of mono output. `out.len()` must not exceed `MAX_BLOCK_SIZE`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);

        while let Some(msg) = self.rx.pop() {
            self.apply(msg);
        }

        out.fill(0.0);
        let len = out.len();
        let sample_rate = self.clock.sample_rate();
        let start_frame = self.clock.frames();
        let master_gain = self.master_gain;

        if !self.shut_down {
            // Destructure to allow simultaneous mutable borrows
            let Self {
                oscillators,
                gains,
                mix_buffer,
                scratch,
                ..
            } = &mut *self;

            for gain in gains.iter_mut() {
                if gain.output != Some(Target::Destination) {
                    continue;
                }
                let mix = &mut mix_buffer[..len];
                mix.fill(0.0);
                for osc in oscillators
                    .iter_mut()
                    .filter(|o| o.output == Some(Target::Node(gain.id)))
                {
                    osc.render_into(mix, start_frame, sample_rate);
                }
                for (i, (o, &s)) in out.iter_mut().zip(mix.iter()).enumerate() {
                    let t = (start_frame + i as u64) as f64 / sample_rate as f64;
                    *o += s * gain.gain.value_at(t);
                }
            }

            // Oscillators wired straight to the output bypass any gain stage
            let direct = &mut scratch[..len];
            direct.fill(0.0);
            for osc in oscillators
                .iter_mut()
                .filter(|o| o.output == Some(Target::Destination))
            {
                osc.render_into(direct, start_frame, sample_rate);
            }

            for (o, &d) in out.iter_mut().zip(direct.iter()) {
                *o = (*o + d) * master_gain;
            }
        }

        self.clock.advance(len);
        let block_end = (start_frame + len as u64) as f64 / sample_rate as f64;
        self.collect_released(block_end);
    }

    fn apply(&mut self, msg: RenderMessage) {
        if self.shut_down {
            return;
        }
        match msg {
            RenderMessage::CreateOscillator { id, waveform } => {
                if self.oscillators.len() < MAX_OSCILLATORS {
                    self.oscillators.push(OscillatorSlot::new(id, waveform));
                }
            }
            RenderMessage::CreateGain { id } => {
                if self.gains.len() < MAX_GAINS {
                    self.gains.push(GainSlot {
                        id,
                        gain: AutomatedParam::new(1.0),
                        output: None,
                        released: false,
                    });
                }
            }
            RenderMessage::Connect { source, target } => {
                if let Some(osc) = self.oscillator_mut(source) {
                    osc.output = Some(target);
                } else if let Some(gain) = self.gain_mut(source) {
                    gain.output = Some(target);
                }
            }
            RenderMessage::SetValueAtTime {
                node,
                param,
                value,
                time,
            } => {
                if let Some(p) = self.param_mut(node, param) {
                    p.set_value_at_time(value, time);
                }
            }
            RenderMessage::ExponentialRamp {
                node,
                param,
                value,
                time,
            } => {
                if let Some(p) = self.param_mut(node, param) {
                    p.exponential_ramp_to_value_at_time(value, time);
                }
            }
            RenderMessage::Start { node, time } => {
                if let Some(osc) = self.oscillator_mut(node) {
                    osc.start.get_or_insert(time);
                }
            }
            RenderMessage::Stop { node, time } => {
                if let Some(osc) = self.oscillator_mut(node) {
                    osc.stop = Some(time);
                }
            }
            RenderMessage::Release { node } => {
                if let Some(osc) = self.oscillator_mut(node) {
                    osc.released = true;
                } else if let Some(gain) = self.gain_mut(node) {
                    gain.released = true;
                }
            }
            RenderMessage::Shutdown => {
                self.oscillators.clear();
                self.gains.clear();
                self.shut_down = true;
            }
        }
    }

    fn oscillator_mut(&mut self, id: NodeId) -> Option<&mut OscillatorSlot> {
        self.oscillators.iter_mut().find(|o| o.id == id)
    }

    fn gain_mut(&mut self, id: NodeId) -> Option<&mut GainSlot> {
        self.gains.iter_mut().find(|g| g.id == id)
    }

    fn param_mut(&mut self, node: NodeId, param: Param) -> Option<&mut AutomatedParam> {
        match param {
            Param::Frequency => self.oscillator_mut(node).map(|o| &mut o.frequency),
            Param::Gain => self.gain_mut(node).map(|g| &mut g.gain),
        }
    }

    /// Drop released nodes that can no longer contribute sound.
    fn collect_released(&mut self, now: f64) {
        self.oscillators
            .retain(|o| !(o.released && o.stop.map_or(true, |stop| stop <= now)));

        let oscillators = &self.oscillators;
        self.gains.retain(|g| {
            !g.released
                || oscillators
                    .iter()
                    .any(|o| o.output == Some(Target::Node(g.id)))
        });
    }
}

impl GraphRenderer<VecDeque<RenderMessage>> {
    /// Renderer fed by an in-process queue, for offline rendering.
    pub fn offline(sample_rate: f32) -> Self {
        Self::new(VecDeque::with_capacity(64), RenderClock::new(sample_rate))
    }
}

/// Offline renderers accept messages directly; they are applied on the next block.
impl MessageSink for GraphRenderer<VecDeque<RenderMessage>> {
    fn push(&mut self, msg: RenderMessage) -> Result<(), AudioError> {
        self.rx.push_back(msg);
        Ok(())
    }
}
