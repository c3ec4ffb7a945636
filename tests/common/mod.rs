#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use tenkey::{
    audio::{AudioContext, NodeId, Param, Target},
    config::Config,
    dsp::Waveform,
    error::AudioError,
    session::{EventSource, Session},
    vis::{FrameHandle, Particle, Surface},
};

/// Every call an engine made on its context, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateOscillator(NodeId),
    CreateGain(NodeId),
    Connect(NodeId, Target),
    SetValue(NodeId, Param, f32, f64),
    Ramp(NodeId, Param, f32, f64),
    Start(NodeId, f64),
    Stop(NodeId, f64),
    Release(NodeId),
    Close,
}

#[derive(Debug, Default)]
pub struct Recording {
    pub calls: Vec<Call>,
    pub now: f64,
}

impl Recording {
    pub fn oscillators_created(&self) -> Vec<NodeId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateOscillator(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> Vec<(NodeId, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Start(id, t) => Some((*id, *t)),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<(NodeId, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Stop(id, t) => Some((*id, *t)),
                _ => None,
            })
            .collect()
    }

    pub fn frequency_of(&self, oscillator: NodeId) -> Option<f32> {
        self.calls.iter().find_map(|c| match c {
            Call::SetValue(id, Param::Frequency, hz, _) if *id == oscillator => Some(*hz),
            _ => None,
        })
    }

    pub fn closes(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Close).count()
    }
}

/// Context that only records what it is asked to do, on a hand-driven clock.
pub struct RecordingContext {
    shared: Rc<RefCell<Recording>>,
    next: u32,
}

impl RecordingContext {
    pub fn new() -> (Self, Rc<RefCell<Recording>>) {
        let shared = Rc::new(RefCell::new(Recording::default()));
        (
            Self {
                shared: shared.clone(),
                next: 1,
            },
            shared,
        )
    }

    fn record(&mut self, call: Call) -> Result<(), AudioError> {
        self.shared.borrow_mut().calls.push(call);
        Ok(())
    }
}

impl AudioContext for RecordingContext {
    fn current_time(&self) -> f64 {
        self.shared.borrow().now
    }

    fn create_oscillator(&mut self, _waveform: Waveform) -> Result<NodeId, AudioError> {
        let id = NodeId(self.next);
        self.next += 1;
        self.record(Call::CreateOscillator(id))?;
        Ok(id)
    }

    fn create_gain(&mut self) -> Result<NodeId, AudioError> {
        let id = NodeId(self.next);
        self.next += 1;
        self.record(Call::CreateGain(id))?;
        Ok(id)
    }

    fn connect(&mut self, source: NodeId, target: Target) -> Result<(), AudioError> {
        self.record(Call::Connect(source, target))
    }

    fn set_value_at_time(&mut self, node: NodeId, param: Param, value: f32, time: f64) -> Result<(), AudioError> {
        self.record(Call::SetValue(node, param, value, time))
    }

    fn exponential_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: Param,
        value: f32,
        time: f64,
    ) -> Result<(), AudioError> {
        self.record(Call::Ramp(node, param, value, time))
    }

    fn start(&mut self, node: NodeId, time: f64) -> Result<(), AudioError> {
        self.record(Call::Start(node, time))
    }

    fn stop(&mut self, node: NodeId, time: f64) -> Result<(), AudioError> {
        self.record(Call::Stop(node, time))
    }

    fn release(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.record(Call::Release(node))
    }

    fn close(&mut self) {
        let _ = self.record(Call::Close);
    }
}

#[derive(Debug, Default)]
pub struct HostLog {
    pub subscribes: usize,
    pub unsubscribes: usize,
    pub requests: usize,
    pub cancels: usize,
    pub clears: usize,
    pub drawn: usize,
    pub pending: Option<FrameHandle>,
}

pub struct TestSurface {
    log: Rc<RefCell<HostLog>>,
    next: u64,
}

impl Surface for TestSurface {
    fn size(&self) -> (f64, f64) {
        (160.0, 90.0)
    }

    fn clear(&mut self) {
        let mut log = self.log.borrow_mut();
        log.clears += 1;
        log.drawn = 0;
    }

    fn draw_particle(&mut self, _particle: &Particle) {
        self.log.borrow_mut().drawn += 1;
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        let mut log = self.log.borrow_mut();
        log.requests += 1;
        log.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut log = self.log.borrow_mut();
        assert_eq!(log.pending, Some(handle), "cancelled a frame that was not pending");
        log.pending = None;
        log.cancels += 1;
    }
}

pub struct TestEvents {
    log: Rc<RefCell<HostLog>>,
}

impl EventSource for TestEvents {
    fn subscribe(&mut self) -> std::io::Result<()> {
        self.log.borrow_mut().subscribes += 1;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.log.borrow_mut().unsubscribes += 1;
    }
}

pub type TestSession<A> = Session<A, TestSurface, TestEvents>;

pub fn host() -> (TestSurface, TestEvents, Rc<RefCell<HostLog>>) {
    let log = Rc::new(RefCell::new(HostLog::default()));
    (
        TestSurface {
            log: log.clone(),
            next: 0,
        },
        TestEvents { log: log.clone() },
        log,
    )
}

pub fn config() -> Config {
    Config {
        seed: Some(42),
        ..Config::default()
    }
}

/// A started session over a recording context.
pub fn recording_session() -> (
    TestSession<RecordingContext>,
    Rc<RefCell<Recording>>,
    Rc<RefCell<HostLog>>,
) {
    let (context, recording) = RecordingContext::new();
    let (surface, events, host) = host();
    let mut session = Session::new(&config(), Some(context), surface, events).unwrap();
    session.start().unwrap();
    (session, recording, host)
}
