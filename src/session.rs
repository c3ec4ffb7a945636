//! One playing session: key events in, voices and particles out.
//!
//! The session owns every piece of mutable state for its whole lifetime
//! (scale cursor, held keys, voice table, particle loop), so event handlers
//! always see the current values. Host resources are acquired and released
//! exactly once:
//!
//! - key events: `EventSource::subscribe` in [`Session::start`],
//!   `unsubscribe` in [`Session::teardown`]
//! - frame callbacks: requested on the first note, cancelled on silence or teardown
//! - audio context: closed on teardown
//!
//! `teardown` is idempotent and also runs on drop.
//!
//! The shared frequency always names a note that is still held: releasing one
//! key of a chord hands it to the most recently pressed key still down.

use crate::{
    audio::AudioContext,
    config::Config,
    engine::{NoteEngine, VoiceEvent},
    error::{ConfigError, SessionError},
    input::{ActiveKeySet, Command, InputRouter, KeyEvent, KeyId},
    scale::ScaleRegistry,
    vis::{ActiveFrequency, FrameHandle, Surface, VisualizationLoop},
};

/// Host-side key event subscription.
pub trait EventSource {
    fn subscribe(&mut self) -> std::io::Result<()>;

    fn unsubscribe(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Subscribed,
    TornDown,
}

pub struct Session<A: AudioContext, S: Surface, E: EventSource> {
    scales: ScaleRegistry,
    router: InputRouter,
    engine: NoteEngine<A>,
    vis: VisualizationLoop,
    frequency: ActiveFrequency,
    /// Held degree keys and their pitch, oldest press first
    held: Vec<(KeyId, f32)>,
    surface: S,
    events: E,
    lifecycle: Lifecycle,
}

impl<A: AudioContext, S: Surface, E: EventSource> Session<A, S, E> {
    /// Build a session. `context` may be `None` when audio is unavailable or
    /// deferred; the session then runs visual-only until one is attached.
    pub fn new(
        config: &Config,
        context: Option<A>,
        surface: S,
        events: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scales = config.scale_registry()?;
        let frequency = ActiveFrequency::new();
        let seed = config.seed.unwrap_or_else(rand::random);

        let engine = NoteEngine::new(context)
            .with_waveform(config.waveform)
            .with_release(config.release_shape());

        Ok(Self {
            scales,
            router: InputRouter::new(config.require_keypad),
            engine,
            vis: VisualizationLoop::new(config.vis_config(), frequency.clone(), seed),
            frequency,
            held: Vec::new(),
            surface,
            events,
            lifecycle: Lifecycle::Created,
        })
    }

    /// Subscribe to key events. Calling it again while running is a no-op.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Subscribed => Ok(()),
            Lifecycle::TornDown => Err(SessionError::TornDown),
            Lifecycle::Created => {
                self.events.subscribe().map_err(SessionError::Subscribe)?;
                self.lifecycle = Lifecycle::Subscribed;
                log::info!(
                    "session started on scale '{}' ({} scales, audio {})",
                    self.scales.current().name(),
                    self.scales.len(),
                    if self.engine.has_context() { "on" } else { "off" }
                );
                Ok(())
            }
        }
    }

    /// Feed one key event through the router and apply the resulting command.
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<VoiceEvent> {
        if self.lifecycle != Lifecycle::Subscribed {
            return None;
        }

        match self.router.route(&event, &self.scales)? {
            Command::ScaleNext => {
                self.scales.advance();
                self.log_scale();
                None
            }
            Command::ScalePrev => {
                self.scales.retreat();
                self.log_scale();
                None
            }
            Command::NoteOn { key, frequency } => {
                let started = self.engine.start_voice(key, frequency);
                self.held.push((key, frequency));
                self.frequency.set(frequency);
                self.vis.on_note_on(frequency, &mut self.surface);
                started
            }
            Command::NoteOff { key } => {
                let released = self.engine.stop_voice(key);
                self.held.retain(|&(held, _)| held != key);
                match self.held.last() {
                    Some(&(_, frequency)) => self.frequency.set(frequency),
                    None => {
                        self.frequency.clear();
                        self.vis.on_silence(&mut self.surface);
                    }
                }
                released
            }
        }
    }

    /// The host's refresh driver fired the callback for `handle`.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        self.vis.on_frame(handle, &mut self.surface)
    }

    /// Let go of every held key at once.
    pub fn release_all(&mut self) -> Vec<VoiceEvent> {
        let keys = self.router.release_all();
        let events = self.engine.stop_all();
        self.held.clear();
        self.frequency.clear();
        self.vis.on_silence(&mut self.surface);
        if !keys.is_empty() {
            log::info!("released {} held keys", keys.len());
        }
        events
    }

    /// Jump straight to scale `index` (clamped). Held voices keep their pitch.
    pub fn select_scale(&mut self, index: usize) -> usize {
        let selected = self.scales.select(index);
        self.log_scale();
        selected
    }

    /// Supply an audio context that was not available at construction.
    pub fn attach_context(&mut self, context: A) -> bool {
        if self.lifecycle == Lifecycle::TornDown {
            return false;
        }
        self.engine.attach_context(context)
    }

    /// Unsubscribe, stop the frame chain and close audio. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        if self.lifecycle == Lifecycle::Subscribed {
            self.events.unsubscribe();
        }
        self.router.release_all();
        self.held.clear();
        self.vis.teardown(&mut self.surface);
        self.frequency.clear();
        self.engine.close();
        self.lifecycle = Lifecycle::TornDown;
        log::info!("session torn down");
    }

    fn log_scale(&self) {
        log::info!(
            "scale -> '{}' ({}/{})",
            self.scales.current().name(),
            self.scales.index() + 1,
            self.scales.len()
        );
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn scales(&self) -> &ScaleRegistry {
        &self.scales
    }

    pub fn active_keys(&self) -> &ActiveKeySet {
        self.router.active_keys()
    }

    pub fn engine(&self) -> &NoteEngine<A> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut NoteEngine<A> {
        &mut self.engine
    }

    pub fn visualization(&self) -> &VisualizationLoop {
        &self.vis
    }

    pub fn frequency(&self) -> &ActiveFrequency {
        &self.frequency
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn events(&self) -> &E {
        &self.events
    }
}

impl<A: AudioContext, S: Surface, E: EventSource> Drop for Session<A, S, E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
