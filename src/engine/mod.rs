//! Note lifecycle: maps keys to live voices and schedules their sound.
//!
//! The engine runs on the control thread. Every table mutation happens
//! synchronously inside `start_voice`/`stop_voice`; the audio itself is only
//! *scheduled* on the [`AudioContext`] and plays out on the render thread.
//!
//! A stopped voice leaves the table immediately, but its 30 ms fade is still
//! rendering. Pressing the same key again inside that window starts a new,
//! independent voice whose onset overlaps the old tail. That overlap is the
//! intended sound of a fast re-press.

pub mod voice;

pub use voice::{Voice, VoicePhase, VoiceTable};

use crate::{
    audio::{AudioContext, NodeId, Param, Target},
    dsp::Waveform,
    error::AudioError,
    input::KeyId,
};

/// Gain applied to a voice as soon as it starts (no attack ramp).
pub const FULL_SCALE: f32 = 1.0;

/// Shape of the fade scheduled when a voice stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseShape {
    /// Seconds from note-off to oscillator stop.
    pub duration: f64,
    /// Level the exponential ramp reaches at the end, relative to full scale.
    pub floor: f32,
}

impl Default for ReleaseShape {
    fn default() -> Self {
        Self {
            duration: 0.030,
            floor: 0.001,
        }
    }
}

/// Observable outcome of a start/stop call that changed the voice table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceEvent {
    Started {
        key: KeyId,
        frequency: f32,
        at: f64,
    },
    Released {
        key: KeyId,
        frequency: f32,
        /// Device time at which the fade ends and the oscillator stops.
        tail_end: f64,
    },
}

pub struct NoteEngine<A: AudioContext> {
    context: Option<A>,
    voices: VoiceTable,
    waveform: Waveform,
    release: ReleaseShape,
}

impl<A: AudioContext> NoteEngine<A> {
    /// Create an engine. `None` means the audio context does not exist yet;
    /// every sound operation is skipped until one is attached.
    pub fn new(context: Option<A>) -> Self {
        Self {
            context,
            voices: VoiceTable::new(),
            waveform: Waveform::Sine,
            release: ReleaseShape::default(),
        }
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_release(mut self, release: ReleaseShape) -> Self {
        self.release = release;
        self
    }

    /// Supply a context that was deferred at construction.
    ///
    /// An engine keeps the first context it gets; a second one is closed and dropped.
    pub fn attach_context(&mut self, mut context: A) -> bool {
        if self.context.is_some() {
            log::warn!("audio context already attached; closing the new one");
            context.close();
            return false;
        }
        log::info!("audio context attached");
        self.context = Some(context);
        true
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&A> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut A> {
        self.context.as_mut()
    }

    pub fn voices(&self) -> &VoiceTable {
        &self.voices
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn release_shape(&self) -> ReleaseShape {
        self.release
    }

    /// Start a voice for `key` at `frequency`.
    ///
    /// No-op if the key already has a voice, if there is no audio context, or
    /// if `frequency` is not a finite positive value.
    pub fn start_voice(&mut self, key: KeyId, frequency: f32) -> Option<VoiceEvent> {
        if self.voices.contains(key) {
            log::trace!("key {key} already sounding");
            return None;
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            log::warn!("refusing to start key {key} at {frequency} Hz");
            return None;
        }
        let context = self.context.as_mut()?;

        match build_voice(context, self.waveform, key, frequency) {
            Ok(mut voice) => {
                voice.sustain();
                let at = voice.started_at();
                self.voices.insert(voice);
                log::debug!("voice on: key {key} at {frequency:.2} Hz (t={at:.3})");
                Some(VoiceEvent::Started { key, frequency, at })
            }
            Err(e) => {
                log::warn!("could not start key {key}: {e}");
                None
            }
        }
    }

    /// Fade out and forget the voice for `key`. No-op if it has none.
    ///
    /// The voice leaves the table before this returns; the fade finishes on
    /// the render thread `release.duration` seconds later.
    pub fn stop_voice(&mut self, key: KeyId) -> Option<VoiceEvent> {
        let mut voice = self.voices.remove(key)?;
        voice.release();
        let context = self.context.as_mut()?;

        let now = context.current_time();
        let tail_end = now + self.release.duration;
        if let Err(e) = schedule_release(context, &voice, now, tail_end, self.release.floor) {
            log::warn!("release of key {key} was not fully scheduled: {e}");
        }

        log::debug!("voice off: key {key} (tail ends t={tail_end:.3})");
        Some(VoiceEvent::Released {
            key,
            frequency: voice.frequency(),
            tail_end,
        })
    }

    /// Release every live voice.
    pub fn stop_all(&mut self) -> Vec<VoiceEvent> {
        let keys: Vec<KeyId> = self.voices.iter().map(Voice::key).collect();
        keys.into_iter()
            .filter_map(|key| self.stop_voice(key))
            .collect()
    }

    /// Release every voice, then close the audio context. Later calls do nothing.
    pub fn close(&mut self) -> Vec<VoiceEvent> {
        let released = self.stop_all();
        if let Some(mut context) = self.context.take() {
            context.close();
            log::info!("audio context closed ({} voices released)", released.len());
        }
        released
    }
}

fn build_voice<A: AudioContext>(
    context: &mut A,
    waveform: Waveform,
    key: KeyId,
    frequency: f32,
) -> Result<Voice, AudioError> {
    let now = context.current_time();
    let oscillator = context.create_oscillator(waveform)?;
    let gain = match context.create_gain() {
        Ok(gain) => gain,
        Err(e) => {
            let _ = context.release(oscillator);
            return Err(e);
        }
    };

    if let Err(e) = wire_voice(context, oscillator, gain, frequency, now) {
        let _ = context.release(oscillator);
        let _ = context.release(gain);
        return Err(e);
    }

    Ok(Voice::new(key, frequency, oscillator, gain, now))
}

fn wire_voice<A: AudioContext>(
    context: &mut A,
    oscillator: NodeId,
    gain: NodeId,
    frequency: f32,
    now: f64,
) -> Result<(), AudioError> {
    context.connect(oscillator, Target::Node(gain))?;
    context.connect(gain, Target::Destination)?;
    context.set_value_at_time(gain, Param::Gain, FULL_SCALE, now)?;
    context.set_value_at_time(oscillator, Param::Frequency, frequency, now)?;
    context.start(oscillator, now)
}

fn schedule_release<A: AudioContext>(
    context: &mut A,
    voice: &Voice,
    now: f64,
    tail_end: f64,
    floor: f32,
) -> Result<(), AudioError> {
    let faded = context
        .set_value_at_time(voice.gain(), Param::Gain, FULL_SCALE, now)
        .and_then(|_| {
            context.exponential_ramp_to_value_at_time(voice.gain(), Param::Gain, floor, tail_end)
        })
        .and_then(|_| context.stop(voice.oscillator(), tail_end));

    // Hand the handles back even if part of the fade failed to schedule.
    let released = context
        .release(voice.oscillator())
        .and(context.release(voice.gain()));

    faded.and(released)
}
