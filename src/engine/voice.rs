use std::collections::HashMap;

use crate::{audio::NodeId, input::KeyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Attacking, // Nodes created, amplitude being set
    Sustaining, // Held at full scale until the key is released
    Releasing, // Fade scheduled, nodes handed back to the renderer
}

/// One sounding note bound to a key.
///
/// The frequency is fixed when the voice is created; changing scales while
/// a key is held never retunes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    key: KeyId,
    frequency: f32,
    oscillator: NodeId,
    gain: NodeId,
    phase: VoicePhase,
    started_at: f64,
}

impl Voice {
    pub(crate) fn new(key: KeyId, frequency: f32, oscillator: NodeId, gain: NodeId, started_at: f64) -> Self {
        Self {
            key,
            frequency,
            oscillator,
            gain,
            phase: VoicePhase::Attacking,
            started_at,
        }
    }

    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn oscillator(&self) -> NodeId {
        self.oscillator
    }

    pub fn gain(&self) -> NodeId {
        self.gain
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub(crate) fn sustain(&mut self) {
        if self.phase == VoicePhase::Attacking {
            self.phase = VoicePhase::Sustaining;
        }
    }

    pub(crate) fn release(&mut self) {
        self.phase = VoicePhase::Releasing;
    }
}

/// Live voices keyed by logical key. At most one voice per key.
#[derive(Debug, Default)]
pub struct VoiceTable {
    voices: HashMap<KeyId, Voice>,
}

impl VoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a voice unless its key already has one. Returns whether it was inserted.
    pub(crate) fn insert(&mut self, voice: Voice) -> bool {
        if self.voices.contains_key(&voice.key) {
            return false;
        }
        self.voices.insert(voice.key, voice);
        true
    }

    pub(crate) fn remove(&mut self, key: KeyId) -> Option<Voice> {
        self.voices.remove(&key)
    }

    pub fn get(&self, key: KeyId) -> Option<&Voice> {
        self.voices.get(&key)
    }

    pub fn contains(&self, key: KeyId) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_refuses_second_voice_for_key() {
        let key = KeyId::new('1');
        let mut table = VoiceTable::new();

        assert!(table.insert(Voice::new(key, 261.63, NodeId(1), NodeId(2), 0.0)));
        assert!(!table.insert(Voice::new(key, 293.66, NodeId(3), NodeId(4), 0.1)));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(key).map(Voice::frequency), Some(261.63));
    }

    #[test]
    fn phase_moves_forward_only() {
        let mut voice = Voice::new(KeyId::new('2'), 293.66, NodeId(1), NodeId(2), 0.0);
        voice.sustain();
        assert_eq!(voice.phase(), VoicePhase::Sustaining);

        voice.release();
        voice.sustain();
        assert_eq!(voice.phase(), VoicePhase::Releasing);
    }
}
