use std::collections::BTreeSet;

use crate::{
    input::event::{KeyEvent, KeyId, KeyTransition},
    scale::ScaleRegistry,
};

/*
Key State Machine
=================

Each key is either Up or Down:

    ┌────┐   key-down   ┌──────┐
    │ Up │ ───────────→ │ Down │ ──┐
    └────┘              └──────┘   │ key-down (auto-repeat): ignored
       ↑     key-up        │  ↑────┘
       └───────────────────┘

Degree keys are '1'..='9'. A digit only goes Down if the current scale has
that many degrees; otherwise the press is ignored outright and the key stays
Up. '0' is never a degree key.

Key-up always emits a note-off, even for keys that never produced a note.
Stopping a key with no voice is a no-op downstream, and emitting it
unconditionally means a voice can never be orphaned by a scale change
between press and release.

'+' and '-' step the scale cursor once per press; their repeats are
swallowed the same way.
*/

/// What a key transition means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    NoteOn { key: KeyId, frequency: f32 },
    NoteOff { key: KeyId },
    ScaleNext,
    ScalePrev,
}

/// Degree keys currently held down.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActiveKeySet {
    keys: BTreeSet<KeyId>,
}

impl ActiveKeySet {
    pub fn contains(&self, key: KeyId) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Held keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.keys.iter().copied()
    }

    fn insert(&mut self, key: KeyId) -> bool {
        self.keys.insert(key)
    }

    fn remove(&mut self, key: KeyId) -> bool {
        self.keys.remove(&key)
    }
}

pub struct InputRouter {
    require_keypad: bool,
    active: ActiveKeySet,
    held_controls: BTreeSet<KeyId>,
}

impl InputRouter {
    /// `require_keypad` drops every event not flagged as coming from the keypad.
    pub fn new(require_keypad: bool) -> Self {
        Self {
            require_keypad,
            active: ActiveKeySet::default(),
            held_controls: BTreeSet::new(),
        }
    }

    pub fn active_keys(&self) -> &ActiveKeySet {
        &self.active
    }

    pub fn requires_keypad(&self) -> bool {
        self.require_keypad
    }

    /// Classify one key event against the current scale.
    pub fn route(&mut self, event: &KeyEvent, scales: &ScaleRegistry) -> Option<Command> {
        if self.require_keypad && !event.keypad {
            return None;
        }

        let key = event.key;
        match event.transition {
            KeyTransition::Down => match key {
                KeyId::NEXT_SCALE | KeyId::PREV_SCALE => {
                    if !self.held_controls.insert(key) {
                        return None;
                    }
                    if key == KeyId::NEXT_SCALE {
                        Some(Command::ScaleNext)
                    } else {
                        Some(Command::ScalePrev)
                    }
                }
                _ => {
                    if self.active.contains(key) {
                        return None;
                    }
                    let digit = key.digit().filter(|&d| d >= 1)?;
                    let frequency = scales.current().degree(digit)?;
                    self.active.insert(key);
                    Some(Command::NoteOn { key, frequency })
                }
            },
            KeyTransition::Up => {
                if !self.held_controls.remove(&key) {
                    self.active.remove(key);
                }
                Some(Command::NoteOff { key })
            }
        }
    }

    /// Forget every held key, returning the degree keys that were down.
    pub fn release_all(&mut self) -> Vec<KeyId> {
        self.held_controls.clear();
        let released: Vec<KeyId> = self.active.iter().collect();
        self.active.keys.clear();
        released
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(true)
    }
}
