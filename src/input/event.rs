use std::fmt;

/// Logical key identifier: the character on the key, not a scan code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(char);

impl KeyId {
    pub const NEXT_SCALE: KeyId = KeyId('+');
    pub const PREV_SCALE: KeyId = KeyId('-');

    pub const fn new(c: char) -> Self {
        Self(c)
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// Numeric value for `'0'..='9'`.
    pub fn digit(self) -> Option<u32> {
        self.0.to_digit(10)
    }
}

impl From<char> for KeyId {
    fn from(c: char) -> Self {
        Self(c)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    /// Key pressed, or auto-repeat while held.
    Down,
    Up,
}

/// One key transition as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyId,
    pub transition: KeyTransition,
    /// Whether the event came from the numeric keypad.
    pub keypad: bool,
}

impl KeyEvent {
    pub fn down(key: impl Into<KeyId>) -> Self {
        Self {
            key: key.into(),
            transition: KeyTransition::Down,
            keypad: true,
        }
    }

    pub fn up(key: impl Into<KeyId>) -> Self {
        Self {
            key: key.into(),
            transition: KeyTransition::Up,
            keypad: true,
        }
    }

    /// Same transition, flagged as coming from outside the keypad.
    pub fn off_keypad(self) -> Self {
        Self {
            keypad: false,
            ..self
        }
    }
}
