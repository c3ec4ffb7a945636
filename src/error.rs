//! Error types shared across the crate.
//!
//! None of these ever reach the player: the engine and router handle them
//! locally and degrade to silence. They exist so the seams (audio context,
//! config loading, session lifecycle) can report what went wrong to logs.

use thiserror::Error;

use crate::audio::NodeId;

/// Errors raised by an [`AudioContext`](crate::audio::AudioContext).
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AudioError {
    /// The context was closed; no further scheduling is possible.
    #[error("audio context is closed")]
    Closed,

    /// The control → render queue is full. Scheduling never blocks.
    #[error("render queue is full")]
    QueueFull,

    /// A handle that this context never issued.
    #[error("unknown audio node {0:?}")]
    UnknownNode(NodeId),

    /// A parameter value the render graph cannot use.
    #[error("invalid value {value} for {param}")]
    InvalidValue {
        /// Parameter name.
        param: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Errors raised while building a scale table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScaleError {
    /// A registry needs at least one scale.
    #[error("scale table is empty")]
    EmptyRegistry,

    /// A scale needs at least one degree.
    #[error("scale '{name}' has no degrees")]
    EmptyScale {
        /// Scale name.
        name: String,
    },

    /// Degrees must be finite, positive frequencies.
    #[error("scale '{name}' degree {index} is not a positive frequency: {value}")]
    InvalidDegree {
        /// Scale name.
        name: String,
        /// Zero-based degree index.
        index: usize,
        /// Offending value.
        value: f32,
    },
}

/// Errors raised while loading a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML.
    #[cfg(feature = "serde")]
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Scale table failed validation.
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// A tunable outside its usable range.
    #[error("invalid setting '{name}': {message}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

/// Errors raised by a [`Session`](crate::session::Session) and its event source.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` after `teardown`.
    #[error("session has been torn down")]
    TornDown,

    /// The host refused the key-event subscription.
    #[error("failed to subscribe to key events: {0}")]
    Subscribe(#[source] std::io::Error),
}
