//! Key events in, semantic commands out.
//!
//! The host delivers raw key transitions; [`InputRouter`] decides which of
//! them mean "play a degree", "stop", or "change scale", and swallows
//! auto-repeat so a held key produces exactly one note-on.

/// Raw key events and identifiers.
pub mod event;
/// Classification and the held-key set.
pub mod router;

pub use event::{KeyEvent, KeyId, KeyTransition};
pub use router::{ActiveKeySet, Command, InputRouter};
