//! Terminal implementations of the session's host traits

use std::io;

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use tenkey::{
    session::EventSource,
    vis::{FrameHandle, Particle, Surface},
};

/// Logical size of the particle field; the canvas scales it to fit.
pub const FIELD: (f64, f64) = (160.0, 90.0);

/// Particle field backed by the UI's draw loop.
///
/// A requested frame is fulfilled on the next UI tick, which is also when the
/// drawn particles are painted onto the canvas.
#[derive(Default)]
pub struct TerminalSurface {
    particles: Vec<Particle>,
    next: u64,
    pending: Option<FrameHandle>,
}

impl TerminalSurface {
    /// The frame request the next tick should fulfil.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (f64, f64) {
        FIELD
    }

    fn clear(&mut self) {
        self.particles.clear();
    }

    fn draw_particle(&mut self, particle: &Particle) {
        self.particles.push(*particle);
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Keyboard subscription through the kitty keyboard protocol.
///
/// Subscribing asks the terminal for release events and keypad state;
/// unsubscribing restores its previous mode.
pub struct KeypadEvents {
    enhanced: bool,
    pushed: bool,
}

impl KeypadEvents {
    pub fn new(enhanced: bool) -> Self {
        Self {
            enhanced,
            pushed: false,
        }
    }

    /// Whether the terminal can report key releases and the keypad flag.
    /// Only meaningful once raw mode is on.
    pub fn probe() -> bool {
        matches!(supports_keyboard_enhancement(), Ok(true))
    }
}

impl EventSource for KeypadEvents {
    fn subscribe(&mut self) -> io::Result<()> {
        if self.enhanced && !self.pushed {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
            self.pushed = true;
            log::debug!("keyboard enhancement flags pushed");
        }
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if self.pushed {
            if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                log::warn!("could not restore keyboard mode: {e}");
            }
            self.pushed = false;
            log::debug!("keyboard enhancement flags popped");
        }
    }
}
