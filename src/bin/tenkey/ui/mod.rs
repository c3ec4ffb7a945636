//! TUI module for tenkey
//!
//! Owns the session for the lifetime of the terminal UI. Each tick polls the
//! scope ring, fulfils the pending visualization frame, draws, then drains
//! keyboard input.

mod canvas;
mod host;
mod spectrum;
mod status;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyEventState};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use tenkey::{
    audio::RealtimeContext,
    input::{KeyEvent, KeyId, KeyTransition},
    session::Session,
};

pub use host::{KeypadEvents, TerminalSurface};

use canvas::render_particles;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_status, AudioStats, StatusView};
use waveform::render_waveform;

use super::app::AudioOutput;

/// Audio visualization buffer size (also the FFT length)
const VIS_BUFFER_SIZE: usize = 2048;

/// One UI tick, ~60 fps
const TICK: Duration = Duration::from_millis(16);

type TenkeySession = Session<RealtimeContext, TerminalSurface, KeypadEvents>;

pub struct TenkeyUi {
    session: TenkeySession,
    audio: Option<AudioOutput>,
    spectrum: Option<SpectrumAnalyzer>,
    /// Latest mono output for the scope views
    audio_buffer: Vec<f32>,
    /// Whether the terminal reports key releases
    releases_reported: bool,
    should_quit: bool,
}

impl TenkeyUi {
    pub fn new(session: TenkeySession, audio: Option<AudioOutput>, releases_reported: bool) -> Self {
        let spectrum = audio
            .as_ref()
            .map(|a| SpectrumAnalyzer::new(VIS_BUFFER_SIZE, a.sample_rate));
        if let Some(a) = &audio {
            log::debug!("scope tapping {} channel output", a.channels);
        }
        Self {
            session,
            audio,
            spectrum,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            releases_reported,
            should_quit: false,
        }
    }

    /// Run the UI event loop. The session is torn down when `self` drops.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();

            // The UI tick is the surface's refresh cycle
            if let Some(handle) = self.session.surface().pending() {
                self.session.on_frame(handle);
            }

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK)? {
                // Drain everything queued so chords land in the same tick
                loop {
                    if let Event::Key(key) = event::read()? {
                        self.handle_key(key);
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }

        self.session.teardown();
        Ok(())
    }

    /// Poll for new audio samples from ring buffer
    fn poll_audio(&mut self) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };

        let available = audio.scope.slots();
        if available == 0 {
            return;
        }
        // Keep only the newest VIS_BUFFER_SIZE samples
        let skip = available.saturating_sub(VIS_BUFFER_SIZE);
        for _ in 0..skip {
            let _ = audio.scope.pop();
        }
        while let Ok(sample) = audio.scope.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }

        if let Some(spectrum) = self.spectrum.as_mut() {
            spectrum.update(&self.audio_buffer);
        }
    }

    fn handle_key(&mut self, key: event::KeyEvent) {
        let transition = match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => KeyTransition::Down,
            KeyEventKind::Release => KeyTransition::Up,
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                if transition == KeyTransition::Down {
                    self.should_quit = true;
                }
            }
            KeyCode::Char(' ') => {
                if key.kind == KeyEventKind::Press {
                    self.session.release_all();
                }
            }
            KeyCode::Char(c) => {
                self.session.handle_key(KeyEvent {
                    key: KeyId::new(c),
                    transition,
                    keypad: key.state.contains(KeyEventState::KEYPAD),
                });
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let warning_height = if self.releases_reported { 0 } else { 1 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),              // Status bar
                Constraint::Min(8),                 // Particles
                Constraint::Length(8),              // Waveform + spectrum
                Constraint::Length(warning_height), // Release warning
                Constraint::Length(1),              // Help bar
            ])
            .split(area);

        let scales = self.session.scales();
        let scale = scales.current();
        let held: Vec<String> = self
            .session
            .active_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        let view = StatusView {
            scale_name: scale.name(),
            scale_index: scales.index(),
            scale_count: scales.len(),
            degrees: scale.len(),
            held: held.join(" "),
            frequency: self.session.frequency().get(),
            sample_rate: self.audio.as_ref().map(|a| a.sample_rate),
            stats: AudioStats::from_buffer(&self.audio_buffer),
        };
        render_status(frame, chunks[0], &view);

        render_particles(
            frame,
            chunks[1],
            self.session.surface().particles(),
            scale.name(),
        );

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, scopes[0], &self.audio_buffer, view.stats.peak);
        let spectrum = self.spectrum.as_ref().map_or(&[][..], |s| s.data());
        render_spectrum(frame, scopes[1], spectrum, view.frequency);

        if !self.releases_reported {
            let warning = Paragraph::new(
                " Terminal does not report key releases: notes hold until [Space]",
            )
            .style(Style::default().fg(Color::Yellow));
            frame.render_widget(warning, chunks[3]);
        }

        let help = Paragraph::new(" [1-9] Play  [+/-] Scale  [Space] Release all  [Q] Quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
