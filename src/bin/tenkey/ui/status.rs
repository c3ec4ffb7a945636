//! Status bar widget - shows scale, held keys, pitch, and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Everything the status bar shows, gathered once per tick.
pub struct StatusView<'a> {
    pub scale_name: &'a str,
    pub scale_index: usize,
    pub scale_count: usize,
    pub degrees: usize,
    pub held: String,
    pub frequency: Option<f32>,
    /// `None` when running without an output device
    pub sample_rate: Option<f32>,
    pub stats: AudioStats,
}

/// Render the status bar
pub fn render_status(frame: &mut Frame, area: Rect, view: &StatusView) {
    let block = Block::default().title(" tenkey ").borders(Borders::ALL);

    let pitch = match view.frequency {
        Some(hz) => format!("{hz:.2} Hz  "),
        None => "--  ".to_string(),
    };
    let held = if view.held.is_empty() { "-" } else { view.held.as_str() };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", view.scale_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("({}/{}, {} degrees)  ", view.scale_index + 1, view.scale_count, view.degrees),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Held: {held}  "),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            pitch,
            Style::default().fg(if view.frequency.is_some() {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
    ];

    match view.sample_rate {
        Some(sr) => {
            spans.push(Span::styled(
                format!("{:.1}kHz  ", sr / 1000.0),
                Style::default().fg(Color::DarkGray),
            ));
            spans.push(Span::styled(
                format!("Peak: {:.2}  RMS: {:.2}", view.stats.peak, view.stats.rms),
                Style::default().fg(Color::Magenta),
            ));
        }
        None => spans.push(Span::styled("no audio", Style::default().fg(Color::Yellow))),
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
