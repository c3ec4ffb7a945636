//! Spectrum analyzer widget
//!
//! FFT over the latest scope window, read out at log-spaced frequencies
//! around the playable range so each octave gets the same width.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Points drawn across the x axis
const POINTS: usize = 64;

/// Displayed range: two octaves below middle C to three above
const LOW_HZ: f64 = 65.0;
const HIGH_HZ: f64 = 2_100.0;

const FLOOR_DB: f64 = -90.0;

/// Per-tick fall of the displayed level, in dB, so peaks linger briefly
const DECAY_DB: f64 = 3.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each display point
    bins: Vec<usize>,
    /// (octaves above LOW_HZ, level in dB)
    points: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_len);

        // Hann window
        let denom = fft_len.saturating_sub(1).max(1) as f32;
        let window = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let octaves = (HIGH_HZ / LOW_HZ).log2();
        let last_bin = (fft_len / 2).saturating_sub(1);
        let mut bins = Vec::with_capacity(POINTS);
        let mut points = Vec::with_capacity(POINTS);
        for i in 0..POINTS {
            let octave = octaves * i as f64 / (POINTS - 1) as f64;
            let hz = LOW_HZ * octave.exp2();
            let bin = (hz * fft_len as f64 / sample_rate as f64).round() as usize;
            bins.push(bin.min(last_bin));
            points.push((octave, FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            bins,
            points,
        }
    }

    /// Analyse `buffer`, which must be exactly one FFT window long.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &s), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = (self.window.len() as f32 / 2.0).powi(2);
        for (point, &bin) in self.points.iter_mut().zip(&self.bins) {
            let power = (self.scratch[bin].norm_sqr() / norm).max(1e-12);
            let db = (10.0 * (power as f64).log10()).max(FLOOR_DB);
            point.1 = db.max(point.1 - DECAY_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.points
    }
}

/// Octave position of `hz` on the spectrum's x axis.
pub fn octave_of(hz: f32) -> f64 {
    (hz as f64 / LOW_HZ).log2()
}

/// Render the spectrum, with a marker at the sounding note if there is one
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)], note: Option<f32>) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let marker: Vec<(f64, f64)> = note
        .map(|hz| {
            let x = octave_of(hz);
            vec![(x, FLOOR_DB), (x, 0.0)]
        })
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum)];
    if !marker.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&marker),
        );
    }

    let octaves = (HIGH_HZ / LOW_HZ).log2();
    let x_labels: Vec<String> = (0..4)
        .map(|k| format!("{:.0}", LOW_HZ * (octaves * k as f64 / 3.0).exp2()))
        .collect();
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, octaves])
                .labels(x_labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-90", "-45", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_peaks_at_its_own_octave() {
        let sample_rate = 48_000.0;
        let mut analyzer = SpectrumAnalyzer::new(4096, sample_rate);
        let hz = 440.0f32;
        let buffer: Vec<f32> = (0..4096)
            .map(|i| (std::f32::consts::TAU * hz * i as f32 / sample_rate).sin())
            .collect();

        analyzer.update(&buffer);

        let (loudest, _) = analyzer
            .data()
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert!((loudest - octave_of(hz)).abs() < 0.1, "loudest at {loudest}");
    }
}
