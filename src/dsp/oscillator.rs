#[cfg(feature = "serde")]
use serde::Deserialize;

/*
Phase Accumulator
=================

Every waveform here is computed from a single running phase in [0, 1):

    phase += frequency / sample_rate      (once per sample)
    phase -= 1.0 when it passes 1.0

The waveform is then a pure function of phase:

    Sine      sin(2π·phase)                   pure tone, no harmonics
    Square    +1 for phase < 0.5, else -1     odd harmonics, hollow
    Sawtooth  2·phase - 1                     all harmonics, bright
    Triangle  1 - 4·|phase - 0.5|             odd harmonics, soft

Frequency is read per sample so a scheduled frequency change lands on the
exact sample it was scheduled for. Phase is never reset mid-note, which keeps
frequency changes click-free.
*/

/// Oscillator waveform shape.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    #[cfg_attr(feature = "serde", serde(alias = "saw"))]
    Sawtooth,
    Triangle,
}

impl std::str::FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Self::Sine),
            "square" => Ok(Self::Square),
            "sawtooth" | "saw" => Ok(Self::Sawtooth),
            "triangle" => Ok(Self::Triangle),
            other => Err(format!("unknown waveform '{other}'")),
        }
    }
}

pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let p = self.phase as f32;
        let out = match self.waveform {
            Waveform::Sine => (std::f32::consts::TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };

        self.phase += frequency as f64 / sample_rate as f64;
        self.phase -= self.phase.floor();
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
