//! Named scales and the cursor selecting the active one.

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::error::ScaleError;

/*
Scale Table
===========

A scale here is nothing more than an ordered list of pitches in Hz. The
keypad numeral picks a degree: key "1" plays degrees[0], key "2" plays
degrees[1], and so on. All built-in scales start on middle C (261.63 Hz)
and most end an octave up on C5 (523.25 Hz).

    key:      1       2       3       4       5       6       7       8
    Major:  261.63  293.66  329.63  349.23  392.00  440.00  493.88  523.25
             C4      D4      E4      F4      G4      A4      B4      C5

Scales are not required to have the same length. The blues scale has seven
degrees and the pentatonic six, so on those scales keys "8" (and "7") are
simply silent.

The cursor wraps in both directions:

    index:   0 → 1 → ... → N-1 → 0        (advance, "+")
             0 → N-1 → ... → 1 → 0        (retreat, "-")
*/

/// An immutable named list of pitches.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawScale"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    degrees: Vec<f32>,
}

impl Scale {
    /// Build a scale, rejecting empty lists and non-positive or non-finite pitches.
    pub fn new(name: impl Into<String>, degrees: Vec<f32>) -> Result<Self, ScaleError> {
        let name = name.into();
        if degrees.is_empty() {
            return Err(ScaleError::EmptyScale { name });
        }
        if let Some((index, &value)) = degrees
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f <= 0.0)
        {
            return Err(ScaleError::InvalidDegree { name, index, value });
        }
        Ok(Self { name, degrees })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn degrees(&self) -> &[f32] {
        &self.degrees
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    /// Whether the scale has no degrees; never true for a constructed scale.
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// Frequency for a 1-based degree number (the pressed numeral).
    ///
    /// Returns `None` for 0 or anything past the last degree.
    pub fn degree(&self, number: u32) -> Option<f32> {
        let index = (number as usize).checked_sub(1)?;
        self.degrees.get(index).copied()
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawScale {
    name: String,
    degrees: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawScale> for Scale {
    type Error = ScaleError;

    fn try_from(raw: RawScale) -> Result<Self, Self::Error> {
        Scale::new(raw.name, raw.degrees)
    }
}

/// Ordered, non-empty table of scales plus the active-scale cursor.
#[derive(Debug, Clone)]
pub struct ScaleRegistry {
    scales: Vec<Scale>,
    index: usize,
}

impl ScaleRegistry {
    pub fn new(scales: Vec<Scale>) -> Result<Self, ScaleError> {
        if scales.is_empty() {
            return Err(ScaleError::EmptyRegistry);
        }
        Ok(Self { scales, index: 0 })
    }

    /// The ten scales the instrument ships with, all rooted on C4.
    pub fn builtin() -> Self {
        Self {
            scales: builtin_scales(),
            index: 0,
        }
    }

    pub fn current(&self) -> &Scale {
        &self.scales[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn scales(&self) -> &[Scale] {
        &self.scales
    }

    /// Move to the next scale, wrapping to 0 after the last.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.scales.len();
        self.index
    }

    /// Move to the previous scale, wrapping to the last from 0.
    pub fn retreat(&mut self) -> usize {
        let n = self.scales.len();
        self.index = (self.index + n - 1) % n;
        self.index
    }

    /// Jump to `index`, clamped into range.
    pub fn select(&mut self, index: usize) -> usize {
        self.index = index.min(self.scales.len() - 1);
        self.index
    }
}

impl Default for ScaleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

const C4: f32 = 261.63;
const CS4: f32 = 277.18;
const D4: f32 = 293.66;
const EB4: f32 = 311.13;
const E4: f32 = 329.63;
const F4: f32 = 349.23;
const FS4: f32 = 370.00;
const G4: f32 = 392.00;
const AB4: f32 = 415.30;
const A4: f32 = 440.00;
const BB4: f32 = 466.16;
const B4: f32 = 493.88;
const C5: f32 = 523.25;

fn builtin_scales() -> Vec<Scale> {
    let table: [(&str, &[f32]); 10] = [
        ("Major", &[C4, D4, E4, F4, G4, A4, B4, C5]),
        ("Natural Minor", &[C4, D4, EB4, F4, G4, AB4, BB4, C5]),
        ("Harmonic Minor", &[C4, D4, EB4, F4, G4, AB4, B4, C5]),
        ("Melodic Minor", &[C4, D4, EB4, F4, G4, A4, B4, C5]),
        ("Dorian", &[C4, D4, EB4, F4, G4, A4, BB4, C5]),
        ("Phrygian", &[C4, CS4, EB4, F4, G4, AB4, BB4, C5]),
        ("Lydian", &[C4, D4, E4, FS4, G4, A4, B4, C5]),
        ("Mixolydian", &[C4, D4, E4, F4, G4, A4, BB4, C5]),
        ("Blues", &[C4, D4, EB4, E4, G4, BB4, C5]),
        ("Pentatonic", &[C4, D4, E4, G4, A4, C5]),
    ];

    table
        .iter()
        .map(|(name, degrees)| Scale {
            name: (*name).to_string(),
            degrees: degrees.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_retreat_are_inverse() {
        let mut reg = ScaleRegistry::builtin();
        for start in 0..reg.len() {
            reg.select(start);
            reg.advance();
            assert_eq!(reg.retreat(), start);

            reg.select(start);
            reg.retreat();
            assert_eq!(reg.advance(), start);
        }
    }

    #[test]
    fn cursor_wraps_at_both_ends() {
        let mut reg = ScaleRegistry::builtin();
        let last = reg.len() - 1;

        assert_eq!(reg.retreat(), last);
        assert_eq!(reg.advance(), 0);
    }

    #[test]
    fn single_scale_registry_stays_put() {
        let only = Scale::new("Drone", vec![110.0]).unwrap();
        let mut reg = ScaleRegistry::new(vec![only]).unwrap();

        assert_eq!(reg.advance(), 0);
        assert_eq!(reg.retreat(), 0);
    }

    #[test]
    fn degree_lookup_is_one_based() {
        let reg = ScaleRegistry::builtin();
        let major = reg.current();

        assert_eq!(major.degree(1), Some(261.63));
        assert_eq!(major.degree(8), Some(523.25));
        assert_eq!(major.degree(0), None);
        assert_eq!(major.degree(9), None);
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(
            ScaleRegistry::new(vec![]).unwrap_err(),
            ScaleError::EmptyRegistry
        );
        assert!(matches!(
            Scale::new("Empty", vec![]),
            Err(ScaleError::EmptyScale { .. })
        ));
        assert!(matches!(
            Scale::new("Broken", vec![261.63, f32::NAN]),
            Err(ScaleError::InvalidDegree { index: 1, .. })
        ));
        assert!(matches!(
            Scale::new("Negative", vec![-1.0]),
            Err(ScaleError::InvalidDegree { index: 0, .. })
        ));
    }

    #[test]
    fn builtin_lengths() {
        let reg = ScaleRegistry::builtin();
        let lengths: Vec<usize> = reg.scales().iter().map(Scale::len).collect();

        assert_eq!(lengths, vec![8, 8, 8, 8, 8, 8, 8, 8, 7, 6]);
        assert!(!reg.is_empty());
        assert!(reg.scales().iter().all(|s| !s.is_empty()));
    }
}
