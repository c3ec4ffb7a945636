//! Session tunables and the scale table.
//!
//! Everything has a default, so an empty file (or no file) yields the stock
//! instrument: keypad only, sine voices, 30 ms release, the ten built-in scales.
//!
//! ```toml
//! waveform = "triangle"
//! release_ms = 45.0
//!
//! [[scales]]
//! name = "Hirajoshi"
//! degrees = [261.63, 293.66, 311.13, 392.00, 415.30, 523.25]
//! ```

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::{
    audio::renderer::DEFAULT_MASTER_GAIN,
    dsp::Waveform,
    engine::ReleaseShape,
    error::{ConfigError, ScaleError},
    scale::{Scale, ScaleRegistry},
    vis::VisConfig,
};

#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Ignore keys that do not come from the numeric keypad.
    pub require_keypad: bool,
    pub waveform: Waveform,
    /// Note-off fade length in milliseconds.
    pub release_ms: f64,
    /// Level the fade ends at, relative to full scale.
    pub release_floor: f32,
    /// Output attenuation applied after mixing voices.
    pub master_gain: f32,
    /// Particles seeded per note-on.
    pub particles: usize,
    /// Particle speed per Hz of the triggering note.
    pub speed_per_hz: f64,
    /// Fixed seed for the particle RNG; random when absent.
    pub seed: Option<u64>,
    /// Replaces the built-in scales when non-empty.
    pub scales: Vec<Scale>,
}

impl Default for Config {
    fn default() -> Self {
        let release = ReleaseShape::default();
        let vis = VisConfig::default();
        Self {
            require_keypad: true,
            waveform: Waveform::Sine,
            release_ms: release.duration * 1000.0,
            release_floor: release.floor,
            master_gain: DEFAULT_MASTER_GAIN,
            particles: vis.particles,
            speed_per_hz: vis.speed_per_hz,
            seed: None,
            scales: Vec::new(),
        }
    }
}

impl Config {
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        log::info!(
            "loaded config from {} ({} custom scales)",
            path.as_ref().display(),
            config.scales.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.release_ms.is_finite() && self.release_ms > 0.0) {
            return Err(invalid("release_ms", format!("must be positive, got {}", self.release_ms)));
        }
        if !(self.release_floor > 0.0 && self.release_floor < 1.0) {
            return Err(invalid(
                "release_floor",
                format!("must be between 0 and 1, got {}", self.release_floor),
            ));
        }
        if !(self.master_gain.is_finite() && self.master_gain >= 0.0) {
            return Err(invalid(
                "master_gain",
                format!("must be non-negative, got {}", self.master_gain),
            ));
        }
        if !(self.speed_per_hz.is_finite() && self.speed_per_hz >= 0.0) {
            return Err(invalid(
                "speed_per_hz",
                format!("must be non-negative, got {}", self.speed_per_hz),
            ));
        }
        Ok(())
    }

    pub fn scale_registry(&self) -> Result<ScaleRegistry, ScaleError> {
        if self.scales.is_empty() {
            Ok(ScaleRegistry::builtin())
        } else {
            ScaleRegistry::new(self.scales.clone())
        }
    }

    pub fn release_shape(&self) -> ReleaseShape {
        ReleaseShape {
            duration: self.release_ms / 1000.0,
            floor: self.release_floor,
        }
    }

    pub fn vis_config(&self) -> VisConfig {
        VisConfig {
            particles: self.particles,
            speed_per_hz: self.speed_per_hz,
            ..VisConfig::default()
        }
    }
}

fn invalid(name: &'static str, message: String) -> ConfigError {
    ConfigError::InvalidSetting { name, message }
}
