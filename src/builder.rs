//! Builder for configuring and constructing a `SynthEngine`.

use crate::{Result, SynthEngine};
use sfsynth_core::{AttackCurve, Interpolation, SynthConfig};
use sfsynth_soundfont::{SoundFont, SoundFontSystem};
use std::path::PathBuf;

/// Default number of MIDI channels.
pub const DEFAULT_CHANNELS: usize = 16;

/// Every [`SynthConfig`] field is exposed fluently. The config is validated
/// in [`SynthEngineBuilder::build`].
///
/// # Example
///
/// ```ignore
/// use sfsynth::prelude::*;
///
/// let engine = SynthEngine::builder()
///     .sample_rate(48000.0)
///     .block_size(64)
///     .channels(16)
///     .soundfont_path("gm.sf2")
///     .build()?;
/// ```
pub struct SynthEngineBuilder {
    config: SynthConfig,
    channels: usize,
    soundfont: Option<SoundFont>,
    soundfont_path: Option<PathBuf>,
}

impl Default for SynthEngineBuilder {
    fn default() -> Self {
        Self {
            config: SynthConfig::default(),
            channels: DEFAULT_CHANNELS,
            soundfont: None,
            soundfont_path: None,
        }
    }
}

impl SynthEngineBuilder {
    /// Replace the whole config.
    pub fn config(mut self, config: SynthConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 128
    pub fn block_size(mut self, frames: usize) -> Self {
        self.config.block_size = frames;
        self
    }

    /// Default: 400
    pub fn voice_cap(mut self, voices: usize) -> Self {
        self.config.voice_cap = voices;
        self
    }

    /// Default: 256
    pub fn message_capacity(mut self, capacity: usize) -> Self {
        self.config.message_capacity = capacity;
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.config.interpolation = interpolation;
        self
    }

    pub fn attack_curve(mut self, curve: AttackCurve) -> Self {
        self.config.attack_curve = curve;
        self
    }

    /// Default: 16
    pub fn channels(mut self, count: usize) -> Self {
        self.channels = count;
        self
    }

    /// Start with an already decoded SoundFont selected.
    pub fn soundfont(mut self, soundfont: SoundFont) -> Self {
        self.soundfont = Some(soundfont);
        self.soundfont_path = None;
        self
    }

    /// Load and select a SoundFont file when building.
    pub fn soundfont_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.soundfont_path = Some(path.into());
        self.soundfont = None;
        self
    }

    pub fn build(self) -> Result<SynthEngine> {
        self.config.validate()?;
        if self.channels == 0 {
            return Err(sfsynth_core::Error::InvalidConfig(
                "channels must be at least 1".to_string(),
            )
            .into());
        }

        // Decode before channels exist so their sample slots can be pre-sized
        let soundfonts = SoundFontSystem::new();
        let active = match (self.soundfont, self.soundfont_path) {
            (Some(soundfont), _) => Some(soundfonts.insert(soundfont)),
            (None, Some(path)) => Some(soundfonts.load(path)?),
            (None, None) => None,
        };

        SynthEngine::from_parts(self.config, self.channels, soundfonts, active)
    }
}
