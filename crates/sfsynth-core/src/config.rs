//! Synthesis engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sample interpolation used by the wavetable oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Linear interpolation between the two neighbouring sample points
    #[default]
    Linear,
    /// Nearest neighbour (cheaper, lower quality)
    NearestNeighbor,
}

/// Shape of the volume envelope attack phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttackCurve {
    /// Tabulated convex curve in the decibel domain
    #[default]
    Convex,
    /// Linear amplitude ramp (simplified legacy behaviour)
    Linear,
}

/// Configuration for the synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Render sample rate in Hz
    pub sample_rate: f64,
    /// Frames rendered per block
    pub block_size: usize,
    /// Maximum simultaneous voices per channel
    pub voice_cap: usize,
    /// Capacity of each control message queue
    pub message_capacity: usize,
    pub interpolation: Interpolation,
    pub attack_curve: AttackCurve,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 128,
            voice_cap: 400,
            message_capacity: 256,
            interpolation: Interpolation::Linear,
            attack_curve: AttackCurve::Convex,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=8192).contains(&self.block_size) {
            return Err(Error::InvalidConfig(format!(
                "block_size {} out of range (1-8192 frames)",
                self.block_size
            )));
        }
        if !(1..=4096).contains(&self.voice_cap) {
            return Err(Error::InvalidConfig(format!(
                "voice_cap {} out of range (1-4096)",
                self.voice_cap
            )));
        }
        if self.message_capacity < 16 {
            return Err(Error::InvalidConfig(format!(
                "message_capacity {} too small (minimum 16)",
                self.message_capacity
            )));
        }
        Ok(())
    }

    /// Duration of one sample frame in seconds.
    #[inline]
    pub fn sample_time(&self) -> f64 {
        1.0 / self.sample_rate
    }
}
