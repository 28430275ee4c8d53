//! Envelope timing shared by the volume and modulation envelopes, and the
//! modulation envelope itself.
//!
//! Phase boundaries are derived from a voice's effective generators once per
//! block. Both envelopes then evaluate as functions of time since note-on.

use sfsynth_core::units::{MAX_TIMECENTS, MIN_TIMECENTS};
use sfsynth_core::{UnitTables, DB_SILENCE};
use sfsynth_soundfont::{GeneratorType as G, GeneratorValues};

/// Envelope phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePhase {
    #[default]
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
    Finished,
}

/// Durations and levels of one envelope.
///
/// For the volume envelope `peak` and `sustain` are attenuations in dB. For
/// the modulation envelope they are levels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Seconds
    pub delay: f64,
    pub attack: f64,
    pub hold: f64,
    pub decay: f64,
    pub release: f64,
    pub peak: f32,
    pub sustain: f32,
}

impl EnvelopeParams {
    /// Volume envelope from effective generators. Hold and decay are scaled
    /// by `(60 - key)` times their keynum generators.
    pub fn volume(generators: &GeneratorValues, key: u8, tables: &UnitTables) -> Self {
        let key_offset = 60 - key as i32;
        let peak = (generators[G::InitialAttenuation] as f32 / 25.0).clamp(0.0, DB_SILENCE);
        let sustain = (peak + generators[G::SustainVolEnv] as f32 / 10.0).min(DB_SILENCE);
        Self {
            delay: seconds(tables, generators[G::DelayVolEnv]),
            attack: seconds(tables, generators[G::AttackVolEnv]),
            hold: seconds(
                tables,
                generators[G::HoldVolEnv] + key_offset * generators[G::KeynumToVolEnvHold],
            ),
            decay: seconds(
                tables,
                generators[G::DecayVolEnv] + key_offset * generators[G::KeynumToVolEnvDecay],
            ),
            release: seconds(tables, generators[G::ReleaseVolEnv]),
            peak,
            sustain,
        }
    }

    /// Modulation envelope from effective generators.
    pub fn modulation(generators: &GeneratorValues, key: u8, tables: &UnitTables) -> Self {
        let key_offset = 60 - key as i32;
        Self {
            delay: seconds(tables, generators[G::DelayModEnv]),
            attack: seconds(tables, generators[G::AttackModEnv]),
            hold: seconds(
                tables,
                generators[G::HoldModEnv] + key_offset * generators[G::KeynumToModEnvHold],
            ),
            decay: seconds(
                tables,
                generators[G::DecayModEnv] + key_offset * generators[G::KeynumToModEnvDecay],
            ),
            release: seconds(tables, generators[G::ReleaseModEnv]),
            peak: 1.0,
            sustain: (1.0 - generators[G::SustainModEnv] as f32 / 1000.0).clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn delay_end(&self) -> f64 {
        self.delay
    }

    #[inline]
    pub fn attack_end(&self) -> f64 {
        self.delay + self.attack
    }

    #[inline]
    pub fn hold_end(&self) -> f64 {
        self.attack_end() + self.hold
    }

    #[inline]
    pub fn decay_end(&self) -> f64 {
        self.hold_end() + self.decay
    }

    /// Pre-release phase at `elapsed` seconds after note-on.
    pub fn phase_at(&self, elapsed: f64) -> EnvelopePhase {
        if elapsed < self.delay_end() {
            EnvelopePhase::Delay
        } else if elapsed < self.attack_end() {
            EnvelopePhase::Attack
        } else if elapsed < self.hold_end() {
            EnvelopePhase::Hold
        } else if elapsed < self.decay_end() {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Sustain
        }
    }

    /// Progress through the attack phase, `0..=1`.
    #[inline]
    pub fn attack_progress(&self, elapsed: f64) -> f32 {
        if self.attack <= 0.0 {
            return 1.0;
        }
        ((elapsed - self.delay_end()) / self.attack).clamp(0.0, 1.0) as f32
    }

    /// Linear ramp from `peak` to `sustain` across the decay phase.
    #[inline]
    pub fn decay_level(&self, elapsed: f64) -> f32 {
        if self.decay <= 0.0 {
            return self.sustain;
        }
        let remaining = ((self.decay_end() - elapsed) / self.decay).clamp(0.0, 1.0) as f32;
        (1.0 - remaining) * (self.sustain - self.peak) + self.peak
    }
}

/// Timecents to seconds with key-scaled values kept inside the table.
#[inline]
pub(crate) fn seconds(tables: &UnitTables, timecents: i32) -> f64 {
    tables.timecents_to_seconds(timecents.clamp(MIN_TIMECENTS, MAX_TIMECENTS)) as f64
}

/// Modulation envelope, output in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModulationEnvelope {
    current: f32,
    releasing: bool,
    release_start: f64,
    release_start_value: f32,
}

impl ModulationEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last computed value.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Start the release ramp from the current value.
    pub fn release(&mut self, elapsed: f64) {
        if self.releasing {
            return;
        }
        self.releasing = true;
        self.release_start = elapsed;
        self.release_start_value = self.current;
    }

    /// Evaluate at `elapsed` seconds after note-on.
    pub fn value(&mut self, params: &EnvelopeParams, elapsed: f64, tables: &UnitTables) -> f32 {
        self.current = if self.releasing {
            let progress = if params.release > 0.0 {
                ((elapsed - self.release_start) / params.release).clamp(0.0, 1.0) as f32
            } else {
                1.0
            };
            self.release_start_value * (1.0 - progress)
        } else {
            match params.phase_at(elapsed) {
                EnvelopePhase::Delay => 0.0,
                EnvelopePhase::Attack => tables.attack_curve(params.attack_progress(elapsed)),
                EnvelopePhase::Hold => params.peak,
                EnvelopePhase::Decay => params.decay_level(elapsed),
                _ => params.sustain,
            }
        };
        self.current
    }
}
