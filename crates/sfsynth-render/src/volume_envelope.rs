//! Per-voice volume envelope.
//!
//! Works in the decibel domain: each sample is scaled by
//! `decibels_to_gain(phase_db + offset_db)`, where the offset carries the
//! modulation LFO's volume contribution for the block.

use crate::envelope::{EnvelopeParams, EnvelopePhase};
use sfsynth_core::{AttackCurve, UnitTables, DB_SILENCE};

/// Volume envelope state for one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEnvelope {
    curve: AttackCurve,
    phase: EnvelopePhase,
    current_db: f32,
    release_start: f64,
    release_start_db: f32,
}

impl VolumeEnvelope {
    pub fn new(curve: AttackCurve) -> Self {
        Self {
            curve,
            phase: EnvelopePhase::Delay,
            current_db: DB_SILENCE,
            release_start: 0.0,
            release_start_db: DB_SILENCE,
        }
    }

    /// Start at `attenuation_db` instead of silence, for voices whose delay
    /// and attack are effectively zero.
    pub fn with_instant_attack(mut self, attenuation_db: f32) -> Self {
        self.current_db = attenuation_db;
        self
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Attenuation of the last rendered sample, in dB.
    pub fn current_db(&self) -> f32 {
        self.current_db
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self.phase, EnvelopePhase::Release | EnvelopePhase::Finished)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == EnvelopePhase::Finished
    }

    /// Pre-release attenuation at `elapsed` seconds after note-on.
    pub fn attenuation_at(&self, params: &EnvelopeParams, elapsed: f64, tables: &UnitTables) -> f32 {
        match params.phase_at(elapsed) {
            EnvelopePhase::Delay => DB_SILENCE,
            EnvelopePhase::Attack => {
                let progress = params.attack_progress(elapsed);
                let shaped = match self.curve {
                    AttackCurve::Convex => tables.attack_curve(progress),
                    AttackCurve::Linear => progress,
                };
                params.peak + (DB_SILENCE - params.peak) * (1.0 - shaped)
            }
            EnvelopePhase::Hold => params.peak,
            EnvelopePhase::Decay => params.decay_level(elapsed),
            _ => params.sustain,
        }
    }

    /// Begin the release ramp from the current attenuation.
    pub fn release(&mut self, elapsed: f64) {
        if self.is_releasing() {
            return;
        }
        self.phase = EnvelopePhase::Release;
        self.release_start = elapsed;
        self.release_start_db = self.current_db;
    }

    /// Scale `buffer` in place. `elapsed` is the time of the first sample
    /// since note-on. Once the release reaches silence the rest of the
    /// buffer is zeroed and the envelope is finished.
    pub fn apply(
        &mut self,
        buffer: &mut [f32],
        params: &EnvelopeParams,
        elapsed: f64,
        sample_time: f64,
        offset_db: f32,
        tables: &UnitTables,
    ) {
        if self.is_finished() {
            buffer.fill(0.0);
            return;
        }

        for i in 0..buffer.len() {
            let t = elapsed + i as f64 * sample_time;

            if self.phase == EnvelopePhase::Release {
                let db = self.release_db(params, t);
                if db >= DB_SILENCE {
                    self.current_db = DB_SILENCE;
                    self.phase = EnvelopePhase::Finished;
                    buffer[i..].fill(0.0);
                    return;
                }
                self.current_db = db;
                buffer[i] *= tables.decibels_to_gain(db + offset_db);
                continue;
            }

            self.phase = params.phase_at(t);
            let db = self.attenuation_at(params, t, tables);
            self.current_db = db;

            buffer[i] *= match (self.phase, self.curve) {
                (EnvelopePhase::Delay, _) => 0.0,
                // Linear ramp in amplitude rather than decibels
                (EnvelopePhase::Attack, AttackCurve::Linear) => {
                    params.attack_progress(t) * tables.decibels_to_gain(params.peak + offset_db)
                }
                _ => tables.decibels_to_gain(db + offset_db),
            };
        }
    }

    fn release_db(&self, params: &EnvelopeParams, t: f64) -> f32 {
        if params.release <= 0.0 {
            return DB_SILENCE;
        }
        let progress = ((t - self.release_start) / params.release).max(0.0) as f32;
        progress * (DB_SILENCE - self.release_start_db) + self.release_start_db
    }
}
