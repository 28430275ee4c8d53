//! Per-voice resonant lowpass (2-pole biquad).
//!
//! Coefficients follow the RBJ cookbook lowpass. Resonance comes from the
//! `initialFilterQ` generator in centibels.

use crate::error::{Error, Result};
use sfsynth_core::UnitTables;
use std::f32::consts::PI;

/// Cutoffs at or above this fraction of the sample rate bypass the filter.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, x: f32, coeffs: &Coeffs) -> f32 {
        let y = coeffs.b0 * x + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Coeffs {
    /// Both poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

/// Q factor for a resonance in centibels. 0 cB gives a flat 0.707.
#[inline]
pub fn resonance_q(q_centibels: i32) -> f32 {
    10f32.powf((q_centibels as f32 / 10.0 - 3.01) / 20.0)
}

/// Lowpass coefficients, or an error when the cutoff is out of range or the
/// result would not be finite and stable.
pub fn lowpass_coeffs(cutoff_hz: f32, q: f32, sample_rate: f32) -> Result<Coeffs> {
    let unstable = Error::UnstableFilterConfiguration { cutoff_hz, q };
    let in_range = cutoff_hz > 0.0 && cutoff_hz < MAX_CUTOFF_RATIO * sample_rate;
    if !in_range || q <= 0.0 || !q.is_finite() {
        return Err(unstable);
    }

    let w0 = 2.0 * PI * cutoff_hz / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let a0 = 1.0 + alpha;
    let coeffs = Coeffs {
        b0: (1.0 - cos_w0) / 2.0 / a0,
        b1: (1.0 - cos_w0) / a0,
        b2: (1.0 - cos_w0) / 2.0 / a0,
        a1: -2.0 * cos_w0 / a0,
        a2: (1.0 - alpha) / a0,
    };

    let finite = [coeffs.b0, coeffs.b1, coeffs.b2, coeffs.a1, coeffs.a2]
        .iter()
        .all(|c| c.is_finite());
    if !finite || !coeffs.is_stable() {
        return Err(unstable);
    }
    Ok(coeffs)
}

/// Lowpass filter state for one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct LowpassFilter {
    state: BiquadState,
    coeffs: Option<Coeffs>,
    cutoff_cents: i32,
    q_centibels: i32,
    designed: bool,
}

impl LowpassFilter {
    pub fn new() -> Self {
        Self {
            state: BiquadState::default(),
            coeffs: None,
            cutoff_cents: 0,
            q_centibels: 0,
            designed: false,
        }
    }

    /// Set the effective cutoff (absolute cents) and resonance (centibels).
    /// Coefficients are only redesigned when either changes.
    pub fn update(&mut self, cutoff_cents: i32, q_centibels: i32, sample_rate: f32, tables: &UnitTables) {
        if self.designed && cutoff_cents == self.cutoff_cents && q_centibels == self.q_centibels {
            return;
        }
        self.designed = true;
        self.cutoff_cents = cutoff_cents;
        self.q_centibels = q_centibels;

        let cutoff_hz = tables.abs_cents_to_hz(cutoff_cents as f32);
        let coeffs = lowpass_coeffs(cutoff_hz, resonance_q(q_centibels), sample_rate).ok();
        if coeffs.is_none() {
            self.state = BiquadState::default();
        }
        self.coeffs = coeffs;
    }

    /// Pass-through when the cutoff is fully open or the design failed.
    pub fn is_bypassed(&self) -> bool {
        self.coeffs.is_none()
    }

    pub fn process(&mut self, buffer: &mut [f32]) {
        let Some(coeffs) = self.coeffs else {
            return;
        };
        for sample in buffer.iter_mut() {
            *sample = self.state.process(*sample, &coeffs);
        }
    }
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self::new()
    }
}
