//! Unit conversion lookup tables.
//!
//! SoundFont2 expresses times in timecents, frequencies in absolute cents and
//! levels in centibels. The renderer converts these once per block (or once
//! per sample for envelope gain), so all conversions go through dense tables
//! built when the engine starts.
//!
//! | Conversion | Formula | Domain |
//! |------------|---------|--------|
//! | [`UnitTables::timecents_to_seconds`] | `2^(tc/1200)` | -15000..=15000 (panics outside) |
//! | [`UnitTables::abs_cents_to_hz`] | `440 * 2^((c-6900)/1200)` | table for -20000..=16500, computed outside |
//! | [`UnitTables::decibels_to_gain`] | `10^(-dB/20)` | -1660..=1600 dB at 0.01 dB steps |
//! | [`UnitTables::attack_curve`] | convex attack shape | 0.0..=1.0 |

/// Attenuation treated as full silence, in decibels.
pub const DB_SILENCE: f32 = 100.0;

pub const MIN_TIMECENTS: i32 = -15000;
pub const MAX_TIMECENTS: i32 = 15000;

pub const MIN_ABS_CENTS: i32 = -20000;
pub const MAX_ABS_CENTS: i32 = 16500;

pub const MIN_DECIBELS: f32 = -1660.0;
pub const MAX_DECIBELS: f32 = 1600.0;

/// Table entries per decibel.
const DECIBEL_STEPS: f32 = 100.0;

/// Number of steps in the attack curve table.
pub const ATTACK_CURVE_STEPS: usize = 1000;

/// Immutable conversion tables owned by one engine instance.
#[derive(Debug, Clone)]
pub struct UnitTables {
    timecents: Box<[f32]>,
    absolute_cents: Box<[f32]>,
    decibels: Box<[f32]>,
    attack: Box<[f32]>,
}

impl UnitTables {
    /// Build every table. Takes a few milliseconds; call once per engine.
    pub fn new() -> Self {
        let timecents = (MIN_TIMECENTS..=MAX_TIMECENTS)
            .map(|tc| 2f64.powf(tc as f64 / 1200.0) as f32)
            .collect();

        let absolute_cents = (MIN_ABS_CENTS..=MAX_ABS_CENTS)
            .map(|cents| abs_cents_to_hz_exact(cents as f32))
            .collect();

        let decibel_len = ((MAX_DECIBELS - MIN_DECIBELS) * DECIBEL_STEPS) as usize + 1;
        let decibels = (0..decibel_len)
            .map(|i| {
                let db = (MIN_DECIBELS as f64 * DECIBEL_STEPS as f64 + i as f64)
                    / DECIBEL_STEPS as f64;
                10f64.powf(-db / 20.0) as f32
            })
            .collect();

        let attack = (0..=ATTACK_CURVE_STEPS)
            .map(|i| convex(i as f32 / ATTACK_CURVE_STEPS as f32))
            .collect();

        Self {
            timecents,
            absolute_cents,
            decibels,
            attack,
        }
    }

    /// Convert timecents to seconds.
    ///
    /// # Panics
    ///
    /// Panics if `timecents` lies outside `MIN_TIMECENTS..=MAX_TIMECENTS`.
    /// Callers clamp generator values to their legal range first.
    #[inline]
    pub fn timecents_to_seconds(&self, timecents: i32) -> f32 {
        assert!(
            (MIN_TIMECENTS..=MAX_TIMECENTS).contains(&timecents),
            "timecents {timecents} outside conversion table"
        );
        self.timecents[(timecents - MIN_TIMECENTS) as usize]
    }

    /// Convert absolute cents to Hz.
    ///
    /// Values inside the table are truncated toward zero before lookup;
    /// values outside it are computed directly.
    #[inline]
    pub fn abs_cents_to_hz(&self, cents: f32) -> f32 {
        if cents < MIN_ABS_CENTS as f32 || cents > MAX_ABS_CENTS as f32 || cents.is_nan() {
            return abs_cents_to_hz_exact(cents);
        }
        self.absolute_cents[(cents as i32 - MIN_ABS_CENTS) as usize]
    }

    /// Convert an attenuation in decibels to linear gain.
    ///
    /// The index is always floored, never rounded. Values beyond the table
    /// read its first or last entry.
    #[inline]
    pub fn decibels_to_gain(&self, decibels: f32) -> f32 {
        if decibels.is_nan() {
            return 0.0;
        }
        let index = ((decibels - MIN_DECIBELS) * DECIBEL_STEPS).floor().max(0.0) as usize;
        self.decibels[index.min(self.decibels.len() - 1)]
    }

    /// Convex attack shape for progress in `0.0..=1.0`, returning `0.0..=1.0`.
    #[inline]
    pub fn attack_curve(&self, progress: f32) -> f32 {
        let index = (progress.clamp(0.0, 1.0) * ATTACK_CURVE_STEPS as f32) as usize;
        self.attack[index.min(ATTACK_CURVE_STEPS)]
    }
}

impl Default for UnitTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Direct (untabulated) absolute cents to Hz.
#[inline]
pub fn abs_cents_to_hz_exact(cents: f32) -> f32 {
    440.0 * 2f32.powf((cents - 6900.0) / 1200.0)
}

/// SoundFont2 convex curve: `1 + 20/96 * log10(x^2)`, clamped to `0..=1`.
pub fn convex(x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    (1.0 + (40.0 / 96.0) * x.log10()).clamp(0.0, 1.0)
}

/// SoundFont2 concave curve: `-20/96 * log10((1-x)^2)`, clamped to `0..=1`.
pub fn concave(x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    (-(40.0 / 96.0) * (1.0 - x).log10()).clamp(0.0, 1.0)
}
