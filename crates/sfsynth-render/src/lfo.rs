//! Stateless triangle LFOs.
//!
//! LFO output is a pure function of elapsed time, so a voice can evaluate it
//! at any instant without carrying phase between blocks.

/// Triangle LFO value at `now` for an oscillator started at `start`.
///
/// Returns `0.0` before `start`. Starts at zero rising, peaks at `1.0` a
/// quarter period in and reaches `-1.0` at three quarters.
#[inline]
pub fn lfo_value(start: f64, frequency_hz: f32, now: f64) -> f32 {
    if now < start || frequency_hz <= 0.0 || !frequency_hz.is_finite() {
        return 0.0;
    }
    let cycles = (now - start) * frequency_hz as f64;
    let phase = (cycles - cycles.floor()) as f32;

    let p = phase * 4.0;
    if p < 1.0 {
        p
    } else if p < 3.0 {
        2.0 - p
    } else {
        p - 4.0
    }
}

/// Channel-wide vibrato (GS NRPN style), applied on top of each voice's own
/// vibrato LFO.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelVibrato {
    /// Rate in Hz
    pub rate: f32,
    /// Depth in cents
    pub depth: f32,
    /// Delay in seconds after note-on
    pub delay: f64,
}

impl ChannelVibrato {
    pub fn is_active(&self) -> bool {
        self.depth != 0.0 && self.rate > 0.0
    }

    /// Pitch offset in cents for a voice started at `voice_start`.
    pub fn cents(&self, voice_start: f64, now: f64) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        lfo_value(voice_start + self.delay, self.rate, now) * self.depth
    }
}
