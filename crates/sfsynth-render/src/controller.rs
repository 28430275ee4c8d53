//! Per-channel controller table.
//!
//! MIDI continuous controllers occupy indices 0-127, stored as 14-bit values
//! (`value << 7`). Non-CC modulator sources live at
//! `NON_CC_INDEX_OFFSET + source index`, so a modulator's source operator
//! maps straight onto a slot.

use sfsynth_soundfont::SourceController;

/// Size of the table: 128 CCs plus the non-CC sources.
pub const CONTROLLER_TABLE_SIZE: usize = 147;

/// First slot used by non-CC sources.
pub const NON_CC_INDEX_OFFSET: usize = 128;

const POLY_PRESSURE: usize = NON_CC_INDEX_OFFSET + 10;
const CHANNEL_PRESSURE: usize = NON_CC_INDEX_OFFSET + 13;
const PITCH_WHEEL: usize = NON_CC_INDEX_OFFSET + 14;
const PITCH_WHEEL_RANGE: usize = NON_CC_INDEX_OFFSET + 16;
const CHANNEL_TUNING: usize = NON_CC_INDEX_OFFSET + 17;
const CHANNEL_TRANSPOSE: usize = NON_CC_INDEX_OFFSET + 18;

/// MIDI controller numbers the renderer interprets.
pub mod cc {
    pub const MODULATION_WHEEL: u8 = 1;
    pub const DATA_ENTRY: u8 = 6;
    pub const MAIN_VOLUME: u8 = 7;
    pub const PAN: u8 = 10;
    pub const EXPRESSION: u8 = 11;
    pub const RELEASE_TIME: u8 = 72;
    pub const BRIGHTNESS: u8 = 74;
    pub const REVERB_DEPTH: u8 = 91;
    pub const CHORUS_DEPTH: u8 = 93;
    pub const RPN_LSB: u8 = 100;
    pub const RPN_MSB: u8 = 101;
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const RESET_ALL_CONTROLLERS: u8 = 121;
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// Center of the 14-bit pitch wheel.
pub const PITCH_WHEEL_CENTER: u16 = 8192;

const NULL_RPN: i16 = 127 << 7;

/// Controller values for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerTable {
    values: [i16; CONTROLLER_TABLE_SIZE],
}

impl ControllerTable {
    pub fn new() -> Self {
        let mut table = Self {
            values: [0; CONTROLLER_TABLE_SIZE],
        };
        table.reset();
        table
    }

    /// Restore MIDI reset values. Channel transpose is kept.
    pub fn reset(&mut self) {
        let transpose = self.values[CHANNEL_TRANSPOSE];
        self.values = [0; CONTROLLER_TABLE_SIZE];

        self.values[cc::MAIN_VOLUME as usize] = 100 << 7;
        self.values[cc::PAN as usize] = 64 << 7;
        self.values[cc::EXPRESSION as usize] = 127 << 7;
        self.values[cc::RELEASE_TIME as usize] = 64 << 7;
        self.values[cc::BRIGHTNESS as usize] = 64 << 7;
        self.values[cc::RPN_LSB as usize] = NULL_RPN;
        self.values[cc::RPN_MSB as usize] = NULL_RPN;

        self.values[PITCH_WHEEL] = PITCH_WHEEL_CENTER as i16;
        self.values[PITCH_WHEEL_RANGE] = 2 << 7;
        self.values[CHANNEL_TRANSPOSE] = transpose;
    }

    /// Raw 14-bit slot value.
    #[inline]
    pub fn get(&self, index: usize) -> i16 {
        self.values.get(index).copied().unwrap_or(0)
    }

    /// 7-bit value of a continuous controller.
    pub fn cc(&self, controller: u8) -> u8 {
        (self.get(controller as usize) >> 7) as u8
    }

    pub fn set_cc(&mut self, controller: u8, value: u8) {
        if let Some(slot) = self.values.get_mut(controller as usize & 0x7F) {
            *slot = ((value & 0x7F) as i16) << 7;
        }
    }

    /// Whether RPN 0 (pitch-wheel range) is currently selected.
    pub fn pitch_range_rpn_selected(&self) -> bool {
        self.cc(cc::RPN_MSB) == 0 && self.cc(cc::RPN_LSB) == 0
    }

    pub fn pitch_wheel(&self) -> u16 {
        self.values[PITCH_WHEEL] as u16
    }

    /// Set the 14-bit pitch wheel (`0..=16383`, center 8192).
    pub fn set_pitch_wheel(&mut self, value: u16) {
        self.values[PITCH_WHEEL] = value.min(16383) as i16;
    }

    /// Pitch-wheel range in semitones.
    pub fn pitch_wheel_range(&self) -> u8 {
        (self.values[PITCH_WHEEL_RANGE] >> 7) as u8
    }

    pub fn set_pitch_wheel_range(&mut self, semitones: u8) {
        self.values[PITCH_WHEEL_RANGE] = ((semitones & 0x7F) as i16) << 7;
    }

    pub fn set_channel_pressure(&mut self, value: u8) {
        self.values[CHANNEL_PRESSURE] = ((value & 0x7F) as i16) << 7;
    }

    pub fn set_poly_pressure(&mut self, value: u8) {
        self.values[POLY_PRESSURE] = ((value & 0x7F) as i16) << 7;
    }

    /// Channel fine tuning in cents.
    pub fn tuning(&self) -> i16 {
        self.values[CHANNEL_TUNING]
    }

    pub fn set_tuning(&mut self, cents: i16) {
        self.values[CHANNEL_TUNING] = cents;
    }

    /// Channel transpose in cents.
    pub fn transpose(&self) -> i16 {
        self.values[CHANNEL_TRANSPOSE]
    }

    pub fn set_transpose(&mut self, semitones: i8) {
        self.values[CHANNEL_TRANSPOSE] = semitones as i16 * 100;
    }

    /// 14-bit value a modulator source reads, or `None` for sources that are
    /// not table backed (velocity, key, no-controller, link).
    pub fn source_value(&self, controller: SourceController) -> Option<i16> {
        match controller {
            SourceController::Cc(n) => Some(self.get(n as usize)),
            SourceController::PolyPressure => Some(self.values[POLY_PRESSURE]),
            SourceController::ChannelPressure => Some(self.values[CHANNEL_PRESSURE]),
            SourceController::PitchWheel => Some(self.values[PITCH_WHEEL]),
            SourceController::PitchWheelRange => Some(self.values[PITCH_WHEEL_RANGE]),
            SourceController::Unknown(index) => Some(self.get(NON_CC_INDEX_OFFSET + index as usize)),
            SourceController::NoController
            | SourceController::NoteOnVelocity
            | SourceController::NoteOnKey
            | SourceController::Link => None,
        }
    }
}

impl Default for ControllerTable {
    fn default() -> Self {
        Self::new()
    }
}
