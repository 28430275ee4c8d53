//! SoundFont2 modulators (SF2 2.04 section 8.2).

use crate::generator::GeneratorType;

/// Curve applied to a normalized source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    Linear,
    Concave,
    Convex,
    Switch,
}

/// What a source reads when its CC flag is clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceController {
    NoController,
    NoteOnVelocity,
    NoteOnKey,
    PolyPressure,
    ChannelPressure,
    PitchWheel,
    PitchWheelRange,
    /// Output of another modulator. Links are not evaluated.
    Link,
    /// MIDI continuous controller number.
    Cc(u8),
    /// Reserved general-controller index.
    Unknown(u8),
}

/// Packed modulator source operator.
///
/// | Bits | Meaning |
/// |------|---------|
/// | 0-6 | controller index |
/// | 7 | index is a MIDI CC |
/// | 8 | direction (set = max to min) |
/// | 9 | polarity (set = bipolar) |
/// | 10-15 | curve type |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulatorSource(u16);

impl ModulatorSource {
    pub const NONE: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    pub const fn is_cc(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 & 0x100 != 0
    }

    pub const fn is_bipolar(self) -> bool {
        self.0 & 0x200 != 0
    }

    /// Curve type. Undefined curve ids read as linear.
    pub const fn curve(self) -> CurveType {
        match self.0 >> 10 {
            1 => CurveType::Concave,
            2 => CurveType::Convex,
            3 => CurveType::Switch,
            _ => CurveType::Linear,
        }
    }

    pub const fn controller(self) -> SourceController {
        let index = self.index();
        if self.is_cc() {
            return SourceController::Cc(index);
        }
        match index {
            0 => SourceController::NoController,
            2 => SourceController::NoteOnVelocity,
            3 => SourceController::NoteOnKey,
            10 => SourceController::PolyPressure,
            13 => SourceController::ChannelPressure,
            14 => SourceController::PitchWheel,
            16 => SourceController::PitchWheelRange,
            127 => SourceController::Link,
            other => SourceController::Unknown(other),
        }
    }
}

/// Output transform applied to a modulator's product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformType {
    Linear,
    /// Absolute value
    Absolute,
}

impl TransformType {
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            2 => TransformType::Absolute,
            _ => TransformType::Linear,
        }
    }
}

/// One modulator record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modulator {
    pub source: ModulatorSource,
    pub destination: GeneratorType,
    pub amount: i16,
    pub amount_source: ModulatorSource,
    pub transform: TransformType,
}

impl Modulator {
    pub const fn new(
        source: u16,
        destination: GeneratorType,
        amount: i16,
        amount_source: u16,
        transform: TransformType,
    ) -> Self {
        Self {
            source: ModulatorSource::from_raw(source),
            destination,
            amount,
            amount_source: ModulatorSource::from_raw(amount_source),
            transform,
        }
    }

    /// SoundFont2 identity: same sources, destination and transform.
    /// Amounts may differ.
    pub fn is_identical(&self, other: &Modulator) -> bool {
        self.source == other.source
            && self.destination == other.destination
            && self.amount_source == other.amount_source
            && self.transform == other.transform
    }

    /// Whether either source reads the given controller.
    pub fn reads(&self, controller: SourceController) -> bool {
        self.source.controller() == controller || self.amount_source.controller() == controller
    }
}

/// Modulators every voice starts with (SF2 2.04 section 8.4).
pub const DEFAULT_MODULATORS: [Modulator; 10] = [
    // Velocity to attenuation, concave, max to min
    Modulator::new(0x0502, GeneratorType::InitialAttenuation, 960, 0, TransformType::Linear),
    // Velocity to filter cutoff, linear, max to min
    Modulator::new(0x0102, GeneratorType::InitialFilterFc, -2400, 0, TransformType::Linear),
    // Channel pressure to vibrato depth
    Modulator::new(0x000D, GeneratorType::VibLfoToPitch, 50, 0, TransformType::Linear),
    // Mod wheel to vibrato depth
    Modulator::new(0x0081, GeneratorType::VibLfoToPitch, 50, 0, TransformType::Linear),
    // Main volume to attenuation
    Modulator::new(0x0587, GeneratorType::InitialAttenuation, 960, 0, TransformType::Linear),
    // Pan, bipolar
    Modulator::new(0x028A, GeneratorType::Pan, 1000, 0, TransformType::Linear),
    // Expression to attenuation
    Modulator::new(0x058B, GeneratorType::InitialAttenuation, 960, 0, TransformType::Linear),
    Modulator::new(0x00DB, GeneratorType::ReverbEffectsSend, 200, 0, TransformType::Linear),
    Modulator::new(0x00DD, GeneratorType::ChorusEffectsSend, 200, 0, TransformType::Linear),
    // Pitch wheel to fine tune, scaled by the wheel range
    Modulator::new(0x020E, GeneratorType::FineTune, 12700, 0x0010, TransformType::Linear),
];
