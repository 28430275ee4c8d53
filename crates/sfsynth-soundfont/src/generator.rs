//! SoundFont2 generators (SF2 2.04 section 8.1).

use std::ops::{Index, IndexMut};

/// Generator operator ids, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum GeneratorType {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    EndOper = 60,
}

use GeneratorType as G;

const ALL: [GeneratorType; GeneratorType::COUNT] = [
    G::StartAddrsOffset,
    G::EndAddrsOffset,
    G::StartloopAddrsOffset,
    G::EndloopAddrsOffset,
    G::StartAddrsCoarseOffset,
    G::ModLfoToPitch,
    G::VibLfoToPitch,
    G::ModEnvToPitch,
    G::InitialFilterFc,
    G::InitialFilterQ,
    G::ModLfoToFilterFc,
    G::ModEnvToFilterFc,
    G::EndAddrsCoarseOffset,
    G::ModLfoToVolume,
    G::Unused1,
    G::ChorusEffectsSend,
    G::ReverbEffectsSend,
    G::Pan,
    G::Unused2,
    G::Unused3,
    G::Unused4,
    G::DelayModLfo,
    G::FreqModLfo,
    G::DelayVibLfo,
    G::FreqVibLfo,
    G::DelayModEnv,
    G::AttackModEnv,
    G::HoldModEnv,
    G::DecayModEnv,
    G::SustainModEnv,
    G::ReleaseModEnv,
    G::KeynumToModEnvHold,
    G::KeynumToModEnvDecay,
    G::DelayVolEnv,
    G::AttackVolEnv,
    G::HoldVolEnv,
    G::DecayVolEnv,
    G::SustainVolEnv,
    G::ReleaseVolEnv,
    G::KeynumToVolEnvHold,
    G::KeynumToVolEnvDecay,
    G::Instrument,
    G::Reserved1,
    G::KeyRange,
    G::VelRange,
    G::StartloopAddrsCoarseOffset,
    G::Keynum,
    G::Velocity,
    G::InitialAttenuation,
    G::Reserved2,
    G::EndloopAddrsCoarseOffset,
    G::CoarseTune,
    G::FineTune,
    G::SampleId,
    G::SampleModes,
    G::Reserved3,
    G::ScaleTuning,
    G::ExclusiveClass,
    G::OverridingRootKey,
    G::Unused5,
    G::EndOper,
];

/// Legal range and default of one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorLimits {
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

const fn lim(min: i32, max: i32, default: i32) -> GeneratorLimits {
    GeneratorLimits { min, max, default }
}

/// Non-numeric generators (ranges, indices, unused slots).
const OPAQUE: GeneratorLimits = lim(i16::MIN as i32, u16::MAX as i32, 0);
const OFFSET: GeneratorLimits = lim(-32768, 32768, 0);
const TO_PITCH: GeneratorLimits = lim(-12000, 12000, 0);
const DELAY: GeneratorLimits = lim(-12000, 5000, -12000);
const TIME: GeneratorLimits = lim(-12000, 8000, -12000);
const KEY_SCALE: GeneratorLimits = lim(-1200, 1200, 0);

const LIMITS: [GeneratorLimits; GeneratorType::COUNT] = [
    lim(0, 32768, 0), // startAddrsOffset
    OFFSET,
    OFFSET,
    OFFSET,
    lim(0, 32768, 0), // startAddrsCoarseOffset
    TO_PITCH,
    TO_PITCH,
    TO_PITCH,
    lim(1500, 13500, 13500), // initialFilterFc
    lim(0, 960, 0),          // initialFilterQ
    TO_PITCH,
    TO_PITCH,
    OFFSET,
    lim(-960, 960, 0), // modLfoToVolume
    OPAQUE,
    lim(0, 1000, 0), // chorus
    lim(0, 1000, 0), // reverb
    lim(-500, 500, 0), // pan
    OPAQUE,
    OPAQUE,
    OPAQUE,
    DELAY,
    lim(-16000, 4500, 0), // freqModLFO
    DELAY,
    lim(-16000, 4500, 0), // freqVibLFO
    DELAY,
    TIME,
    DELAY,
    TIME,
    lim(0, 1000, 0), // sustainModEnv
    TIME,
    KEY_SCALE,
    KEY_SCALE,
    DELAY,
    TIME,
    DELAY,
    TIME,
    lim(0, 1440, 0), // sustainVolEnv
    TIME,
    KEY_SCALE,
    KEY_SCALE,
    OPAQUE, // instrument
    OPAQUE,
    OPAQUE, // keyRange
    OPAQUE, // velRange
    OFFSET,
    lim(-1, 127, -1), // keynum
    lim(-1, 127, -1), // velocity
    lim(0, 1440, 0),  // initialAttenuation
    OPAQUE,
    OFFSET,
    lim(-120, 120, 0), // coarseTune
    lim(-12700, 12700, 0), // fineTune, wide enough for pitch wheel modulation
    OPAQUE,            // sampleID
    lim(0, 3, 0),      // sampleModes
    OPAQUE,
    lim(0, 1200, 100), // scaleTuning
    lim(0, 127, 0),    // exclusiveClass
    lim(-1, 127, -1),  // overridingRootKey
    OPAQUE,
    OPAQUE,
];

impl GeneratorType {
    pub const COUNT: usize = 61;

    /// Map a file operator id. Returns `None` for ids past `endOper`.
    pub fn from_u16(id: u16) -> Option<Self> {
        ALL.get(id as usize).copied()
    }

    pub fn all() -> impl Iterator<Item = GeneratorType> {
        ALL.iter().copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn limits(self) -> GeneratorLimits {
        LIMITS[self as usize]
    }

    #[inline]
    pub fn default_value(self) -> i32 {
        self.limits().default
    }

    /// Whether a preset-level value is added to the instrument-level one.
    ///
    /// Sample addressing, ranges, indices and per-sample switches only make
    /// sense on instrument zones and are ignored at preset level.
    pub fn is_preset_additive(self) -> bool {
        !matches!(
            self,
            G::StartAddrsOffset
                | G::EndAddrsOffset
                | G::StartloopAddrsOffset
                | G::EndloopAddrsOffset
                | G::StartAddrsCoarseOffset
                | G::EndAddrsCoarseOffset
                | G::StartloopAddrsCoarseOffset
                | G::EndloopAddrsCoarseOffset
                | G::Instrument
                | G::KeyRange
                | G::VelRange
                | G::Keynum
                | G::Velocity
                | G::SampleId
                | G::SampleModes
                | G::ExclusiveClass
                | G::OverridingRootKey
                | G::Unused1
                | G::Unused2
                | G::Unused3
                | G::Unused4
                | G::Unused5
                | G::Reserved1
                | G::Reserved2
                | G::Reserved3
                | G::EndOper
        )
    }
}

/// One parsed generator record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    pub ty: GeneratorType,
    pub amount: i16,
}

impl Generator {
    pub fn new(ty: GeneratorType, amount: i16) -> Self {
        Self { ty, amount }
    }

    /// Low/high byte pair, for `keyRange` and `velRange`.
    pub fn range(&self) -> (u8, u8) {
        let raw = self.amount as u16;
        ((raw & 0xFF) as u8, (raw >> 8) as u8)
    }
}

/// A value for every generator, indexed by [`GeneratorType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorValues {
    values: [i32; GeneratorType::COUNT],
}

impl GeneratorValues {
    /// Every generator at its SoundFont2 default.
    pub fn defaults() -> Self {
        let mut values = [0; GeneratorType::COUNT];
        for (value, limits) in values.iter_mut().zip(LIMITS.iter()) {
            *value = limits.default;
        }
        Self { values }
    }

    /// Every generator at zero, for accumulating offsets.
    pub fn zeroed() -> Self {
        Self {
            values: [0; GeneratorType::COUNT],
        }
    }

    #[inline]
    pub fn get(&self, ty: GeneratorType) -> i32 {
        self.values[ty as usize]
    }

    #[inline]
    pub fn set(&mut self, ty: GeneratorType, value: i32) {
        self.values[ty as usize] = value;
    }

    #[inline]
    pub fn add(&mut self, ty: GeneratorType, delta: i32) {
        self.values[ty as usize] += delta;
    }

    /// Overwrite with each generator in order, so later entries win.
    pub fn apply(&mut self, generators: &[Generator]) {
        for generator in generators {
            self.set(generator.ty, generator.amount as i32);
        }
    }

    /// Clamp every value to its generator's legal range.
    pub fn clamp_to_limits(&mut self) {
        for (value, limits) in self.values.iter_mut().zip(LIMITS.iter()) {
            *value = (*value).clamp(limits.min, limits.max);
        }
    }

    pub fn as_array(&self) -> &[i32; GeneratorType::COUNT] {
        &self.values
    }
}

impl Default for GeneratorValues {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Index<GeneratorType> for GeneratorValues {
    type Output = i32;

    fn index(&self, ty: GeneratorType) -> &i32 {
        &self.values[ty as usize]
    }
}

impl IndexMut<GeneratorType> for GeneratorValues {
    fn index_mut(&mut self, ty: GeneratorType) -> &mut i32 {
        &mut self.values[ty as usize]
    }
}
