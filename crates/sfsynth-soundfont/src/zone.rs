//! Zones: key/velocity-scoped generator and modulator sets.

use crate::generator::{Generator, GeneratorType};
use crate::instrument::Instrument;
use crate::modulator::Modulator;
use crate::sample::Sample;
use std::sync::Arc;

/// Inclusive MIDI key or velocity range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub low: u8,
    pub high: u8,
}

impl KeyRange {
    pub const FULL: Self = Self { low: 0, high: 127 };

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A zone referencing `R`. Zones without a reference are global zones.
#[derive(Debug, Clone)]
pub struct Zone<R> {
    pub generators: Vec<Generator>,
    pub modulators: Vec<Modulator>,
    pub key_range: KeyRange,
    pub velocity_range: KeyRange,
    pub reference: Option<Arc<R>>,
}

pub type InstrumentZone = Zone<Sample>;
pub type PresetZone = Zone<Instrument>;

impl<R> Zone<R> {
    pub fn is_global(&self) -> bool {
        self.reference.is_none()
    }

    #[inline]
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.key_range.contains(key) && self.velocity_range.contains(velocity)
    }

    /// Last value of a generator in this zone.
    pub fn generator(&self, ty: GeneratorType) -> Option<i16> {
        self.generators
            .iter()
            .rev()
            .find(|g| g.ty == ty)
            .map(|g| g.amount)
    }
}

impl<R> Default for Zone<R> {
    fn default() -> Self {
        Self {
            generators: Vec::new(),
            modulators: Vec::new(),
            key_range: KeyRange::FULL,
            velocity_range: KeyRange::FULL,
            reference: None,
        }
    }
}

/// Split off the leading global zone, if any.
pub(crate) fn split_global<R>(zones: &[Zone<R>]) -> (Option<&Zone<R>>, &[Zone<R>]) {
    match zones.split_first() {
        Some((first, rest)) if first.is_global() => (Some(first), rest),
        _ => (None, zones),
    }
}
