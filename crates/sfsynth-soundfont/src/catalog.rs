//! Preset catalog with General MIDI fallback lookups.

use crate::error::{Error, Result};
use crate::preset::{Preset, PERCUSSION_BANK};
use tracing::{debug, warn};

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Bank and program (or name) matched.
    Exact,
    /// Same program in a melodic bank.
    MelodicProgram,
    /// Some percussion preset, program ignored.
    AnyPercussion,
    /// Nothing matched; the first preset was returned.
    NotFound,
}

/// Result of a catalog lookup. Always carries a preset.
#[derive(Debug, Clone, Copy)]
pub struct PresetLookup<'a> {
    pub preset: &'a Preset,
    pub resolution: Resolution,
}

impl PresetLookup<'_> {
    pub fn is_exact(&self) -> bool {
        self.resolution == Resolution::Exact
    }
}

/// Presets ordered by program, then bank.
#[derive(Debug, Clone)]
pub struct Catalog {
    presets: Vec<Preset>,
}

impl Catalog {
    /// Build a catalog. The sort is stable, so duplicates keep file order
    /// and the first one wins lookups.
    pub fn new(mut presets: Vec<Preset>) -> Result<Self> {
        if presets.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        presets.sort_by_key(|p| (p.program, p.bank));
        Ok(Self { presets })
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    fn find(&self, pred: impl Fn(&Preset) -> bool) -> Option<&Preset> {
        self.presets.iter().find(|p| pred(p))
    }

    fn first(&self) -> &Preset {
        // Non-empty by construction
        &self.presets[0]
    }

    /// Look up a preset by bank and program.
    pub fn get_preset(&self, bank: u16, program: u16) -> PresetLookup<'_> {
        if let Some(preset) = self.find(|p| p.bank == bank && p.program == program) {
            return PresetLookup {
                preset,
                resolution: Resolution::Exact,
            };
        }

        let fallback = if bank == PERCUSSION_BANK {
            self.find(|p| p.is_percussion()).map(|preset| PresetLookup {
                preset,
                resolution: Resolution::AnyPercussion,
            })
        } else {
            self.find(|p| p.program == program && !p.is_percussion()).map(|preset| PresetLookup {
                preset,
                resolution: Resolution::MelodicProgram,
            })
        };

        match fallback {
            Some(lookup) => {
                debug!(
                    "Preset {}:{} not found, using {}:{} \"{}\"",
                    bank, program, lookup.preset.bank, lookup.preset.program, lookup.preset.name
                );
                lookup
            }
            None => self.not_found(format!("bank {bank} program {program}")),
        }
    }

    /// Look up a preset by exact, case-sensitive name.
    pub fn get_preset_by_name(&self, name: &str) -> PresetLookup<'_> {
        match self.presets.iter().find(|p| p.name == name) {
            Some(preset) => PresetLookup {
                preset,
                resolution: Resolution::Exact,
            },
            None => self.not_found(format!("name \"{name}\"")),
        }
    }

    fn not_found(&self, query: String) -> PresetLookup<'_> {
        let preset = self.first();
        let diagnostic = Error::PresetNotFound { query };
        warn!("{}, falling back to \"{}\"", diagnostic, preset.name);
        PresetLookup {
            preset,
            resolution: Resolution::NotFound,
        }
    }
}
