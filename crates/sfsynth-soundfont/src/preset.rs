//! Presets and note-on voice resolution.

use crate::generator::{GeneratorType, GeneratorValues};
use crate::modulator::{Modulator, DEFAULT_MODULATORS};
use crate::sample::Sample;
use crate::zone::{split_global, PresetZone};
use std::sync::Arc;

/// Bank number reserved for percussion kits.
pub const PERCUSSION_BANK: u16 = 128;

#[derive(Debug, Clone)]
pub struct Preset {
    pub name: String,
    pub program: u16,
    pub bank: u16,
    pub library: u32,
    pub genre: u32,
    pub morphology: u32,
    /// Zones in file order. A global zone, if present, comes first.
    pub zones: Vec<PresetZone>,
}

/// Everything needed to start one voice: a sample, the merged generators
/// and the modulator list.
#[derive(Debug, Clone)]
pub struct VoiceParams {
    pub sample: Arc<Sample>,
    pub generators: GeneratorValues,
    pub modulators: Vec<Modulator>,
}

impl Preset {
    pub fn is_percussion(&self) -> bool {
        self.bank == PERCUSSION_BANK
    }

    pub fn global_zone(&self) -> Option<&PresetZone> {
        split_global(&self.zones).0
    }

    pub fn instrument_zones(&self) -> &[PresetZone] {
        split_global(&self.zones).1
    }

    /// Resolve a note into one [`VoiceParams`] per matching instrument zone.
    ///
    /// Instrument generators replace the defaults (global zone first, then
    /// the local zone). Preset generators are offsets added on top.
    /// Modulators start from the SoundFont2 defaults; identical
    /// instrument-level modulators replace them and identical preset-level
    /// modulators add their amounts.
    pub fn voices(&self, key: u8, velocity: u8) -> Vec<VoiceParams> {
        let preset_global = self.global_zone();
        let mut voices = Vec::new();

        for preset_zone in self.instrument_zones() {
            if !preset_zone.matches(key, velocity) {
                continue;
            }
            let Some(instrument) = preset_zone.reference.as_ref() else {
                continue;
            };

            let mut offsets = GeneratorValues::zeroed();
            if let Some(global) = preset_global {
                offsets.apply(&global.generators);
            }
            offsets.apply(&preset_zone.generators);

            let preset_mods = merge_local_over_global(
                preset_global.map(|z| z.modulators.as_slice()),
                &preset_zone.modulators,
            );

            let instrument_global = instrument.global_zone();
            for zone in instrument.sample_zones() {
                if !zone.matches(key, velocity) {
                    continue;
                }
                let Some(sample) = zone.reference.as_ref() else {
                    continue;
                };

                let mut generators = GeneratorValues::defaults();
                if let Some(global) = instrument_global {
                    generators.apply(&global.generators);
                }
                generators.apply(&zone.generators);
                for ty in GeneratorType::all().filter(|ty| ty.is_preset_additive()) {
                    generators.add(ty, offsets[ty]);
                }
                generators.clamp_to_limits();

                let mut modulators = DEFAULT_MODULATORS.to_vec();
                let instrument_mods = merge_local_over_global(
                    instrument_global.map(|z| z.modulators.as_slice()),
                    &zone.modulators,
                );
                for modulator in instrument_mods {
                    match modulators.iter_mut().find(|m| m.is_identical(&modulator)) {
                        Some(existing) => *existing = modulator,
                        None => modulators.push(modulator),
                    }
                }
                for modulator in &preset_mods {
                    match modulators.iter_mut().find(|m| m.is_identical(modulator)) {
                        Some(existing) => {
                            existing.amount = existing.amount.saturating_add(modulator.amount)
                        }
                        None => modulators.push(*modulator),
                    }
                }

                voices.push(VoiceParams {
                    sample: Arc::clone(sample),
                    generators,
                    modulators,
                });
            }
        }
        voices
    }
}

/// Global zone modulators, with identical local ones replacing them.
fn merge_local_over_global(global: Option<&[Modulator]>, local: &[Modulator]) -> Vec<Modulator> {
    let mut merged: Vec<Modulator> = global
        .unwrap_or_default()
        .iter()
        .filter(|g| !local.iter().any(|l| l.is_identical(g)))
        .copied()
        .collect();
    merged.extend_from_slice(local);
    merged
}
