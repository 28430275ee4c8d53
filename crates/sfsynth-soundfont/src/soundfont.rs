//! A decoded SoundFont2 bank.

use crate::catalog::{Catalog, PresetLookup};
use crate::error::Result;
use crate::hydra::{self, InfoEntry};
use crate::instrument::Instrument;
use crate::preset::Preset;
use crate::sample::Sample;
use dashmap::DashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A SoundFont2 bank: metadata, preset catalog, sample headers and the raw
/// PCM payload. Sample audio is converted to `f32` on first request and
/// cached until [`SoundFont::clear_sample_cache`].
#[derive(Debug)]
pub struct SoundFont {
    data: Vec<u8>,
    sample_data: Range<usize>,
    info: Vec<InfoEntry>,
    catalog: Catalog,
    instruments: Vec<Arc<Instrument>>,
    samples: Vec<Arc<Sample>>,
    sample_cache: DashMap<usize, Arc<[f32]>>,
}

impl SoundFont {
    /// Decode a bank held in memory. The buffer is kept for sample access.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let hydra = hydra::decode(&data)?;
        let catalog = Catalog::new(hydra.presets)?;
        Ok(Self {
            sample_data: hydra.sample_data,
            info: hydra.info,
            catalog,
            instruments: hydra.instruments,
            samples: hydra.samples,
            sample_cache: DashMap::new(),
            data,
        })
    }

    /// Read and decode a `.sf2` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(data)
    }

    /// `INFO` entries in file order.
    pub fn info(&self) -> &[InfoEntry] {
        &self.info
    }

    /// Bank name from the `INAM` entry.
    pub fn name(&self) -> Option<&str> {
        self.info
            .iter()
            .find(|entry| entry.tag.eq_ignore_ascii_case("INAM"))
            .map(|entry| entry.text.as_str())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn presets(&self) -> &[Preset] {
        self.catalog.presets()
    }

    pub fn get_preset(&self, bank: u16, program: u16) -> PresetLookup<'_> {
        self.catalog.get_preset(bank, program)
    }

    pub fn get_preset_by_name(&self, name: &str) -> PresetLookup<'_> {
        self.catalog.get_preset_by_name(name)
    }

    pub fn instruments(&self) -> &[Arc<Instrument>] {
        &self.instruments
    }

    pub fn samples(&self) -> &[Arc<Sample>] {
        &self.samples
    }

    pub fn sample(&self, id: usize) -> Option<&Arc<Sample>> {
        self.samples.get(id)
    }

    /// Number of 16-bit frames in the `smpl` payload.
    pub fn sample_frames(&self) -> usize {
        self.sample_data.len() / 2
    }

    /// PCM for one sample as `f32` in `-1.0..1.0`, from its start frame to
    /// its end frame. The end is clamped to the payload.
    pub fn sample_data(&self, id: usize) -> Option<Arc<[f32]>> {
        if let Some(cached) = self.sample_cache.get(&id) {
            return Some(Arc::clone(cached.value()));
        }

        let sample = self.samples.get(id)?;
        let frames = self.sample_frames();
        let end = (sample.end as usize).min(frames);
        let start = (sample.start as usize).min(end);

        let pcm = &self.data[self.sample_data.clone()];
        let audio: Arc<[f32]> = pcm[start * 2..end * 2]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();

        debug!("Materialized sample {} \"{}\" ({} frames)", id, sample.name, audio.len());
        self.sample_cache.insert(id, Arc::clone(&audio));
        Some(audio)
    }

    /// Drop every cached sample buffer. Buffers still held elsewhere stay
    /// alive until released.
    pub fn clear_sample_cache(&self) {
        self.sample_cache.clear();
    }

    pub fn cached_samples(&self) -> usize {
        self.sample_cache.len()
    }
}
