//! SoundFont registry.

use crate::error::Result;
use crate::soundfont::SoundFont;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Handle to a registered SoundFont
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundFontHandle(usize);

impl SoundFontHandle {
    /// Get the internal ID (for debugging/logging only)
    pub fn id(&self) -> usize {
        self.0
    }
}

/// Loaded SoundFonts, keyed by handle. Loading the same path twice returns
/// the existing handle.
#[derive(Debug, Default)]
pub struct SoundFontSystem {
    soundfonts: DashMap<usize, Arc<SoundFont>>,
    path_to_handle: DashMap<PathBuf, SoundFontHandle>,
    next_handle: AtomicUsize,
}

impl SoundFontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a SoundFont from file or return existing handle.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SoundFontHandle> {
        let path = path.as_ref().to_path_buf();

        if let Some(handle) = self.path_to_handle.get(&path) {
            return Ok(*handle);
        }

        // Decode outside any map guard
        let soundfont = SoundFont::load(&path)?;
        info!(
            "Loaded SoundFont {} ({} presets)",
            path.display(),
            soundfont.presets().len()
        );

        let handle = self.insert(soundfont);
        self.path_to_handle.insert(path, handle);
        Ok(handle)
    }

    /// Register an already decoded SoundFont.
    pub fn insert(&self, soundfont: SoundFont) -> SoundFontHandle {
        let handle = SoundFontHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.soundfonts.insert(handle.0, Arc::new(soundfont));
        handle
    }

    /// Get a SoundFont by handle
    pub fn get(&self, handle: &SoundFontHandle) -> Option<Arc<SoundFont>> {
        self.soundfonts
            .get(&handle.0)
            .map(|entry| entry.value().clone())
    }

    /// Unregister a SoundFont. Voices already playing keep their samples.
    pub fn remove(&self, handle: &SoundFontHandle) -> Option<Arc<SoundFont>> {
        self.path_to_handle.retain(|_, h| h != handle);
        self.soundfonts.remove(&handle.0).map(|(_, sf)| sf)
    }

    /// Get the number of loaded SoundFonts
    pub fn len(&self) -> usize {
        self.soundfonts.len()
    }

    /// Check if no SoundFonts are loaded
    pub fn is_empty(&self) -> bool {
        self.soundfonts.is_empty()
    }

    /// Get a list of all loaded SoundFont handles
    pub fn handles(&self) -> Vec<SoundFontHandle> {
        self.soundfonts
            .iter()
            .map(|entry| SoundFontHandle(*entry.key()))
            .collect()
    }
}
