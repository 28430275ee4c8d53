//! SoundFont2 parsing for sfsynth.
//!
//! Decodes the RIFF container into a preset catalog and the
//! preset → instrument → sample hierarchy, and resolves note-ons into
//! per-voice generator and modulator sets.
//!
//! ```ignore
//! use sfsynth_soundfont::SoundFont;
//!
//! let sf = SoundFont::load("piano.sf2")?;
//! let lookup = sf.get_preset(0, 0);
//! for voice in lookup.preset.voices(60, 100) {
//!     let pcm = sf.sample_data(voice.sample.id);
//! }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod chunk;
pub use chunk::{ChunkReader, RiffChunk};

pub mod generator;
pub use generator::{Generator, GeneratorLimits, GeneratorType, GeneratorValues};

pub mod modulator;
pub use modulator::{
    CurveType, Modulator, ModulatorSource, SourceController, TransformType, DEFAULT_MODULATORS,
};

pub mod sample;
pub use sample::{LoopMode, Sample};

pub mod zone;
pub use zone::{InstrumentZone, KeyRange, PresetZone, Zone};

pub mod instrument;
pub use instrument::Instrument;

pub mod preset;
pub use preset::{Preset, VoiceParams, PERCUSSION_BANK};

mod hydra;
pub use hydra::InfoEntry;

pub mod catalog;
pub use catalog::{Catalog, PresetLookup, Resolution};

mod soundfont;
pub use soundfont::SoundFont;

mod system;
pub use system::{SoundFontHandle, SoundFontSystem};
