//! # sfsynth
//!
//! SoundFont2 synthesizer: a bank parser plus a real-time per-voice renderer.
//!
//! ## Subsystems
//!
//! - **core** (`sfsynth-core`): engine configuration and unit conversion tables
//! - **soundfont** (`sfsynth-soundfont`): RIFF/SF2 decoding, preset catalog,
//!   note-on → voice resolution
//! - **render** (`sfsynth-render`): modulators, envelopes, LFOs, lowpass
//!   filter, wavetable oscillator and the per-channel voice pool
//!
//! [`SynthEngine`] ties them together: it owns one control handle and one
//! renderer per MIDI channel and turns MIDI-level calls into voice messages.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sfsynth::prelude::*;
//!
//! let mut engine = SynthEngine::builder()
//!     .soundfont_path("gm.sf2")
//!     .build()?;
//!
//! engine.program_change(0, 40)?;
//! engine.note_on(0, 64, 100)?;
//!
//! let mut left = vec![0.0; 256];
//! let mut right = vec![0.0; 256];
//! engine.render(&mut left, &mut right);
//! engine.note_off(0, 64)?;
//! ```
//!
//! ## Threading
//!
//! Control methods on [`SynthEngine`] only enqueue messages on bounded
//! queues. Renderers drain them at the start of each render call and never
//! allocate, lock or log while rendering. Hosts that need to render on a
//! dedicated audio thread can pair [`render::channel`] handles and renderers
//! themselves.

pub mod error;
pub use error::{Error, Result};

/// Configuration and unit tables
pub use sfsynth_core as core;

pub use sfsynth_core::{AttackCurve, Interpolation, SynthConfig, UnitTables};

/// SoundFont parsing
pub use sfsynth_soundfont as soundfont;

pub use sfsynth_soundfont::{
    Preset, PresetLookup, Resolution, SoundFont, SoundFontHandle, SoundFontSystem,
};

/// Voice rendering
pub use sfsynth_render as render;

pub use sfsynth_render::{ChannelHandle, ChannelRenderer, ChannelVibrato, VoiceDescriptor};

pub mod events;
pub use events::{EngineEvent, EventBus, SubscriptionId};

mod builder;
mod engine;

pub use builder::{SynthEngineBuilder, DEFAULT_CHANNELS};
pub use engine::{SynthEngine, PERCUSSION_CHANNEL};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{SynthEngine, SynthEngineBuilder};

    pub use crate::{AttackCurve, Interpolation, SynthConfig};

    pub use crate::{ChannelVibrato, EngineEvent, SoundFont, SoundFontHandle};

    pub use crate::{Error, Result};
}
