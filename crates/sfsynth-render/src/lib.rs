//! Real-time rendering for sfsynth.
//!
//! Each MIDI channel is split in two:
//! - [`ChannelHandle`] on the control side sends [`ChannelCommand`]s through a
//!   bounded queue and receives [`ChannelEvent`]s.
//! - [`ChannelRenderer`] on the audio thread drains the queue at the start of
//!   every render call and mixes its voices into a stereo buffer.
//!
//! Per voice the pipeline is oscillator → lowpass → volume envelope → pan,
//! with modulators evaluated at control rate.
//!
//! ```ignore
//! use sfsynth_render::{channel, VoiceDescriptor};
//!
//! let (handle, mut renderer) = channel(&config, tables, soundfont.samples().len());
//! handle.upload_sample(id, soundfont.sample_data(id).unwrap())?;
//! handle.note_on(VoiceDescriptor::from_params(&params, 60, 100, 44100.0, 0))?;
//!
//! // Audio thread
//! renderer.render(&mut left, &mut right);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod controller;
pub use controller::{ControllerTable, CONTROLLER_TABLE_SIZE, NON_CC_INDEX_OFFSET};

pub mod modulation;
pub use modulation::{compute_modulated, ModulationInputs};

pub mod lfo;
pub use lfo::{lfo_value, ChannelVibrato};

pub mod envelope;
pub use envelope::{EnvelopeParams, EnvelopePhase, ModulationEnvelope};

pub mod volume_envelope;
pub use volume_envelope::VolumeEnvelope;

pub mod filter;
pub use filter::{lowpass_coeffs, Coeffs, LowpassFilter};

pub mod oscillator;
pub use oscillator::{SampleWindow, WavetableOscillator};

pub mod voice;
pub use voice::{RenderContext, Voice, VoiceDescriptor, VoiceModulators, VoiceState};

pub mod message;
pub use message::{ChannelCommand, ChannelEvent, Recycled, SampleTable};

mod handle;
pub use handle::ChannelHandle;

mod channel;
pub use channel::{channel, ChannelRenderer};
