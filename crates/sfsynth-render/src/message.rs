//! Messages between the control context and a channel renderer.

use crate::lfo::ChannelVibrato;
use crate::voice::VoiceDescriptor;
use std::sync::Arc;

/// Uploaded sample data of one channel, indexed by sample id.
pub type SampleTable = Vec<Option<Arc<[f32]>>>;

/// Control → render. Drained at the start of each render call, in arrival
/// order.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    /// Start one voice. A multi-zone note-on sends one per zone, sharing a
    /// `note_id`.
    NoteOn(VoiceDescriptor),
    /// Release every active voice on `key`.
    NoteOff { key: u8 },
    /// Release every voice on `key` with a short release.
    KillNote { key: u8 },
    ControllerChange { controller: u8, value: u8 },
    /// 14-bit pitch wheel, center 8192.
    PitchWheel(u16),
    ChannelPressure(u8),
    PolyPressure(u8),
    /// Fine tuning in cents.
    SetTuning(i16),
    /// Transpose in semitones. Survives controller resets.
    SetTranspose(i8),
    SetChannelVibrato(ChannelVibrato),
    /// Store sample data in an existing slot. Ids past the table are
    /// ignored.
    UploadSample { id: usize, data: Arc<[f32]> },
    /// Swap in a sample table built on the control side. An empty-slot table
    /// clears the cache; a longer one makes room for a bigger SoundFont.
    ReplaceSamples(SampleTable),
    ResetControllers,
    /// `force` drops voices immediately, otherwise they are released.
    StopAll { force: bool },
}

/// Render → control notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Voice count after it changed.
    VoiceCount(usize),
}

/// Render → control handoff of sample data the renderer let go of, so the
/// last reference is dropped off the audio thread.
#[derive(Debug)]
pub enum Recycled {
    Table(SampleTable),
    Sample(Arc<[f32]>),
}
