//! Control-side handle to one channel renderer.

use crate::error::{Error, Result};
use crate::lfo::ChannelVibrato;
use crate::message::{ChannelCommand, ChannelEvent, Recycled, SampleTable};
use crate::voice::VoiceDescriptor;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use tracing::warn;

/// Sends commands to a [`ChannelRenderer`](crate::ChannelRenderer) and
/// receives its notifications. Cheap to clone.
///
/// Sends never block: a full queue returns [`Error::ChannelFull`] and the
/// command is dropped.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    commands: Sender<ChannelCommand>,
    events: Receiver<ChannelEvent>,
    recycled: Receiver<Recycled>,
}

impl ChannelHandle {
    pub(crate) fn new(
        commands: Sender<ChannelCommand>,
        events: Receiver<ChannelEvent>,
        recycled: Receiver<Recycled>,
    ) -> Self {
        Self {
            commands,
            events,
            recycled,
        }
    }

    pub fn send(&self, command: ChannelCommand) -> Result<()> {
        match self.commands.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(command)) => {
                warn!("Channel queue full, dropping {:?}", CommandKind(&command));
                Err(Error::ChannelFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::ChannelClosed),
        }
    }

    pub fn note_on(&self, voice: VoiceDescriptor) -> Result<()> {
        self.send(ChannelCommand::NoteOn(voice))
    }

    pub fn note_off(&self, key: u8) -> Result<()> {
        self.send(ChannelCommand::NoteOff { key })
    }

    pub fn kill_note(&self, key: u8) -> Result<()> {
        self.send(ChannelCommand::KillNote { key })
    }

    pub fn controller_change(&self, controller: u8, value: u8) -> Result<()> {
        self.send(ChannelCommand::ControllerChange { controller, value })
    }

    pub fn pitch_wheel(&self, value: u16) -> Result<()> {
        self.send(ChannelCommand::PitchWheel(value))
    }

    pub fn channel_pressure(&self, value: u8) -> Result<()> {
        self.send(ChannelCommand::ChannelPressure(value))
    }

    pub fn set_tuning(&self, cents: i16) -> Result<()> {
        self.send(ChannelCommand::SetTuning(cents))
    }

    pub fn set_transpose(&self, semitones: i8) -> Result<()> {
        self.send(ChannelCommand::SetTranspose(semitones))
    }

    pub fn set_channel_vibrato(&self, vibrato: ChannelVibrato) -> Result<()> {
        self.send(ChannelCommand::SetChannelVibrato(vibrato))
    }

    pub fn upload_sample(&self, id: usize, data: Arc<[f32]>) -> Result<()> {
        self.send(ChannelCommand::UploadSample { id, data })
    }

    /// Replace the renderer's sample table with one of `slots` empty slots.
    pub fn clear_cache(&self, slots: usize) -> Result<()> {
        self.replace_samples(vec![None; slots])
    }

    pub fn replace_samples(&self, table: SampleTable) -> Result<()> {
        self.send(ChannelCommand::ReplaceSamples(table))
    }

    pub fn reset_controllers(&self) -> Result<()> {
        self.send(ChannelCommand::ResetControllers)
    }

    pub fn stop_all(&self, force: bool) -> Result<()> {
        self.send(ChannelCommand::StopAll { force })
    }

    /// Next pending notification, if any.
    pub fn try_recv_event(&self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    /// Drain every pending notification.
    pub fn drain_events(&self) -> impl Iterator<Item = ChannelEvent> + '_ {
        self.events.try_iter()
    }

    /// Drop sample data the renderer handed back. Returns how many items were
    /// collected.
    pub fn collect_recycled(&self) -> usize {
        self.recycled.try_iter().count()
    }
}

/// Logs a command without dumping sample data.
struct CommandKind<'a>(&'a ChannelCommand);

impl std::fmt::Debug for CommandKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ChannelCommand::NoteOn(voice) => write!(f, "NoteOn(key {})", voice.key),
            ChannelCommand::UploadSample { id, data } => {
                write!(f, "UploadSample({id}, {} frames)", data.len())
            }
            ChannelCommand::ReplaceSamples(table) => {
                write!(f, "ReplaceSamples({} slots)", table.len())
            }
            other => write!(f, "{other:?}"),
        }
    }
}
