//! Channel renderer: the voice pool of one MIDI channel.
//!
//! The renderer lives on the audio thread. It owns its voices, controller
//! table and uploaded samples, and only hears from the control side through
//! the command queue drained at the start of each [`ChannelRenderer::render`].
//!
//! # RT Safety
//!
//! Voice storage and the scratch buffer are sized when the channel is
//! created. Sample tables are built on the control side and swapped in with
//! [`ChannelCommand::ReplaceSamples`]; sample data the renderer lets go of
//! goes back through the recycle queue and is freed by
//! [`ChannelHandle::collect_recycled`]. Rendering does not allocate, lock or
//! log.

use crate::controller::{cc, ControllerTable};
use crate::handle::ChannelHandle;
use crate::lfo::ChannelVibrato;
use crate::message::{ChannelCommand, ChannelEvent, Recycled, SampleTable};
use crate::voice::{
    RenderContext, Voice, VoiceDescriptor, EXCLUSIVE_RELEASE_TIMECENTS, KILL_RELEASE_TIMECENTS,
};
use crossbeam_channel::{Receiver, Sender};
use sfsynth_core::{AttackCurve, Interpolation, SynthConfig, UnitTables};
use sfsynth_soundfont::SourceController;
use std::sync::Arc;

/// Create a channel: the control-side handle and the audio-side renderer.
///
/// `sample_slots` sizes the uploaded-sample table, normally to the
/// soundfont's sample count. Uploads past it are ignored until a larger table
/// arrives through [`ChannelHandle::replace_samples`].
pub fn channel(
    config: &SynthConfig,
    tables: Arc<UnitTables>,
    sample_slots: usize,
) -> (ChannelHandle, ChannelRenderer) {
    let capacity = config.message_capacity.max(1);
    let (command_tx, command_rx) = crossbeam_channel::bounded(capacity);
    let (event_tx, event_rx) = crossbeam_channel::bounded(capacity);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(capacity);

    let renderer = ChannelRenderer {
        tables,
        sample_rate: config.sample_rate,
        block_size: config.block_size.max(1),
        voice_cap: config.voice_cap.max(1),
        interpolation: config.interpolation,
        attack_curve: config.attack_curve,
        controllers: ControllerTable::new(),
        vibrato: ChannelVibrato::default(),
        voices: Vec::with_capacity(config.voice_cap.max(1) + 1),
        samples: vec![None; sample_slots],
        scratch: vec![0.0; config.block_size.max(1)],
        commands: command_rx,
        events: event_tx,
        recycle: recycle_tx,
        current_time: 0.0,
        reported_voices: 0,
    };
    (ChannelHandle::new(command_tx, event_rx, recycle_rx), renderer)
}

/// Audio-side voice pool for one channel.
pub struct ChannelRenderer {
    tables: Arc<UnitTables>,
    sample_rate: f64,
    block_size: usize,
    voice_cap: usize,
    interpolation: Interpolation,
    attack_curve: AttackCurve,
    controllers: ControllerTable,
    vibrato: ChannelVibrato,
    voices: Vec<Voice>,
    samples: SampleTable,
    scratch: Vec<f32>,
    commands: Receiver<ChannelCommand>,
    events: Sender<ChannelEvent>,
    recycle: Sender<Recycled>,
    current_time: f64,
    reported_voices: usize,
}

impl ChannelRenderer {
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn controllers(&self) -> &ControllerTable {
        &self.controllers
    }

    pub fn channel_vibrato(&self) -> &ChannelVibrato {
        &self.vibrato
    }

    /// Seconds rendered so far.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn has_sample(&self, id: usize) -> bool {
        matches!(self.samples.get(id), Some(Some(_)))
    }

    /// Length of the sample table.
    pub fn sample_slots(&self) -> usize {
        self.samples.len()
    }

    /// Drain pending commands, then add `min(left.len(), right.len())` frames
    /// of audio into the buffers. The buffers are not cleared first.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_commands();

        let frames = left.len().min(right.len());
        let mut offset = 0;
        while offset < frames {
            let len = (frames - offset).min(self.block_size);
            self.render_block(
                &mut left[offset..offset + len],
                &mut right[offset..offset + len],
            );
            offset += len;
        }
        self.report_voice_count();
    }

    /// Apply every queued command.
    pub fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
        self.report_voice_count();
    }

    /// Apply one command immediately.
    pub fn apply(&mut self, command: ChannelCommand) {
        match command {
            ChannelCommand::NoteOn(voice) => self.note_on(voice),
            ChannelCommand::NoteOff { key } => self.note_off(key),
            ChannelCommand::KillNote { key } => self.kill_note(key),
            ChannelCommand::ControllerChange { controller, value } => {
                self.controller_change(controller, value)
            }
            ChannelCommand::PitchWheel(value) => {
                self.controllers.set_pitch_wheel(value);
                self.recompute(Some(SourceController::PitchWheel));
            }
            ChannelCommand::ChannelPressure(value) => {
                self.controllers.set_channel_pressure(value);
                self.recompute(Some(SourceController::ChannelPressure));
            }
            ChannelCommand::PolyPressure(value) => {
                self.controllers.set_poly_pressure(value);
                self.recompute(Some(SourceController::PolyPressure));
            }
            ChannelCommand::SetTuning(cents) => self.controllers.set_tuning(cents),
            ChannelCommand::SetTranspose(semitones) => self.controllers.set_transpose(semitones),
            ChannelCommand::SetChannelVibrato(vibrato) => self.vibrato = vibrato,
            ChannelCommand::UploadSample { id, data } => {
                let released = match self.samples.get_mut(id) {
                    Some(slot) => slot.replace(data),
                    None => Some(data),
                };
                if let Some(data) = released {
                    self.recycle(Recycled::Sample(data));
                }
            }
            ChannelCommand::ReplaceSamples(table) => {
                let previous = std::mem::replace(&mut self.samples, table);
                self.recycle(Recycled::Table(previous));
            }
            ChannelCommand::ResetControllers => self.reset_controllers(),
            ChannelCommand::StopAll { force } => self.stop_all(force),
        }
    }

    fn note_on(&mut self, descriptor: VoiceDescriptor) {
        let now = self.current_time;

        let class = descriptor.exclusive_class();
        if class != 0 {
            for voice in self.voices.iter_mut() {
                if voice.exclusive_class() == class
                    && voice.note_id() != descriptor.note_id
                    && !voice.is_releasing()
                {
                    voice.release_with(now, EXCLUSIVE_RELEASE_TIMECENTS, &self.controllers);
                }
            }
        }

        let voice = Voice::new(descriptor, now, &self.controllers, self.attack_curve);
        self.voices.push(voice);

        // Hard drop of the oldest voices
        if self.voices.len() > self.voice_cap {
            let excess = self.voices.len() - self.voice_cap;
            self.voices.drain(..excess);
        }
    }

    fn note_off(&mut self, key: u8) {
        let now = self.current_time;
        for voice in self.voices.iter_mut().filter(|v| v.key() == key) {
            voice.release(now);
        }
    }

    fn kill_note(&mut self, key: u8) {
        let now = self.current_time;
        for voice in self.voices.iter_mut().filter(|v| v.key() == key) {
            voice.release_with(now, KILL_RELEASE_TIMECENTS, &self.controllers);
        }
    }

    fn controller_change(&mut self, controller: u8, value: u8) {
        match controller {
            cc::ALL_SOUND_OFF => self.stop_all(true),
            cc::ALL_NOTES_OFF => self.stop_all(false),
            cc::RESET_ALL_CONTROLLERS => self.reset_controllers(),
            cc::DATA_ENTRY if self.controllers.pitch_range_rpn_selected() => {
                self.controllers.set_cc(controller, value);
                self.controllers.set_pitch_wheel_range(value);
                self.recompute(Some(SourceController::PitchWheelRange));
            }
            _ => {
                self.controllers.set_cc(controller, value);
                self.recompute(Some(SourceController::Cc(controller)));
            }
        }
    }

    fn reset_controllers(&mut self) {
        self.controllers.reset();
        self.recompute(None);
    }

    /// Recompute modulators of voices reading `controller`, or of every
    /// voice when `None`.
    fn recompute(&mut self, controller: Option<SourceController>) {
        for voice in self.voices.iter_mut() {
            if controller.map_or(true, |c| voice.reads(c)) {
                voice.update_modulators(&self.controllers);
            }
        }
    }

    /// Clear every voice (`force`) or release the ones still active.
    pub fn stop_all(&mut self, force: bool) {
        if force {
            self.voices.clear();
            return;
        }
        let now = self.current_time;
        for voice in self.voices.iter_mut() {
            voice.release(now);
        }
    }

    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len();
        let ctx = RenderContext {
            tables: &self.tables,
            controllers: &self.controllers,
            vibrato: &self.vibrato,
            interpolation: self.interpolation,
            sample_rate: self.sample_rate as f32,
            sample_time: 1.0 / self.sample_rate,
            now: self.current_time,
        };

        let samples = &self.samples;
        let scratch = &mut self.scratch[..len];
        self.voices.retain_mut(|voice| {
            let data = samples.get(voice.sample_id()).and_then(|slot| slot.as_deref());
            voice.render(&ctx, data, scratch, left, right);
            !voice.is_finished()
        });

        self.current_time += len as f64 / self.sample_rate;
    }

    fn recycle(&self, item: Recycled) {
        // Only freed here if the control side stopped collecting
        let _ = self.recycle.try_send(item);
    }

    fn report_voice_count(&mut self) {
        let count = self.voices.len();
        if count != self.reported_voices {
            self.reported_voices = count;
            // Dropped if the control side is not keeping up
            let _ = self.events.try_send(ChannelEvent::VoiceCount(count));
        }
    }
}
