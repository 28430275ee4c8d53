//! SynthEngine that coordinates the SoundFont registry and channel renderers

use crate::events::{EngineEvent, EventBus, SubscriptionId};
use crate::{Error, Result};
use dashmap::DashSet;
use sfsynth_core::{Arc, SynthConfig, UnitTables};
use sfsynth_render::{
    channel, ChannelCommand, ChannelEvent, ChannelHandle, ChannelRenderer, ChannelVibrato,
    VoiceDescriptor,
};
use sfsynth_soundfont::{SoundFont, SoundFontHandle, SoundFontSystem, PERCUSSION_BANK};
use std::path::Path;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use tracing::{debug, info};

/// MIDI channel that defaults to the percussion bank.
pub const PERCUSSION_CHANNEL: usize = 9;

/// Control-side state of one MIDI channel.
struct ChannelSlot {
    handle: ChannelHandle,
    bank: AtomicU16,
    program: AtomicU16,
    /// Sample ids already uploaded to the renderer
    uploaded: DashSet<usize>,
}

impl ChannelSlot {
    fn new(index: usize, handle: ChannelHandle) -> Self {
        let bank = if index == PERCUSSION_CHANNEL {
            PERCUSSION_BANK
        } else {
            0
        };
        Self {
            handle,
            bank: AtomicU16::new(bank),
            program: AtomicU16::new(0),
            uploaded: DashSet::new(),
        }
    }
}

/// SoundFont synthesizer with a fixed set of MIDI channels.
///
/// Control methods take `&self` and only enqueue messages. They are applied
/// at the start of the next [`SynthEngine::render`].
///
/// # Example
///
/// ```ignore
/// use sfsynth::prelude::*;
///
/// let mut engine = SynthEngine::builder()
///     .sample_rate(48000.0)
///     .soundfont_path("piano.sf2")
///     .build()?;
///
/// engine.note_on(0, 60, 100)?;
///
/// let mut left = vec![0.0; 512];
/// let mut right = vec![0.0; 512];
/// engine.render(&mut left, &mut right);
/// ```
pub struct SynthEngine {
    config: SynthConfig,
    tables: Arc<UnitTables>,
    soundfonts: SoundFontSystem,
    active: Option<(SoundFontHandle, Arc<SoundFont>)>,
    channels: Vec<ChannelSlot>,
    renderers: Vec<ChannelRenderer>,
    next_note_id: AtomicU64,
    events: EventBus,
}

impl SynthEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::SynthEngineBuilder {
        crate::SynthEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        config: SynthConfig,
        channel_count: usize,
        soundfonts: SoundFontSystem,
        active: Option<SoundFontHandle>,
    ) -> Result<Self> {
        let active = match active {
            Some(handle) => Some((handle, soundfonts.get(&handle).ok_or(Error::UnknownSoundFont)?)),
            None => None,
        };
        let sample_slots = active.as_ref().map_or(0, |(_, sf)| sf.samples().len());
        let tables = Arc::new(UnitTables::new());

        let mut channels = Vec::with_capacity(channel_count);
        let mut renderers = Vec::with_capacity(channel_count);
        for index in 0..channel_count {
            let (handle, renderer) = channel(&config, Arc::clone(&tables), sample_slots);
            channels.push(ChannelSlot::new(index, handle));
            renderers.push(renderer);
        }

        info!(
            "SynthEngine ready: {} channels at {} Hz, {} voices per channel",
            channel_count, config.sample_rate, config.voice_cap
        );

        Ok(Self {
            config,
            tables,
            soundfonts,
            active,
            channels,
            renderers,
            next_note_id: AtomicU64::new(0),
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn tables(&self) -> &Arc<UnitTables> {
        &self.tables
    }

    /// Every registered SoundFont, selected or not.
    pub fn soundfonts(&self) -> &SoundFontSystem {
        &self.soundfonts
    }

    /// The SoundFont note-ons are resolved against.
    pub fn soundfont(&self) -> Option<&Arc<SoundFont>> {
        self.active.as_ref().map(|(_, sf)| sf)
    }

    pub fn soundfont_handle(&self) -> Option<SoundFontHandle> {
        self.active.as_ref().map(|(handle, _)| *handle)
    }

    // =========================================================================
    // SoundFonts
    // =========================================================================

    /// Load (or reuse) a SoundFont file and select it.
    pub fn load_soundfont(&mut self, path: impl AsRef<Path>) -> Result<SoundFontHandle> {
        let handle = self.soundfonts.load(path)?;
        self.select_soundfont(handle)?;
        Ok(handle)
    }

    /// Register an already decoded SoundFont and select it.
    pub fn add_soundfont(&mut self, soundfont: SoundFont) -> Result<SoundFontHandle> {
        let handle = self.soundfonts.insert(soundfont);
        self.select_soundfont(handle)?;
        Ok(handle)
    }

    /// Switch the SoundFont used for new notes. Every channel is silenced and
    /// gets an empty sample table sized for the new SoundFont.
    pub fn select_soundfont(&mut self, handle: SoundFontHandle) -> Result<()> {
        if self.soundfont_handle() == Some(handle) {
            return Ok(());
        }
        let soundfont = self.soundfonts.get(&handle).ok_or(Error::UnknownSoundFont)?;

        self.collect_recycled();
        let slots = soundfont.samples().len();
        for slot in &self.channels {
            slot.handle.stop_all(true)?;
            slot.handle.clear_cache(slots)?;
            slot.uploaded.clear();
        }
        if let Some((_, previous)) = self.active.take() {
            previous.clear_sample_cache();
        }

        info!(
            "Selected SoundFont {} ({})",
            handle.id(),
            soundfont.name().unwrap_or("unnamed")
        );
        self.active = Some((handle, soundfont));
        Ok(())
    }

    // =========================================================================
    // Channel state
    // =========================================================================

    fn slot(&self, channel: usize) -> Result<&ChannelSlot> {
        self.channels.get(channel).ok_or(Error::UnknownChannel(channel))
    }

    pub fn program_change(&self, channel: usize, program: u8) -> Result<()> {
        self.slot(channel)?
            .program
            .store(program as u16, Ordering::Relaxed);
        Ok(())
    }

    pub fn bank_select(&self, channel: usize, bank: u16) -> Result<()> {
        self.slot(channel)?.bank.store(bank, Ordering::Relaxed);
        Ok(())
    }

    /// `(bank, program)` currently selected on a channel.
    pub fn preset_of(&self, channel: usize) -> Result<(u16, u16)> {
        let slot = self.slot(channel)?;
        Ok((
            slot.bank.load(Ordering::Relaxed),
            slot.program.load(Ordering::Relaxed),
        ))
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Resolve the channel's preset for `key`/`velocity` and start its voices.
    ///
    /// Returns the number of voices sent. Velocity 0 is a note-off. Without a
    /// selected SoundFont nothing plays.
    pub fn note_on(&self, channel: usize, key: u8, velocity: u8) -> Result<usize> {
        let slot = self.slot(channel)?;
        if velocity == 0 {
            slot.handle.note_off(key)?;
            return Ok(0);
        }
        let Some((_, soundfont)) = self.active.as_ref() else {
            debug!("note_on on channel {} with no SoundFont selected", channel);
            return Ok(0);
        };

        let bank = slot.bank.load(Ordering::Relaxed);
        let program = slot.program.load(Ordering::Relaxed);
        let lookup = soundfont.get_preset(bank, program);
        let params = lookup.preset.voices(key, velocity);
        let note_id = self.next_note_id.fetch_add(1, Ordering::Relaxed);

        let mut sent = 0;
        for voice in &params {
            let sample_id = voice.sample.id;
            if !slot.uploaded.contains(&sample_id) {
                let Some(data) = soundfont.sample_data(sample_id) else {
                    debug!("Sample {} missing from SoundFont, skipping voice", sample_id);
                    continue;
                };
                slot.handle.upload_sample(sample_id, data)?;
                slot.uploaded.insert(sample_id);
            }
            let descriptor = VoiceDescriptor::from_params(
                voice,
                key,
                velocity,
                self.config.sample_rate,
                note_id,
            );
            slot.handle.note_on(descriptor)?;
            sent += 1;
        }

        debug!(
            "note_on ch {} key {} vel {} -> \"{}\" ({} voices)",
            channel, key, velocity, lookup.preset.name, sent
        );
        Ok(sent)
    }

    pub fn note_off(&self, channel: usize, key: u8) -> Result<()> {
        Ok(self.slot(channel)?.handle.note_off(key)?)
    }

    /// Release `key` with a short fixed release.
    pub fn kill_note(&self, channel: usize, key: u8) -> Result<()> {
        Ok(self.slot(channel)?.handle.kill_note(key)?)
    }

    // =========================================================================
    // Controllers
    // =========================================================================

    /// MIDI control change. CC0 also selects the bank on melodic channels.
    pub fn controller_change(&self, channel: usize, controller: u8, value: u8) -> Result<()> {
        let slot = self.slot(channel)?;
        if controller == 0 && channel != PERCUSSION_CHANNEL {
            slot.bank.store(value as u16, Ordering::Relaxed);
        }
        Ok(slot.handle.controller_change(controller, value)?)
    }

    /// 14-bit pitch wheel, center 8192.
    pub fn pitch_wheel(&self, channel: usize, value: u16) -> Result<()> {
        Ok(self.slot(channel)?.handle.pitch_wheel(value)?)
    }

    pub fn channel_pressure(&self, channel: usize, value: u8) -> Result<()> {
        Ok(self.slot(channel)?.handle.channel_pressure(value)?)
    }

    pub fn poly_pressure(&self, channel: usize, value: u8) -> Result<()> {
        Ok(self
            .slot(channel)?
            .handle
            .send(ChannelCommand::PolyPressure(value))?)
    }

    pub fn set_channel_vibrato(&self, channel: usize, vibrato: ChannelVibrato) -> Result<()> {
        Ok(self.slot(channel)?.handle.set_channel_vibrato(vibrato)?)
    }

    /// Fine tuning in cents.
    pub fn set_tuning(&self, channel: usize, cents: i16) -> Result<()> {
        Ok(self.slot(channel)?.handle.set_tuning(cents)?)
    }

    pub fn set_transpose(&self, channel: usize, semitones: i8) -> Result<()> {
        Ok(self.slot(channel)?.handle.set_transpose(semitones)?)
    }

    pub fn reset_controllers(&self, channel: usize) -> Result<()> {
        Ok(self.slot(channel)?.handle.reset_controllers()?)
    }

    // =========================================================================
    // Whole engine
    // =========================================================================

    /// Stop every channel. `force` cuts voices without a release tail.
    pub fn stop_all(&self, force: bool) -> Result<()> {
        for slot in &self.channels {
            slot.handle.stop_all(force)?;
        }
        Ok(())
    }

    /// Drop uploaded samples on every channel and the SoundFont's decoded
    /// sample cache. Samples are uploaded again on the next note-on.
    pub fn clear_cache(&self) -> Result<()> {
        self.collect_recycled();
        let slots = self.soundfont().map_or(0, |sf| sf.samples().len());
        for slot in &self.channels {
            slot.handle.clear_cache(slots)?;
            slot.uploaded.clear();
        }
        if let Some((_, soundfont)) = self.active.as_ref() {
            soundfont.clear_sample_cache();
        }
        Ok(())
    }

    /// Render every channel and sum them into `left`/`right`. The buffers are
    /// overwritten.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        for renderer in &mut self.renderers {
            renderer.render(left, right);
        }
    }

    /// Audio-side state of one channel.
    pub fn renderer(&self, channel: usize) -> Option<&ChannelRenderer> {
        self.renderers.get(channel)
    }

    /// Total voices across all channels as of the last render.
    pub fn voice_count(&self) -> usize {
        self.renderers.iter().map(ChannelRenderer::voice_count).sum()
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drain channel notifications and dispatch them to subscribers. Returns
    /// the number of events dispatched.
    ///
    /// Sample data the renderers released is freed here as well.
    pub fn poll_events(&self) -> usize {
        self.collect_recycled();
        let mut dispatched = 0;
        for (index, slot) in self.channels.iter().enumerate() {
            for event in slot.handle.drain_events() {
                let event = match event {
                    ChannelEvent::VoiceCount(count) => EngineEvent::VoiceCount {
                        channel: index,
                        count,
                    },
                };
                self.events.dispatch(&event);
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Free sample data handed back by the renderers. Returns the number of
    /// items collected.
    pub fn collect_recycled(&self) -> usize {
        self.channels
            .iter()
            .map(|slot| slot.handle.collect_recycled())
            .sum()
    }
}

impl std::fmt::Debug for SynthEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthEngine")
            .field("config", &self.config)
            .field("channels", &self.channels.len())
            .field("soundfont", &self.soundfont_handle())
            .finish()
    }
}
