//! Voices: what a note-on sends to the renderer and the per-voice render
//! pipeline (oscillator, lowpass, volume envelope, pan).

use crate::controller::ControllerTable;
use crate::envelope::{seconds, EnvelopeParams, ModulationEnvelope};
use crate::filter::LowpassFilter;
use crate::lfo::{lfo_value, ChannelVibrato};
use crate::modulation::{compute_modulated, ModulationInputs};
use crate::oscillator::{SampleWindow, WavetableOscillator};
use crate::volume_envelope::VolumeEnvelope;
use sfsynth_core::{AttackCurve, Interpolation, UnitTables};
use sfsynth_soundfont::{
    GeneratorType as G, GeneratorValues, LoopMode, Modulator, SourceController, VoiceParams,
};
use smallvec::SmallVec;
use std::f32::consts::FRAC_PI_2;

/// Release time applied by a kill, in timecents (about 16 ms).
pub const KILL_RELEASE_TIMECENTS: i32 = -7200;

/// Release time applied to voices cut off by an exclusive class, in
/// timecents (about 31 ms).
pub const EXCLUSIVE_RELEASE_TIMECENTS: i32 = -6000;

/// Delay plus attack below this many timecents starts at full level.
const INSTANT_ATTACK_TIMECENTS: i32 = -22000;

/// Frames per coarse address offset unit.
const COARSE_OFFSET: i64 = 32768;

/// Modulators stored inline per voice.
pub type VoiceModulators = SmallVec<[Modulator; 16]>;

/// Everything the renderer needs to start one voice. Built on the control
/// side so the render context never touches the soundfont.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceDescriptor {
    pub sample_id: usize,
    /// Base generators before modulation.
    pub generators: GeneratorValues,
    pub modulators: VoiceModulators,
    /// MIDI key that triggered the voice (matched by note-off and kill).
    pub key: u8,
    /// Velocity seen by modulators.
    pub velocity: u8,
    /// Key used for pitch and key scaling.
    pub target_key: u8,
    pub root_key: u8,
    /// Sample pitch correction in cents.
    pub pitch_correction: i8,
    /// Sample rate relative to the render rate.
    pub playback_step: f64,
    pub window: SampleWindow,
    /// Channel time in seconds; `None` starts at the current block.
    pub start_time: Option<f64>,
    /// Voices of one note-on share an id.
    pub note_id: u64,
}

impl VoiceDescriptor {
    /// Build a descriptor from resolved zone parameters.
    pub fn from_params(
        params: &VoiceParams,
        key: u8,
        velocity: u8,
        output_rate: f64,
        note_id: u64,
    ) -> Self {
        let g = &params.generators;
        let sample = &params.sample;

        let target_key = override_or(g[G::Keynum], key);
        let velocity = override_or(g[G::Velocity], velocity);
        let root_key = match g[G::OverridingRootKey] {
            k @ 0..=127 => k as u8,
            // 255 marks an unpitched sample
            _ if sample.original_pitch > 127 => 60,
            _ => sample.original_pitch,
        };

        let playback_step = if sample.sample_rate > 0 && output_rate > 0.0 {
            sample.sample_rate as f64 / output_rate
        } else {
            1.0
        };

        Self {
            sample_id: sample.id,
            generators: *g,
            modulators: params.modulators.iter().copied().collect(),
            key,
            velocity,
            target_key,
            root_key,
            pitch_correction: sample.pitch_correction,
            playback_step,
            window: sample_window(g, sample.len(), sample.relative_loop()),
            start_time: None,
            note_id,
        }
    }

    pub fn with_start_time(mut self, seconds: f64) -> Self {
        self.start_time = Some(seconds);
        self
    }

    pub fn exclusive_class(&self) -> i32 {
        self.generators[G::ExclusiveClass]
    }
}

fn override_or(value: i32, fallback: u8) -> u8 {
    match value {
        0..=127 => value as u8,
        _ => fallback,
    }
}

/// Apply the address offset generators to a sample of `len` frames.
fn sample_window(g: &GeneratorValues, len: usize, relative_loop: (u32, u32)) -> SampleWindow {
    let len = len as i64;
    let offset = |fine: G, coarse: G| g[fine] as i64 + COARSE_OFFSET * g[coarse] as i64;

    let start = offset(G::StartAddrsOffset, G::StartAddrsCoarseOffset).clamp(0, len);
    let end = (len + offset(G::EndAddrsOffset, G::EndAddrsCoarseOffset)).clamp(start, len);
    let loop_start = (relative_loop.0 as i64
        + offset(G::StartloopAddrsOffset, G::StartloopAddrsCoarseOffset))
    .clamp(0, len);
    let loop_end = (relative_loop.1 as i64
        + offset(G::EndloopAddrsOffset, G::EndloopAddrsCoarseOffset))
    .clamp(0, len);

    let loop_mode = match LoopMode::from_generator(g[G::SampleModes]) {
        _ if loop_end <= loop_start => LoopMode::NoLoop,
        mode => mode,
    };

    SampleWindow {
        start: start as usize,
        end: end as usize,
        loop_start: loop_start as usize,
        loop_end: loop_end as usize,
        loop_mode,
    }
}

/// Lifecycle of a voice in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Active,
    Releasing,
    Finished,
}

/// Channel-wide values a voice reads while rendering one block.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub tables: &'a UnitTables,
    pub controllers: &'a ControllerTable,
    pub vibrato: &'a ChannelVibrato,
    pub interpolation: Interpolation,
    pub sample_rate: f32,
    pub sample_time: f64,
    /// Channel time of the block's first frame, in seconds.
    pub now: f64,
}

/// One sounding voice.
#[derive(Debug, Clone)]
pub struct Voice {
    sample_id: usize,
    generators: GeneratorValues,
    modulators: VoiceModulators,
    modulated: GeneratorValues,
    key: u8,
    velocity: u8,
    target_key: u8,
    root_key: u8,
    pitch_correction: i8,
    playback_step: f64,
    note_id: u64,
    start_time: f64,
    state: VoiceState,
    oscillator: WavetableOscillator,
    volume_envelope: VolumeEnvelope,
    modulation_envelope: ModulationEnvelope,
    filter: LowpassFilter,
    tuning_cents: i32,
    tuning_ratio: f64,
}

impl Voice {
    pub fn new(
        descriptor: VoiceDescriptor,
        now: f64,
        controllers: &ControllerTable,
        attack_curve: AttackCurve,
    ) -> Self {
        let modulated = compute_modulated(
            &descriptor.generators,
            &descriptor.modulators,
            &ModulationInputs {
                controllers,
                key: descriptor.target_key,
                velocity: descriptor.velocity,
            },
        );

        let mut volume_envelope = VolumeEnvelope::new(attack_curve);
        if modulated[G::DelayVolEnv] + modulated[G::AttackVolEnv] < INSTANT_ATTACK_TIMECENTS {
            volume_envelope = volume_envelope
                .with_instant_attack(modulated[G::InitialAttenuation] as f32 / 25.0);
        }

        Self {
            sample_id: descriptor.sample_id,
            generators: descriptor.generators,
            modulators: descriptor.modulators,
            modulated,
            key: descriptor.key,
            velocity: descriptor.velocity,
            target_key: descriptor.target_key,
            root_key: descriptor.root_key,
            pitch_correction: descriptor.pitch_correction,
            playback_step: descriptor.playback_step,
            note_id: descriptor.note_id,
            start_time: descriptor.start_time.unwrap_or(now),
            state: VoiceState::Active,
            oscillator: WavetableOscillator::new(descriptor.window),
            volume_envelope,
            modulation_envelope: ModulationEnvelope::new(),
            filter: LowpassFilter::new(),
            tuning_cents: 0,
            tuning_ratio: 1.0,
        }
    }

    pub fn sample_id(&self) -> usize {
        self.sample_id
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    pub fn note_id(&self) -> u64 {
        self.note_id
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_releasing(&self) -> bool {
        self.state != VoiceState::Active
    }

    pub fn is_finished(&self) -> bool {
        self.state == VoiceState::Finished
    }

    pub fn exclusive_class(&self) -> i32 {
        self.generators[G::ExclusiveClass]
    }

    /// Effective generators after modulation.
    pub fn modulated(&self) -> &GeneratorValues {
        &self.modulated
    }

    pub fn volume_envelope(&self) -> &VolumeEnvelope {
        &self.volume_envelope
    }

    pub fn cursor(&self) -> f64 {
        self.oscillator.cursor()
    }

    /// Whether any of this voice's modulators read `controller`.
    pub fn reads(&self, controller: SourceController) -> bool {
        self.modulators.iter().any(|m| m.reads(controller))
    }

    pub fn update_modulators(&mut self, controllers: &ControllerTable) {
        self.modulated = compute_modulated(
            &self.generators,
            &self.modulators,
            &ModulationInputs {
                controllers,
                key: self.target_key,
                velocity: self.velocity,
            },
        );
    }

    /// Enter the release phase at channel time `now`.
    pub fn release(&mut self, now: f64) {
        if self.is_releasing() {
            return;
        }
        let elapsed = (now - self.start_time).max(0.0);
        self.volume_envelope.release(elapsed);
        self.modulation_envelope.release(elapsed);
        self.state = VoiceState::Releasing;
    }

    /// Override the release time, then release.
    pub fn release_with(&mut self, now: f64, release_timecents: i32, controllers: &ControllerTable) {
        self.generators.set(G::ReleaseVolEnv, release_timecents);
        self.update_modulators(controllers);
        self.release(now);
    }

    /// Drop the voice without a release tail.
    pub fn finish(&mut self) {
        self.state = VoiceState::Finished;
    }

    /// Render one block and add it into `left`/`right`. `data` is `None`
    /// when the sample was never uploaded, which finishes the voice.
    pub fn render(
        &mut self,
        ctx: &RenderContext<'_>,
        data: Option<&[f32]>,
        scratch: &mut [f32],
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let Some(data) = data else {
            self.finish();
            return;
        };
        if self.is_finished() {
            return;
        }
        let elapsed = ctx.now - self.start_time;
        if elapsed < 0.0 {
            return;
        }

        let m = self.modulated;
        let tables = ctx.tables;
        let now = ctx.now;

        let mut cents = (m[G::FineTune]
            + ctx.controllers.tuning() as i32
            + ctx.controllers.transpose() as i32
            + self.pitch_correction as i32
            + (self.target_key as i32 - self.root_key as i32) * m[G::ScaleTuning])
            as f32;
        let mut cutoff = m[G::InitialFilterFc] as f32;
        let mut offset_db = 0.0;

        // Negative depths are legal and invert the LFO
        if m[G::VibLfoToPitch] != 0 {
            let start = self.start_time + seconds(tables, m[G::DelayVibLfo]);
            let freq = tables.abs_cents_to_hz(m[G::FreqVibLfo] as f32);
            cents += lfo_value(start, freq, now) * m[G::VibLfoToPitch] as f32;
        }

        let mod_lfo_routed =
            m[G::ModLfoToPitch] != 0 || m[G::ModLfoToVolume] != 0 || m[G::ModLfoToFilterFc] != 0;
        if mod_lfo_routed {
            let start = self.start_time + seconds(tables, m[G::DelayModLfo]);
            let freq = tables.abs_cents_to_hz(m[G::FreqModLfo] as f32);
            let value = lfo_value(start, freq, now);
            cents += value * m[G::ModLfoToPitch] as f32;
            cutoff += value * m[G::ModLfoToFilterFc] as f32;
            // Centibels to decibels
            offset_db = value * m[G::ModLfoToVolume] as f32 / 10.0;
        }

        cents += ctx.vibrato.cents(self.start_time, now);

        let mod_env_params = EnvelopeParams::modulation(&m, self.target_key, tables);
        let mod_env = self.modulation_envelope.value(&mod_env_params, elapsed, tables);
        cents += mod_env * m[G::ModEnvToPitch] as f32;
        cutoff += mod_env * m[G::ModEnvToFilterFc] as f32;

        let total_cents = (cents + m[G::CoarseTune] as f32 * 100.0) as i32;
        if total_cents != self.tuning_cents {
            self.tuning_cents = total_cents;
            self.tuning_ratio = 2f64.powf(total_cents as f64 / 1200.0);
        }

        let len = left.len().min(right.len()).min(scratch.len());
        let buffer = &mut scratch[..len];
        buffer.fill(0.0);

        let exhausted = self.oscillator.render(
            data,
            self.playback_step * self.tuning_ratio,
            self.is_releasing(),
            ctx.interpolation,
            buffer,
        );

        self.filter
            .update(cutoff as i32, m[G::InitialFilterQ], ctx.sample_rate, tables);
        self.filter.process(buffer);

        let volume_params = EnvelopeParams::volume(&m, self.target_key, tables);
        self.volume_envelope
            .apply(buffer, &volume_params, elapsed, ctx.sample_time, offset_db, tables);

        let pan = (m[G::Pan].clamp(-500, 500) + 500) as f32 / 1000.0;
        let gain_left = (FRAC_PI_2 * pan).cos();
        let gain_right = (FRAC_PI_2 * pan).sin();
        for ((sample, l), r) in buffer.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            *l += sample * gain_left;
            *r += sample * gain_right;
        }

        if exhausted || self.volume_envelope.is_finished() {
            self.finish();
        }
    }
}
