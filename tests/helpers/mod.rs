//! Test helpers and fixtures for sfsynth integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (unity pitch, gain)
//! - `DSP_EPSILON` (1e-4): DSP processing (filters, interpolation)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod sf2;
pub mod tolerances;

pub use sf2::{Sf2Builder, Zone};

use sfsynth::prelude::*;
use sfsynth::soundfont::GeneratorType as G;

/// Default test sample rate, matching the fixture samples.
pub const TEST_SAMPLE_RATE: f64 = 44100.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Frames in the looped fixture tone.
pub const TONE_FRAMES: usize = 2000;

/// Frames in the one-shot fixture ramp.
pub const ONE_SHOT_FRAMES: usize = 20000;

/// Sine cycle of 100 frames (441 Hz at 44.1 kHz), repeated.
pub fn tone_pcm(frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / 100.0;
            (phase.sin() * 16000.0) as i16
        })
        .collect()
}

/// Alternating full-scale samples: all energy at Nyquist.
pub fn nyquist_pcm(frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| if i % 2 == 0 { 16000 } else { -16000 })
        .collect()
}

/// General-purpose fixture bank:
///
/// | bank | program | preset  | contents                                    |
/// |------|---------|---------|---------------------------------------------|
/// | 0    | 0       | Tone    | looped sine, loops until note-off          |
/// | 0    | 1       | Ramp    | long one-shot sine                          |
/// | 0    | 2       | Buzz    | looped Nyquist tone, lowpass at ~110 Hz     |
/// | 0    | 3       | Layered | two zones on the same key                   |
/// | 128  | 0       | Kit     | keys 42/46 share exclusive class 1          |
pub fn fixture_bank() -> Vec<u8> {
    let tone = tone_pcm(TONE_FRAMES);
    let ramp = tone_pcm(ONE_SHOT_FRAMES);
    let buzz = nyquist_pcm(TONE_FRAMES);

    Sf2Builder::new()
        .name("Fixture Bank")
        .sample("Tone", &tone, (100, 1900))
        .sample("Ramp", &ramp, (0, 0))
        .sample("Buzz", &buzz, (100, 1900))
        .instrument(
            "Tone",
            vec![Zone::sample(
                0,
                &[(G::SampleModes, 3), (G::ReleaseVolEnv, -2400)],
            )],
        )
        .instrument("Ramp", vec![Zone::sample(1, &[])])
        .instrument(
            "Buzz",
            vec![Zone::sample(
                2,
                &[(G::SampleModes, 1), (G::InitialFilterFc, 4500)],
            )],
        )
        .instrument(
            "Layered",
            vec![
                Zone::sample(0, &[(G::SampleModes, 1), (G::Pan, -500)]),
                Zone::sample(0, &[(G::SampleModes, 1), (G::Pan, 500)]),
            ],
        )
        .instrument(
            "Hats",
            vec![
                Zone::sample(
                    0,
                    &[
                        (G::KeyRange, key_range(42, 42)),
                        (G::SampleModes, 1),
                        (G::ExclusiveClass, 1),
                    ],
                ),
                Zone::sample(
                    0,
                    &[
                        (G::KeyRange, key_range(46, 46)),
                        (G::SampleModes, 1),
                        (G::ExclusiveClass, 1),
                    ],
                ),
            ],
        )
        .preset("Tone", 0, 0, vec![Zone::instrument(0)])
        .preset("Ramp", 0, 1, vec![Zone::instrument(1)])
        .preset("Buzz", 0, 2, vec![Zone::instrument(2)])
        .preset("Layered", 0, 3, vec![Zone::instrument(3)])
        .preset("Kit", 128, 0, vec![Zone::instrument(4)])
        .build()
}

/// KeyRange/VelRange generator amount.
pub fn key_range(low: u8, high: u8) -> i16 {
    (low as u16 | (high as u16) << 8) as i16
}

pub fn fixture_soundfont() -> SoundFont {
    SoundFont::from_bytes(fixture_bank()).expect("fixture bank should parse")
}

/// Engine with the fixture bank selected.
pub fn test_engine() -> SynthEngine {
    SynthEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .soundfont(fixture_soundfont())
        .build()
        .expect("Failed to create test engine")
}

/// Render `frames` frames, returning `(left, right)`.
pub fn render(engine: &mut SynthEngine, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    engine.render(&mut left, &mut right);
    (left, right)
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Install a log subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
