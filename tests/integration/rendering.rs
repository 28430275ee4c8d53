//! Rendering integration tests
//!
//! Pitch, level, pan, filtering, loop behaviour and exclusive classes,
//! measured on the engine's summed output and the channel renderers' voices.

use crate::helpers::tolerances::{PERCEPTUAL_EPSILON, SILENCE_THRESHOLD};
use crate::helpers::*;
use approx::assert_relative_eq;
use sfsynth::prelude::*;
use sfsynth::PERCUSSION_CHANNEL;

const RAMP_PROGRAM: u8 = 1;
const BUZZ_PROGRAM: u8 = 2;
const LAYERED_PROGRAM: u8 = 3;

fn first_voice_cursor(engine: &SynthEngine, channel: usize) -> f64 {
    engine.renderer(channel).unwrap().voices()[0].cursor()
}

fn ramp_cursor_after(key: u8, frames: usize, setup: impl FnOnce(&SynthEngine)) -> f64 {
    let mut engine = test_engine();
    engine.program_change(0, RAMP_PROGRAM).unwrap();
    setup(&engine);
    engine.note_on(0, key, 127).unwrap();
    render(&mut engine, frames);
    first_voice_cursor(&engine, 0)
}

#[test]
fn test_root_key_plays_at_unity_rate() {
    let cursor = ramp_cursor_after(60, 1024, |_| {});
    assert_relative_eq!(cursor, 1024.0, epsilon = 1e-6);
}

#[test]
fn test_octave_up_doubles_rate() {
    let cursor = ramp_cursor_after(72, 1024, |_| {});
    assert_relative_eq!(cursor, 2048.0, epsilon = 1e-6);
}

#[test]
fn test_transpose_shifts_pitch() {
    let cursor = ramp_cursor_after(60, 1024, |engine| {
        engine.set_transpose(0, -12).unwrap();
    });
    assert_relative_eq!(cursor, 512.0, epsilon = 1e-6);
}

#[test]
fn test_tuning_shifts_pitch() {
    let cursor = ramp_cursor_after(60, 1024, |engine| {
        engine.set_tuning(0, 1200).unwrap();
    });
    assert_relative_eq!(cursor, 2048.0, epsilon = 1e-6);
}

#[test]
fn test_pitch_wheel_range_widens_bend() {
    let narrow = ramp_cursor_after(60, 1024, |engine| {
        engine.pitch_wheel(0, 16383).unwrap();
    });
    let wide = ramp_cursor_after(60, 1024, |engine| {
        // RPN 0 = 12 semitones
        engine.controller_change(0, 101, 0).unwrap();
        engine.controller_change(0, 100, 0).unwrap();
        engine.controller_change(0, 6, 12).unwrap();
        engine.pitch_wheel(0, 16383).unwrap();
    });

    assert!(narrow > 1024.0 * 1.1, "narrow bend {narrow}");
    assert!(narrow < 1024.0 * 1.13, "narrow bend {narrow}");
    assert!(wide > 1024.0 * 1.9, "wide bend {wide}");
    assert!(wide <= 2048.0 + 1e-6, "wide bend {wide}");
}

#[test]
fn test_velocity_scales_level() {
    let level = |velocity: u8| {
        let mut engine = test_engine();
        engine.note_on(0, 60, velocity).unwrap();
        let (left, _) = render(&mut engine, 8192);
        rms(&left[4096..])
    };
    let loud = level(127);
    let soft = level(40);
    assert!(loud > soft * 1.5, "loud {loud} soft {soft}");
    assert!(soft > SILENCE_THRESHOLD);
}

#[test]
fn test_main_volume_attenuates() {
    let level = |volume: u8| {
        let mut engine = test_engine();
        engine.controller_change(0, 7, volume).unwrap();
        engine.note_on(0, 60, 127).unwrap();
        let (left, _) = render(&mut engine, 8192);
        rms(&left[4096..])
    };
    assert!(level(127) > level(30));
}

#[test]
fn test_pan_controller_moves_voice_left() {
    let mut engine = test_engine();
    engine.controller_change(0, 10, 0).unwrap();
    engine.note_on(0, 60, 127).unwrap();
    let (left, right) = render(&mut engine, 4096);
    assert_has_audio(&left, 0.01);
    assert_silence(&right, SILENCE_THRESHOLD);
}

#[test]
fn test_layered_zones_split_across_channels() {
    let mut engine = test_engine();
    engine.program_change(0, LAYERED_PROGRAM).unwrap();
    assert_eq!(engine.note_on(0, 60, 127).unwrap(), 2);

    let (left, right) = render(&mut engine, 4096);
    assert_has_audio(&left, 0.01);
    assert_relative_eq!(peak(&left), peak(&right), epsilon = PERCEPTUAL_EPSILON);

    // One note-on, one id
    let voices = engine.renderer(0).unwrap().voices();
    assert_eq!(voices[0].note_id(), voices[1].note_id());
}

#[test]
fn test_lowpass_removes_high_frequency_content() {
    let mut engine = test_engine();
    engine.program_change(0, BUZZ_PROGRAM).unwrap();
    engine.note_on(0, 60, 127).unwrap();

    let (left, _) = render(&mut engine, 8192);
    assert_eq!(engine.voice_count(), 1);
    assert!(rms(&left[4096..]) < PERCEPTUAL_EPSILON);
}

#[test]
fn test_loop_sustains_while_held() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 127).unwrap();
    render(&mut engine, 88200);
    let (left, _) = render(&mut engine, 4410);
    assert_has_audio(&left, 0.01);
    assert_eq!(engine.voice_count(), 1);
}

#[test]
fn test_one_shot_ends_while_held() {
    let mut engine = test_engine();
    engine.program_change(0, RAMP_PROGRAM).unwrap();
    engine.note_on(0, 60, 127).unwrap();
    render(&mut engine, ONE_SHOT_FRAMES + 4096);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn test_exclusive_class_cuts_previous_hat() {
    let mut engine = test_engine();
    engine.note_on(PERCUSSION_CHANNEL, 42, 100).unwrap();
    render(&mut engine, 1024);

    engine.note_on(PERCUSSION_CHANNEL, 46, 100).unwrap();
    render(&mut engine, 64);
    let voices = engine.renderer(PERCUSSION_CHANNEL).unwrap().voices();
    assert_eq!(voices.len(), 2);
    let closed = voices.iter().find(|v| v.key() == 42).unwrap();
    let open = voices.iter().find(|v| v.key() == 46).unwrap();
    assert!(closed.is_releasing());
    assert!(!open.is_releasing());

    render(&mut engine, 8192);
    let voices = engine.renderer(PERCUSSION_CHANNEL).unwrap().voices();
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].key(), 46);
}

#[test]
fn test_choked_hat_fades_instead_of_cutting() {
    // Same timeline with and without the closed hat; the difference is the
    // choked voice alone.
    let mut choked = test_engine();
    let mut open_only = test_engine();
    choked.note_on(PERCUSSION_CHANNEL, 42, 100).unwrap();
    render(&mut choked, 1024);
    render(&mut open_only, 1024);

    choked.note_on(PERCUSSION_CHANNEL, 46, 100).unwrap();
    open_only.note_on(PERCUSSION_CHANNEL, 46, 100).unwrap();

    let tail = |a: &mut SynthEngine, b: &mut SynthEngine, frames: usize| {
        let (left, _) = render(a, frames);
        let (reference, _) = render(b, frames);
        let diff: Vec<f32> = left.iter().zip(&reference).map(|(x, y)| x - y).collect();
        rms(&diff)
    };

    let first = tail(&mut choked, &mut open_only, 64);
    let later = tail(&mut choked, &mut open_only, 512);
    tail(&mut choked, &mut open_only, 8192);
    let gone = tail(&mut choked, &mut open_only, 512);

    assert!(first > 0.01, "choked hat silent right after choke: {first}");
    assert!(later < first, "no decay: {first} -> {later}");
    assert!(gone < SILENCE_THRESHOLD, "choked hat still sounding: {gone}");
}

#[test]
fn test_channel_vibrato_modulates_pitch() {
    let steady = ramp_cursor_after(60, 4096, |_| {});
    let vibrato = ramp_cursor_after(60, 4096, |engine| {
        engine
            .set_channel_vibrato(
                0,
                ChannelVibrato {
                    rate: 2.0,
                    depth: 100.0,
                    delay: 0.0,
                },
            )
            .unwrap();
    });
    assert_relative_eq!(steady, 4096.0, epsilon = 1e-6);
    assert!((vibrato - steady).abs() > 1.0, "vibrato {vibrato}");
}

#[test]
fn test_reset_controllers_restores_pan() {
    let mut engine = test_engine();
    engine.controller_change(0, 10, 0).unwrap();
    engine.reset_controllers(0).unwrap();
    engine.note_on(0, 60, 127).unwrap();
    let (left, right) = render(&mut engine, 4096);
    assert_relative_eq!(rms(&left), rms(&right), epsilon = PERCEPTUAL_EPSILON);
}

#[test]
fn test_nearest_neighbor_matches_linear_at_unity_rate() {
    let output = |interpolation: Interpolation| {
        let mut engine = SynthEngine::builder()
            .interpolation(interpolation)
            .soundfont(fixture_soundfont())
            .build()
            .unwrap();
        engine.note_on(0, 60, 127).unwrap();
        render(&mut engine, 2048).0
    };
    let linear = output(Interpolation::Linear);
    let nearest = output(Interpolation::NearestNeighbor);
    for (a, b) in linear.iter().zip(&nearest) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}
