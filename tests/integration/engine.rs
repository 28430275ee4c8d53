//! Engine lifecycle integration tests
//!
//! Tests engine creation, channel state, and how MIDI-level calls reach the
//! channel renderers.

use crate::helpers::tolerances::SILENCE_THRESHOLD;
use crate::helpers::*;
use sfsynth::prelude::*;
use sfsynth::PERCUSSION_CHANNEL;

fn voice_keys(engine: &SynthEngine, channel: usize) -> Vec<u8> {
    let mut keys: Vec<u8> = engine
        .renderer(channel)
        .unwrap()
        .voices()
        .iter()
        .map(|v| v.key())
        .collect();
    keys.sort_unstable();
    keys
}

#[test]
fn test_engine_without_soundfont_is_silent() {
    let mut engine = SynthEngine::builder().build().unwrap();
    assert_eq!(engine.note_on(0, 60, 100).unwrap(), 0);

    let (left, right) = render(&mut engine, TEST_BUFFER_SIZE);
    assert_silence(&left, 0.0);
    assert_silence(&right, 0.0);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn test_note_on_produces_audio() {
    init_tracing();
    let mut engine = test_engine();
    assert_eq!(engine.note_on(0, 60, 100).unwrap(), 1);

    let (left, right) = render(&mut engine, 4096);
    assert_has_audio(&left, 0.01);
    assert_has_audio(&right, 0.01);
    assert_eq!(engine.voice_count(), 1);
}

#[test]
fn test_render_overwrites_buffers() {
    let mut engine = test_engine();
    let mut left = vec![1.0; 256];
    let mut right = vec![1.0; 256];
    engine.render(&mut left, &mut right);
    assert_silence(&left, 0.0);
    assert_silence(&right, 0.0);
}

#[test]
fn test_unknown_channel() {
    let engine = test_engine();
    assert!(matches!(
        engine.note_on(16, 60, 100),
        Err(Error::UnknownChannel(16))
    ));
    assert!(matches!(
        engine.controller_change(99, 7, 100),
        Err(Error::UnknownChannel(99))
    ));
}

#[test]
fn test_velocity_zero_is_note_off() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);

    assert_eq!(engine.note_on(0, 60, 0).unwrap(), 0);
    render(&mut engine, 256);
    let voices = engine.renderer(0).unwrap().voices();
    assert_eq!(voices.len(), 1);
    assert!(voices[0].is_releasing());
}

#[test]
fn test_note_off_releases_then_voice_ends() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 1024);

    engine.note_off(0, 60).unwrap();
    render(&mut engine, 256);
    assert!(engine.renderer(0).unwrap().voices()[0].is_releasing());

    // Release is 0.25 s
    render(&mut engine, 44100);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn test_kill_note_ends_quickly() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 1024);

    engine.kill_note(0, 60).unwrap();
    render(&mut engine, 4096);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn test_percussion_channel_defaults_to_drum_bank() {
    let engine = test_engine();
    assert_eq!(engine.preset_of(PERCUSSION_CHANNEL).unwrap(), (128, 0));
    assert_eq!(engine.preset_of(0).unwrap(), (0, 0));
}

#[test]
fn test_program_change_selects_preset() {
    let engine = test_engine();
    engine.program_change(0, 3).unwrap();
    // Layered preset has two zones on every key
    assert_eq!(engine.note_on(0, 60, 100).unwrap(), 2);
}

#[test]
fn test_bank_select() {
    let mut engine = test_engine();
    engine.bank_select(1, 128).unwrap();
    assert_eq!(engine.note_on(1, 42, 100).unwrap(), 1);
    // No hat zone on this key
    assert_eq!(engine.note_on(1, 60, 100).unwrap(), 0);

    engine.controller_change(2, 0, 5).unwrap();
    assert_eq!(engine.preset_of(2).unwrap(), (5, 0));

    // Drum channel ignores CC0
    engine.controller_change(PERCUSSION_CHANNEL, 0, 5).unwrap();
    assert_eq!(engine.preset_of(PERCUSSION_CHANNEL).unwrap(), (128, 0));

    render(&mut engine, 64);
    assert_eq!(engine.renderer(1).unwrap().voice_count(), 1);
}

#[test]
fn test_channels_are_independent() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    engine.note_on(1, 64, 100).unwrap();
    render(&mut engine, 256);

    engine.note_off(0, 60).unwrap();
    render(&mut engine, 256);
    assert!(engine.renderer(0).unwrap().voices()[0].is_releasing());
    assert!(!engine.renderer(1).unwrap().voices()[0].is_releasing());
}

#[test]
fn test_stop_all_force_silences_immediately() {
    let mut engine = test_engine();
    for key in [60, 64, 67] {
        engine.note_on(0, key, 100).unwrap();
    }
    engine.note_on(3, 48, 100).unwrap();
    render(&mut engine, 1024);
    assert_eq!(engine.voice_count(), 4);

    engine.stop_all(true).unwrap();
    let (left, right) = render(&mut engine, 256);
    assert_eq!(engine.voice_count(), 0);
    assert_silence(&left, SILENCE_THRESHOLD);
    assert_silence(&right, SILENCE_THRESHOLD);
}

#[test]
fn test_stop_all_releases_every_voice() {
    let mut engine = test_engine();
    for key in [60, 64, 67] {
        engine.note_on(0, key, 100).unwrap();
    }
    render(&mut engine, 1024);

    engine.stop_all(false).unwrap();
    render(&mut engine, 64);
    let voices = engine.renderer(0).unwrap().voices();
    assert_eq!(voices.len(), 3);
    assert!(voices.iter().all(|v| v.is_releasing()));
}

#[test]
fn test_all_notes_off_controller() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    engine.note_on(0, 62, 100).unwrap();
    render(&mut engine, 256);

    engine.controller_change(0, 123, 0).unwrap();
    render(&mut engine, 64);
    assert!(engine
        .renderer(0)
        .unwrap()
        .voices()
        .iter()
        .all(|v| v.is_releasing()));

    // All sound off cuts them
    engine.controller_change(0, 120, 0).unwrap();
    render(&mut engine, 64);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn test_voice_cap_evicts_oldest() {
    let mut engine = SynthEngine::builder()
        .voice_cap(4)
        .soundfont(fixture_soundfont())
        .build()
        .unwrap();
    for key in 60..66 {
        engine.note_on(0, key, 100).unwrap();
    }
    render(&mut engine, 256);
    assert_eq!(voice_keys(&engine, 0), vec![62, 63, 64, 65]);
}

#[test]
fn test_clear_cache_reuploads_on_next_note() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);
    assert!(engine.renderer(0).unwrap().has_sample(0));

    engine.clear_cache().unwrap();
    render(&mut engine, 64);
    assert!(!engine.renderer(0).unwrap().has_sample(0));
    assert_eq!(engine.soundfont().unwrap().cached_samples(), 0);

    engine.stop_all(true).unwrap();
    engine.note_on(0, 60, 100).unwrap();
    let (left, _) = render(&mut engine, 2048);
    assert!(engine.renderer(0).unwrap().has_sample(0));
    assert_has_audio(&left, 0.01);
}

#[test]
fn test_soundfont_added_later_gets_sized_sample_table() {
    let mut engine = SynthEngine::builder().build().unwrap();
    assert_eq!(engine.renderer(0).unwrap().sample_slots(), 0);

    engine.add_soundfont(fixture_soundfont()).unwrap();
    engine.program_change(0, 1).unwrap();
    engine.note_on(0, 60, 100).unwrap();
    let (left, _) = render(&mut engine, 256);

    // Table arrives from the control side before the upload
    let renderer = engine.renderer(0).unwrap();
    assert_eq!(renderer.sample_slots(), 3);
    assert!(renderer.has_sample(1));
    assert_eq!(renderer.voice_count(), 1);
    assert_has_audio(&left, 0.01);
    assert_eq!(engine.renderer(5).unwrap().sample_slots(), 3);
}

#[test]
fn test_released_samples_are_freed_by_control_side() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);
    let weak = std::sync::Arc::downgrade(&engine.soundfont().unwrap().sample_data(0).unwrap());

    engine.stop_all(true).unwrap();
    engine.clear_cache().unwrap();
    render(&mut engine, 64);
    assert!(!engine.renderer(0).unwrap().has_sample(0));
    // Parked in the recycle queue, not freed by render
    assert!(weak.upgrade().is_some());

    engine.poll_events();
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_select_soundfont_switches_bank() {
    let mut engine = test_engine();
    let first = engine.soundfont_handle().unwrap();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);

    let other = Sf2Builder::new()
        .name("Other")
        .sample("Tone", &tone_pcm(TONE_FRAMES), (100, 1900))
        .instrument("Other", vec![Zone::sample(0, &[])])
        .preset("Other", 0, 0, vec![Zone::instrument(0)])
        .build();
    let second = engine
        .add_soundfont(SoundFont::from_bytes(other).unwrap())
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(engine.soundfont_handle(), Some(second));
    assert_eq!(engine.soundfont().unwrap().name(), Some("Other"));

    // Switching cuts every voice
    render(&mut engine, 64);
    assert_eq!(engine.voice_count(), 0);

    engine.select_soundfont(first).unwrap();
    assert_eq!(engine.soundfont().unwrap().name(), Some("Fixture Bank"));
}

#[test]
fn test_select_unknown_soundfont() {
    let mut engine = test_engine();
    let handle = engine.soundfont_handle().unwrap();
    let extra = engine.add_soundfont(fixture_soundfont()).unwrap();
    engine.soundfonts().remove(&handle);

    assert!(matches!(
        engine.select_soundfont(handle),
        Err(Error::UnknownSoundFont)
    ));
    assert_eq!(engine.soundfont_handle(), Some(extra));
}

#[test]
fn test_load_soundfont_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.sf2");
    std::fs::write(&path, fixture_bank()).unwrap();

    let mut engine = SynthEngine::builder().build().unwrap();
    let handle = engine.load_soundfont(&path).unwrap();
    assert_eq!(engine.load_soundfont(&path).unwrap(), handle);
    assert_eq!(engine.soundfonts().len(), 1);
    assert_eq!(engine.note_on(0, 60, 100).unwrap(), 1);
}

#[test]
fn test_builder_loads_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.sf2");
    std::fs::write(&path, fixture_bank()).unwrap();

    let engine = SynthEngine::builder().soundfont_path(&path).build().unwrap();
    assert_eq!(engine.soundfont().unwrap().presets().len(), 5);
}

#[test]
fn test_full_queue_reports_back_pressure() {
    let engine = SynthEngine::builder()
        .message_capacity(16)
        .soundfont(fixture_soundfont())
        .build()
        .unwrap();

    // Nothing drains the queue without a render
    let mut result = Ok(());
    for _ in 0..32 {
        result = engine.pitch_wheel(0, 8192);
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(
        result,
        Err(Error::Render(sfsynth::render::Error::ChannelFull))
    ));
}
