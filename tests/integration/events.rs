//! Voice-count notifications and subscribers.

use crate::helpers::*;
use sfsynth::prelude::*;
use std::sync::{Arc, Mutex};

fn recorder(engine: &SynthEngine) -> (Arc<Mutex<Vec<EngineEvent>>>, sfsynth::SubscriptionId) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = engine.subscribe(move |event| sink.lock().unwrap().push(*event));
    (seen, id)
}

#[test]
fn test_voice_count_reported_on_change() {
    let mut engine = test_engine();
    let (seen, _) = recorder(&engine);

    engine.note_on(2, 60, 100).unwrap();
    render(&mut engine, 256);
    assert_eq!(engine.poll_events(), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![EngineEvent::VoiceCount { channel: 2, count: 1 }]
    );
}

#[test]
fn test_no_event_without_change() {
    let mut engine = test_engine();
    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);
    engine.poll_events();

    render(&mut engine, 256);
    render(&mut engine, 256);
    assert_eq!(engine.poll_events(), 0);
}

#[test]
fn test_voice_count_drops_to_zero() {
    let mut engine = test_engine();
    let (seen, _) = recorder(&engine);

    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);
    engine.stop_all(true).unwrap();
    render(&mut engine, 256);
    engine.poll_events();

    let events = seen.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&EngineEvent::VoiceCount { channel: 0, count: 0 })
    );
}

#[test]
fn test_unsubscribed_listener_is_not_called() {
    let mut engine = test_engine();
    let (seen, id) = recorder(&engine);
    assert!(engine.unsubscribe(id));

    engine.note_on(0, 60, 100).unwrap();
    render(&mut engine, 256);
    assert_eq!(engine.poll_events(), 1);
    assert!(seen.lock().unwrap().is_empty());
}
