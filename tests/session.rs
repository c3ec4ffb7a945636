mod common;

use common::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tenkey::{
    audio::Param,
    engine::VoiceEvent,
    error::SessionError,
    input::{KeyEvent, KeyId},
    session::{Lifecycle, Session},
};

#[test]
fn press_release_creates_and_releases_once_per_key() {
    let (mut session, recording, _host) = recording_session();

    for c in '1'..='8' {
        let started = session.handle_key(KeyEvent::down(c));
        // Auto-repeat while held
        assert!(session.handle_key(KeyEvent::down(c)).is_none());
        let released = session.handle_key(KeyEvent::up(c));

        assert!(matches!(started, Some(VoiceEvent::Started { key, .. }) if key == KeyId::new(c)));
        assert!(matches!(released, Some(VoiceEvent::Released { key, .. }) if key == KeyId::new(c)));
    }

    let rec = recording.borrow();
    assert_eq!(rec.oscillators_created().len(), 8);
    assert_eq!(rec.stops().len(), 8);
}

#[test]
fn voice_table_tracks_held_keys_under_random_input() {
    let (mut session, _recording, _host) = recording_session();
    let mut rng = Pcg32::seed_from_u64(1234);
    let keys = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '-'];

    for _ in 0..2_000 {
        let key = keys[rng.gen_range(0..keys.len())];
        let event = if rng.gen_bool(0.5) {
            KeyEvent::down(key)
        } else {
            KeyEvent::up(key)
        };
        session.handle_key(event);

        let voices = session.engine().voices();
        let mut voiced: Vec<KeyId> = voices.iter().map(|v| v.key()).collect();
        voiced.sort();
        let held: Vec<KeyId> = session.active_keys().iter().collect();
        assert_eq!(voiced, held);
    }
}

#[test]
fn held_note_keeps_pitch_across_scale_change() {
    let (mut session, recording, _host) = recording_session();
    let key = KeyId::new('3');

    session.handle_key(KeyEvent::down('3'));
    session.handle_key(KeyEvent::down('+'));
    session.handle_key(KeyEvent::up('+'));
    assert_eq!(session.scales().current().name(), "Natural Minor");

    assert_eq!(session.engine().voices().get(key).unwrap().frequency(), 329.63);
    let released = session.handle_key(KeyEvent::up('3'));
    assert!(matches!(released, Some(VoiceEvent::Released { frequency, .. }) if frequency == 329.63));

    // Only one frequency was ever scheduled for that oscillator
    let rec = recording.borrow();
    let osc = rec.oscillators_created()[0];
    let retunes = rec
        .calls
        .iter()
        .filter(|c| matches!(c, Call::SetValue(id, Param::Frequency, _, _) if *id == osc))
        .count();
    assert_eq!(retunes, 1);

    // The next press of the same key uses the new scale
    drop(rec);
    session.handle_key(KeyEvent::down('3'));
    assert_eq!(session.engine().voices().get(key).unwrap().frequency(), 311.13);
}

#[test]
fn keys_beyond_the_scale_never_sound() {
    let (mut session, recording, _host) = recording_session();

    // Wrap backwards to the last scale: Pentatonic, 6 degrees
    session.handle_key(KeyEvent::down('-'));
    session.handle_key(KeyEvent::up('-'));
    assert_eq!(session.scales().current().name(), "Pentatonic");

    for c in ['7', '8', '9', '0', '*', '/', '.'] {
        assert!(session.handle_key(KeyEvent::down(c)).is_none());
        assert!(session.handle_key(KeyEvent::up(c)).is_none());
    }

    assert!(recording.borrow().oscillators_created().is_empty());
    assert!(session.active_keys().is_empty());
    assert!(!session.visualization().is_running());
}

#[test]
fn off_keypad_events_are_ignored_by_default() {
    let (mut session, recording, _host) = recording_session();

    session.handle_key(KeyEvent::down('1').off_keypad());
    session.handle_key(KeyEvent::down('+').off_keypad());

    assert!(recording.borrow().calls.is_empty());
    assert_eq!(session.scales().index(), 0);
}

#[test]
fn major_scale_walkthrough() {
    let (mut session, recording, host) = recording_session();
    recording.borrow_mut().now = 2.0;
    let key = KeyId::new('1');

    let started = session.handle_key(KeyEvent::down('1'));
    assert_eq!(
        started,
        Some(VoiceEvent::Started {
            key,
            frequency: 261.63,
            at: 2.0
        })
    );
    assert!(session.visualization().is_running());
    assert_eq!(session.frequency().get(), Some(261.63));

    session.handle_key(KeyEvent::down('+'));
    assert_eq!(session.scales().index(), 1);
    assert_eq!(session.engine().voices().get(key).unwrap().frequency(), 261.63);

    recording.borrow_mut().now = 2.5;
    let released = session.handle_key(KeyEvent::up('1'));
    let Some(VoiceEvent::Released { tail_end, .. }) = released else {
        panic!("expected a release, got {released:?}");
    };
    assert!((tail_end - 2.53).abs() < 1e-9);

    // Gone from the table immediately, tail still scheduled
    assert!(session.engine().voices().is_empty());
    let rec = recording.borrow();
    let osc = rec.oscillators_created()[0];
    let (stopped, at) = rec.stops()[0];
    assert_eq!(stopped, osc);
    assert!((at - 2.53).abs() < 1e-9);
    assert!(rec
        .calls
        .iter()
        .any(|c| matches!(c, Call::Ramp(_, Param::Gain, floor, t) if *floor == 0.001 && (*t - 2.53).abs() < 1e-9)));

    assert!(session.active_keys().is_empty());
    assert!(!session.visualization().is_running());
    assert_eq!(session.frequency().get(), None);
    assert_eq!(host.borrow().cancels, 1);
}

#[test]
fn rapid_repress_overlaps_the_old_tail() {
    let (mut session, recording, _host) = recording_session();
    let key = KeyId::new('5');

    recording.borrow_mut().now = 1.0;
    session.handle_key(KeyEvent::down('5'));
    session.handle_key(KeyEvent::up('5'));

    recording.borrow_mut().now = 1.01;
    let again = session.handle_key(KeyEvent::down('5'));
    assert!(matches!(again, Some(VoiceEvent::Started { at, .. }) if at == 1.01));

    let rec = recording.borrow();
    let oscillators = rec.oscillators_created();
    assert_eq!(oscillators.len(), 2);
    assert_ne!(oscillators[0], oscillators[1]);

    let old_tail_end = rec.stops()[0].1;
    let new_start = rec.starts()[1].1;
    assert!(new_start < old_tail_end, "tails should overlap");

    let voice = session.engine().voices().get(key).unwrap();
    assert_eq!(voice.oscillator(), oscillators[1]);
}

#[test]
fn silent_session_still_tracks_keys_and_draws() {
    let (surface, events, host) = host();
    let mut session: TestSession<RecordingContext> =
        Session::new(&config(), None, surface, events).unwrap();
    session.start().unwrap();

    assert!(session.handle_key(KeyEvent::down('2')).is_none());
    assert!(session.active_keys().contains(KeyId::new('2')));
    assert!(session.visualization().is_running());

    let pending = host.borrow().pending.unwrap();
    assert!(session.on_frame(pending));
    assert_eq!(host.borrow().drawn, 48);

    assert!(session.handle_key(KeyEvent::up('2')).is_none());
    assert!(!session.visualization().is_running());
}

#[test]
fn deferred_context_takes_over_mid_session() {
    let (surface, events, _host) = host();
    let mut session: TestSession<RecordingContext> =
        Session::new(&config(), None, surface, events).unwrap();
    session.start().unwrap();
    session.handle_key(KeyEvent::down('1'));

    let (context, recording) = RecordingContext::new();
    assert!(session.attach_context(context));

    // '1' is still held, so its repeat is swallowed; a new key sounds
    session.handle_key(KeyEvent::down('1'));
    session.handle_key(KeyEvent::down('2'));
    assert_eq!(recording.borrow().oscillators_created().len(), 1);
}

#[test]
fn teardown_releases_everything_exactly_once() {
    let (mut session, recording, host) = recording_session();
    session.handle_key(KeyEvent::down('1'));
    session.handle_key(KeyEvent::down('4'));

    session.teardown();
    session.teardown();

    {
        let host = host.borrow();
        assert_eq!(host.subscribes, 1);
        assert_eq!(host.unsubscribes, 1);
        assert_eq!(host.cancels, 1);
        assert_eq!(host.pending, None);
    }
    {
        // Held voices get their fade scheduled before the context closes
        let rec = recording.borrow();
        assert_eq!(rec.stops().len(), 2);
        assert_eq!(rec.closes(), 1);
        assert_eq!(rec.calls.last(), Some(&Call::Close));
    }
    assert_eq!(session.lifecycle(), Lifecycle::TornDown);
    assert!(session.active_keys().is_empty());

    // Nothing is processed after teardown, and start cannot revive it
    assert!(session.handle_key(KeyEvent::down('2')).is_none());
    assert!(matches!(session.start(), Err(SessionError::TornDown)));

    drop(session);
    assert_eq!(host.borrow().unsubscribes, 1);
    assert_eq!(recording.borrow().closes(), 1);
}

#[test]
fn drop_tears_down_an_idle_session() {
    let (session, recording, host) = recording_session();
    drop(session);

    let host = host.borrow();
    assert_eq!(host.unsubscribes, 1);
    assert_eq!(host.cancels, 0);
    assert_eq!(recording.borrow().closes(), 1);
}

#[test]
fn unstarted_session_ignores_keys_and_never_unsubscribes() {
    let (context, recording) = RecordingContext::new();
    let (surface, events, host) = host();
    let mut session = Session::new(&config(), Some(context), surface, events).unwrap();

    assert!(session.handle_key(KeyEvent::down('1')).is_none());
    session.teardown();

    assert!(recording.borrow().oscillators_created().is_empty());
    assert_eq!(host.borrow().subscribes, 0);
    assert_eq!(host.borrow().unsubscribes, 0);
}

#[test]
fn release_all_silences_held_keys() {
    let (mut session, recording, host) = recording_session();
    for c in ['1', '3', '5'] {
        session.handle_key(KeyEvent::down(c));
    }

    let events = session.release_all();

    assert_eq!(events.len(), 3);
    assert!(session.engine().voices().is_empty());
    assert!(session.active_keys().is_empty());
    assert_eq!(recording.borrow().stops().len(), 3);
    assert_eq!(host.borrow().cancels, 1);

    // Key-ups arriving afterwards are harmless
    assert!(session.handle_key(KeyEvent::up('1')).is_none());
}

#[test]
fn releasing_part_of_a_chord_falls_back_to_latest_held_note() {
    let (mut session, _recording, _host) = recording_session();

    session.handle_key(KeyEvent::down('1'));
    session.handle_key(KeyEvent::down('5'));
    session.handle_key(KeyEvent::down('3'));
    assert_eq!(session.frequency().get(), Some(329.63));

    // Releasing the newest note hands over to the one pressed before it
    session.handle_key(KeyEvent::up('3'));
    assert_eq!(session.frequency().get(), Some(392.0));

    // Releasing an older note leaves the newest one in charge
    session.handle_key(KeyEvent::down('3'));
    session.handle_key(KeyEvent::up('5'));
    assert_eq!(session.frequency().get(), Some(329.63));

    session.handle_key(KeyEvent::up('3'));
    assert_eq!(session.frequency().get(), Some(261.63));
    let sounding: Vec<f32> = session.engine().voices().iter().map(|v| v.frequency()).collect();
    assert_eq!(sounding, vec![261.63]);
    assert!(session.visualization().is_running());

    session.handle_key(KeyEvent::up('1'));
    assert_eq!(session.frequency().get(), None);
    assert!(!session.visualization().is_running());
}

#[test]
fn held_note_keeps_its_pitch_as_fallback_after_scale_change() {
    let (surface, events, _host) = host();
    let mut session: TestSession<RecordingContext> =
        Session::new(&config(), None, surface, events).unwrap();
    session.start().unwrap();

    session.handle_key(KeyEvent::down('3'));
    session.handle_key(KeyEvent::down('+'));
    session.handle_key(KeyEvent::down('5'));
    session.handle_key(KeyEvent::up('5'));

    // '3' was pressed under Major, so it still reports E4 without any audio
    assert_eq!(session.frequency().get(), Some(329.63));
}
