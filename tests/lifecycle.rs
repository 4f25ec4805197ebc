use std::time::{Duration, Instant};

use voice_synth::engines::scripted::ScriptedEngine;
use voice_synth::{PlaybackState, Session, Settings, SpeechError, StartOutcome, Voice};

const DELAY: Duration = Duration::from_millis(300);

fn catalog() -> Vec<Voice> {
    vec![Voice::new("VoiceA", "en-us"), Voice::new("VoiceB", "en-gb")]
}

fn new_session(engine: ScriptedEngine) -> Session<ScriptedEngine> {
    Session::new(engine, Settings::default())
}

#[test]
fn hello_world_walks_the_full_lifecycle() {
    let mut session = new_session(ScriptedEngine::with_voices(catalog()));
    assert_eq!(session.catalog().selected(), Some("VoiceA"));

    session.set_text("Hello world");
    session.set_rate(1.0f32);
    session.set_pitch(1.0f32);

    let t0 = Instant::now();
    let mut states = vec![session.state()];

    assert!(matches!(session.start(t0), Ok(StartOutcome::Scheduled(_))));
    states.push(session.state());

    // The delay has not elapsed: nothing reaches the engine yet.
    session.tick(t0 + DELAY / 2);
    assert!(session.engine().spoken().is_empty());

    session.tick(t0 + DELAY);
    let spoken = session.engine().spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, "Hello world");
    assert_eq!(spoken[0].voice.as_ref().map(|v| v.name.as_str()), Some("VoiceA"));
    assert_eq!(session.state(), PlaybackState::Preparing);

    session.engine_mut().begin();
    states.push(session.tick(t0 + DELAY));

    session.engine_mut().finish();
    states.push(session.tick(t0 + DELAY));

    assert_eq!(
        states,
        vec![
            PlaybackState::Idle,
            PlaybackState::Preparing,
            PlaybackState::Speaking,
            PlaybackState::Idle,
        ]
    );
}

#[test]
fn empty_text_is_rejected_and_nothing_dispatched() {
    let mut session = new_session(ScriptedEngine::with_voices(catalog()));
    session.set_text("");

    let t0 = Instant::now();
    let err = session.start(t0).unwrap_err();
    assert!(matches!(err, SpeechError::EmptyText));
    assert_eq!(err.to_string(), "Please enter some text!");
    assert_eq!(session.state(), PlaybackState::Idle);

    session.tick(t0 + DELAY * 10);
    assert!(session.engine().spoken().is_empty());
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[test]
fn start_while_preparing_is_a_no_op() {
    let mut session = new_session(ScriptedEngine::with_voices(catalog()));
    session.set_text("first");
    let t0 = Instant::now();
    let first = session.start(t0).unwrap();

    session.set_text("second");
    let again = session.start(t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(again, StartOutcome::AlreadyActive);
    assert_eq!(session.state(), PlaybackState::Preparing);

    session.tick(t0 + DELAY);
    let spoken = session.engine().spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, "first");
    assert_eq!(StartOutcome::Scheduled(spoken[0].id), first);
}

#[test]
fn start_while_speaking_is_a_no_op() {
    let mut session = new_session(ScriptedEngine::new());
    session.set_text("first");
    let t0 = Instant::now();
    session.start(t0).unwrap();
    session.tick(t0 + DELAY);
    session.engine_mut().begin();
    session.tick(t0 + DELAY);
    assert_eq!(session.state(), PlaybackState::Speaking);

    assert_eq!(session.start(t0 + DELAY).unwrap(), StartOutcome::AlreadyActive);
    session.tick(t0 + DELAY * 3);
    assert_eq!(session.engine().spoken().len(), 1);
}

#[test]
fn stop_during_preparing_never_reaches_the_engine() {
    let mut session = new_session(ScriptedEngine::with_voices(catalog()));
    session.set_text("Hello world");
    let t0 = Instant::now();
    session.start(t0).unwrap();

    session.stop();
    assert_eq!(session.state(), PlaybackState::Idle);

    session.tick(t0 + DELAY * 2);
    assert!(session.engine().spoken().is_empty());
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[test]
fn stop_while_speaking_cancels_and_idles() {
    let mut session = new_session(ScriptedEngine::with_voices(catalog()));
    session.set_text("Hello world");
    let t0 = Instant::now();
    session.start(t0).unwrap();
    session.tick(t0 + DELAY);
    session.engine_mut().begin();
    session.tick(t0 + DELAY);
    assert_eq!(session.state(), PlaybackState::Speaking);

    session.stop();
    assert_eq!(session.state(), PlaybackState::Idle);
    assert_eq!(session.engine().in_flight(), None);
    assert_eq!(session.engine().cancel_count(), 1);

    // The engine's own Ended for the cancelled request changes nothing.
    assert_eq!(session.tick(t0 + DELAY), PlaybackState::Idle);
}

#[test]
fn restart_after_stop_ignores_stale_end_signal() {
    let mut session = new_session(ScriptedEngine::new());
    session.set_text("one");
    let t0 = Instant::now();
    session.start(t0).unwrap();
    session.tick(t0 + DELAY);
    session.engine_mut().begin();
    session.tick(t0 + DELAY);

    // Stop, then start again before draining the cancelled request's Ended.
    session.stop();
    session.set_text("two");
    session.start(t0 + DELAY).unwrap();
    assert_eq!(session.tick(t0 + DELAY), PlaybackState::Preparing);

    session.tick(t0 + DELAY * 2);
    session.engine_mut().begin();
    assert_eq!(session.tick(t0 + DELAY * 2), PlaybackState::Speaking);
}

#[test]
fn late_voice_list_selects_first_voice() {
    let mut session = new_session(ScriptedEngine::new());
    assert_eq!(session.catalog().selected(), None);

    session.engine_mut().set_voices(catalog());
    session.tick(Instant::now());
    assert_eq!(session.catalog().selected(), Some("VoiceA"));
}

#[test]
fn slider_inputs_reach_the_engine_in_bounds() {
    let t0 = Instant::now();
    for (rate, pitch) in [(0.0f32, 9.0f32), (-1.0, 0.49), (2.01, 1.0), (1.3, 0.8)] {
        let mut session = new_session(ScriptedEngine::new());
        session.set_text("bounds");
        session.set_rate(rate);
        session.set_pitch(pitch);
        session.start(t0).unwrap();
        session.tick(t0 + DELAY);

        let request = &session.engine().spoken()[0];
        for value in [request.rate.get(), request.pitch.get()] {
            assert!((0.5..=2.0).contains(&value), "{rate}/{pitch} gave {value}");
        }
    }
}

#[test]
fn settings_voice_overrides_first_voice_default() {
    let settings = Settings {
        voice: Some("VoiceB".to_string()),
        ..Settings::default()
    };
    let session = Session::new(ScriptedEngine::with_voices(catalog()), settings);
    assert_eq!(session.catalog().selected(), Some("VoiceB"));
}
