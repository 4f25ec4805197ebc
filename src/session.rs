//! The single state container behind the front end.
//!
//! A [`Session`] owns the engine, the voice catalog, the playback controller
//! and the user's current inputs. The front end changes state only through
//! the action methods here and drives time forward with [`Session::tick`].

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::catalog::VoiceCatalog;
use crate::controller::{PlaybackController, StartOutcome};
use crate::error::SpeechError;
use crate::events::Subscription;
use crate::settings::Settings;
use crate::types::{EngineEvent, PlaybackState, SliderValue};
use crate::SpeechEngine;

/// Upper bound on how long [`Session::run_until_idle`] sleeps between ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct Session<E: SpeechEngine> {
    engine: E,
    catalog: VoiceCatalog,
    controller: PlaybackController,
    text: String,
    rate: SliderValue,
    pitch: SliderValue,
    events: Receiver<EngineEvent>,
    subscription: Option<Subscription>,
}

impl<E: SpeechEngine> Session<E> {
    pub fn new(engine: E, settings: Settings) -> Self {
        // Subscribe before the first load so a voice list arriving in between
        // still triggers a refresh.
        let (subscription, events) = engine.subscribe();

        let mut catalog = VoiceCatalog::new();
        if let Some(name) = &settings.voice {
            catalog.prefer(name.clone());
        }
        catalog.refresh(&engine);

        Self {
            engine,
            catalog,
            controller: PlaybackController::new(settings.prepare_delay()),
            text: String::new(),
            rate: settings.rate,
            pitch: settings.pitch,
            events,
            subscription: Some(subscription),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rate(&self) -> SliderValue {
        self.rate
    }

    pub fn pitch(&self) -> SliderValue {
        self.pitch
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_rate(&mut self, rate: impl Into<SliderValue>) {
        self.rate = rate.into();
    }

    pub fn set_pitch(&mut self, pitch: impl Into<SliderValue>) {
        self.pitch = pitch.into();
    }

    /// Choose a voice by display name. Returns `false` for unknown names.
    pub fn select_voice(&mut self, name: &str) -> bool {
        self.catalog.select(name)
    }

    /// Press "speak" with the current inputs.
    pub fn start(&mut self, now: Instant) -> Result<StartOutcome, SpeechError> {
        let voice = self.catalog.selected_voice();
        self.controller
            .start(&self.text, voice, self.rate, self.pitch, now)
    }

    /// Press "stop": cancel engine playback and return to Idle.
    pub fn stop(&mut self) {
        self.controller.stop();
        self.engine.cancel();
    }

    /// Advance the session to `now`: let the engine make progress, dispatch a
    /// request whose preparing delay has elapsed, and apply engine events.
    pub fn tick(&mut self, now: Instant) -> PlaybackState {
        self.engine.poll();

        if let Some(request) = self.controller.poll_dispatch(now) {
            let id = request.id;
            if let Err(e) = self.engine.speak(request) {
                log::error!("Engine rejected request {id}: {e}");
                self.controller.dispatch_failed(id);
            }
        }

        loop {
            match self.events.try_recv() {
                Ok(EngineEvent::VoicesChanged) => self.catalog.refresh(&self.engine),
                Ok(event) => self.controller.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Engine event channel closed");
                    break;
                }
            }
        }

        self.controller.state()
    }

    /// Block, ticking in real time, until playback is back to Idle.
    ///
    /// `on_change` sees every state the session passes through.
    pub fn run_until_idle(&mut self, mut on_change: impl FnMut(PlaybackState)) {
        let mut last = self.state();
        loop {
            let now = Instant::now();
            let state = self.tick(now);
            if state != last {
                on_change(state);
                last = state;
            }
            if state == PlaybackState::Idle {
                return;
            }
            let wait = self
                .controller
                .next_deadline()
                .map(|due| due.saturating_duration_since(now))
                .unwrap_or(POLL_INTERVAL)
                .min(POLL_INTERVAL);
            thread::sleep(wait);
        }
    }

    /// Tear the session down, releasing the engine subscription.
    pub fn close(mut self) -> E {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
        self.engine
    }
}
