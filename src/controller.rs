//! Playback lifecycle: `Idle -> Preparing -> Speaking -> Idle`.
//!
//! The controller never talks to the engine itself. [`start`] schedules a
//! dispatch, [`poll_dispatch`] hands the built request back once the preparing
//! delay has elapsed, and [`handle_event`] applies the engine's signals. All
//! three take the current time from the caller, so the lifecycle can be driven
//! deterministically.
//!
//! [`start`]: PlaybackController::start
//! [`poll_dispatch`]: PlaybackController::poll_dispatch
//! [`handle_event`]: PlaybackController::handle_event

use std::time::{Duration, Instant};

use crate::error::SpeechError;
use crate::types::{
    EngineEvent, PlaybackRequest, PlaybackRequestBuilder, PlaybackState, RequestId, SliderValue,
    Voice,
};

/// Pause between a start action and the dispatch to the engine.
pub const DEFAULT_PREPARE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Now Preparing; the request will be dispatched after the delay.
    Scheduled(RequestId),
    /// A request is already Preparing or Speaking; nothing changed.
    AlreadyActive,
}

#[derive(Debug)]
struct PendingDispatch {
    due: Instant,
    request: PlaybackRequest,
}

#[derive(Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    prepare_delay: Duration,
    next_id: u64,
    /// The request the state currently refers to.
    current: Option<RequestId>,
    pending: Option<PendingDispatch>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(DEFAULT_PREPARE_DELAY)
    }
}

impl PlaybackController {
    pub fn new(prepare_delay: Duration) -> Self {
        Self {
            state: PlaybackState::Idle,
            prepare_delay,
            next_id: 1,
            current: None,
            pending: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_request(&self) -> Option<RequestId> {
        self.current
    }

    pub fn prepare_delay(&self) -> Duration {
        self.prepare_delay
    }

    /// When the pending dispatch is due, if one is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Begin a playback cycle.
    ///
    /// Blank text is rejected with [`SpeechError::EmptyText`] and leaves the
    /// state untouched. While Preparing or Speaking the call is a no-op.
    pub fn start(
        &mut self,
        text: &str,
        voice: Option<&Voice>,
        rate: SliderValue,
        pitch: SliderValue,
        now: Instant,
    ) -> Result<StartOutcome, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        if !self.state.accepts_start() {
            log::debug!("Start ignored while {:?}", self.state);
            return Ok(StartOutcome::AlreadyActive);
        }

        let id = RequestId(self.next_id);
        let request = PlaybackRequestBuilder::default()
            .id(id)
            .text(text)
            .voice(voice.cloned())
            .rate(rate)
            .pitch(pitch)
            .build()?;
        self.next_id += 1;

        log::info!(
            "Preparing request {id} (rate {rate}, pitch {pitch}, voice {})",
            voice.map_or("default", |v| v.name.as_str())
        );
        self.state = PlaybackState::Preparing;
        self.current = Some(id);
        self.pending = Some(PendingDispatch {
            due: now + self.prepare_delay,
            request,
        });
        Ok(StartOutcome::Scheduled(id))
    }

    /// Take the pending request if its delay has elapsed by `now`.
    pub fn poll_dispatch(&mut self, now: Instant) -> Option<PlaybackRequest> {
        if self.pending.as_ref()?.due > now {
            return None;
        }
        let pending = self.pending.take()?;
        log::debug!("Dispatching request {}", pending.request.id);
        Some(pending.request)
    }

    /// Apply an engine signal. Signals about any request other than the
    /// current one are stale and ignored.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Started(id) if self.is_current(id) => {
                if self.state == PlaybackState::Preparing {
                    log::info!("Request {id} speaking");
                    self.state = PlaybackState::Speaking;
                }
            }
            EngineEvent::Ended(id) if self.is_current(id) => {
                log::info!("Request {id} ended");
                self.reset();
            }
            EngineEvent::Started(_) | EngineEvent::Ended(_) => {
                log::debug!("Ignoring stale {event:?} (current {:?})", self.current);
            }
            EngineEvent::VoicesChanged => {}
        }
    }

    /// The engine rejected the dispatched request; no `Ended` will follow.
    pub fn dispatch_failed(&mut self, id: RequestId) {
        if self.is_current(id) {
            self.reset();
        }
    }

    /// Force Idle from any state. A request still waiting out its preparing
    /// delay is dropped and will never reach the engine.
    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::debug!("Dropped undispatched request {}", pending.request.id);
        }
        self.reset();
    }

    fn is_current(&self, id: RequestId) -> bool {
        self.current == Some(id)
    }

    fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.current = None;
        self.pending = None;
    }
}
