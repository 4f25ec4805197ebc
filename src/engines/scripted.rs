//! In-memory engine with no audio output.
//!
//! Records every request it is asked to speak and only emits lifecycle events
//! when told to, which makes the playback lifecycle observable step by step.
//! In auto-play mode it instead plays each request to completion on the next
//! [`poll`](crate::SpeechEngine::poll), which backs the front end's
//! `--dry-run`.

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

use crate::error::SpeechError;
use crate::events::{EventBus, Subscription};
use crate::types::{EngineEvent, PlaybackRequest, RequestId, Voice};
use crate::SpeechEngine;

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    bus: EventBus,
    voices: Vec<Voice>,
    queue: VecDeque<PlaybackRequest>,
    in_flight: Option<RequestId>,
    spoken: Vec<PlaybackRequest>,
    cancels: usize,
    auto_play: bool,
    reject_speak: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            ..Self::default()
        }
    }

    /// Start and finish each request on successive polls.
    pub fn auto_play(mut self) -> Self {
        self.auto_play = true;
        self
    }

    /// Make every `speak` call fail.
    pub fn rejecting(mut self) -> Self {
        self.reject_speak = true;
        self
    }

    /// Swap the voice list and announce the change.
    pub fn set_voices(&mut self, voices: Vec<Voice>) {
        self.voices = voices;
        self.bus.publish(EngineEvent::VoicesChanged);
    }

    /// Every request accepted by `speak`, in order.
    pub fn spoken(&self) -> &[PlaybackRequest] {
        &self.spoken
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Begin the next queued request and publish `Started`.
    pub fn begin(&mut self) -> Option<RequestId> {
        if self.in_flight.is_some() {
            return None;
        }
        let request = self.queue.pop_front()?;
        self.in_flight = Some(request.id);
        self.bus.publish(EngineEvent::Started(request.id));
        Some(request.id)
    }

    /// Finish the in-flight request and publish `Ended`.
    pub fn finish(&mut self) -> Option<RequestId> {
        let id = self.in_flight.take()?;
        self.bus.publish(EngineEvent::Ended(id));
        Some(id)
    }
}

impl SpeechEngine for ScriptedEngine {
    fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        Ok(self.voices.clone())
    }

    fn subscribe(&self) -> (Subscription, Receiver<EngineEvent>) {
        self.bus.subscribe()
    }

    fn speak(&mut self, request: PlaybackRequest) -> Result<(), SpeechError> {
        if self.reject_speak {
            return Err(SpeechError::EngineFailed {
                engine: "scripted".to_string(),
                code: None,
                stderr: "speak rejected".to_string(),
            });
        }
        log::debug!("Scripted engine queued {}: {:?}", request.id, request.text);
        self.spoken.push(request.clone());
        self.queue.push_back(request);
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.queue.clear();
        self.finish();
    }

    fn poll(&mut self) {
        if !self.auto_play {
            return;
        }
        if self.finish().is_none() {
            self.begin();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaybackRequestBuilder;

    fn request(id: u64) -> PlaybackRequest {
        PlaybackRequestBuilder::default()
            .id(RequestId(id))
            .text("Hello")
            .build()
            .unwrap()
    }

    #[test]
    fn queues_behind_in_flight_request() {
        let mut engine = ScriptedEngine::new();
        let (_sub, rx) = engine.subscribe();
        engine.speak(request(1)).unwrap();
        engine.speak(request(2)).unwrap();

        assert_eq!(engine.begin(), Some(RequestId(1)));
        assert_eq!(engine.begin(), None);
        assert_eq!(engine.finish(), Some(RequestId(1)));
        assert_eq!(engine.begin(), Some(RequestId(2)));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::Started(RequestId(1)),
                EngineEvent::Ended(RequestId(1)),
                EngineEvent::Started(RequestId(2)),
            ]
        );
    }

    #[test]
    fn cancel_ends_in_flight_and_drops_queue() {
        let mut engine = ScriptedEngine::new();
        let (_sub, rx) = engine.subscribe();
        engine.speak(request(1)).unwrap();
        engine.speak(request(2)).unwrap();
        engine.begin();

        engine.cancel();
        assert_eq!(engine.queued(), 0);
        assert_eq!(engine.in_flight(), None);
        assert_eq!(
            rx.try_iter().last(),
            Some(EngineEvent::Ended(RequestId(1)))
        );
    }

    #[test]
    fn auto_play_runs_requests_across_polls() {
        let mut engine = ScriptedEngine::new().auto_play();
        let (_sub, rx) = engine.subscribe();
        engine.speak(request(7)).unwrap();

        engine.poll();
        engine.poll();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::Started(RequestId(7)),
                EngineEvent::Ended(RequestId(7)),
            ]
        );
    }
}
