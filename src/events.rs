//! Fan-out of engine events to subscribers.
//!
//! Engines own an [`EventBus`] and publish [`EngineEvent`]s into it. Each
//! subscriber gets its own channel and a [`Subscription`] handle; dropping the
//! handle unregisters the channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::EngineEvent;

type Subscribers = Vec<(u64, Sender<EngineEvent>)>;

#[derive(Debug, Default, Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: Subscribers,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> (Subscription, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        log::debug!("Engine subscriber {id} registered");

        let subscription = Subscription {
            id,
            bus: Arc::clone(&self.inner),
        };
        (subscription, rx)
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: EngineEvent) {
        let mut inner = lock(&self.inner);
        // Receivers dropped without releasing their handle are pruned here.
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// Keeps an engine subscription alive; released on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Arc<Mutex<BusInner>>,
}

impl Subscription {
    /// Release the subscription explicitly.
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut inner = lock(&self.bus);
        inner.subscribers.retain(|(id, _)| *id != self.id);
        log::debug!("Engine subscriber {} released", self.id);
    }
}

// A panic while holding the lock cannot leave the subscriber list half-updated.
fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
