//! Provider events and per-listener subscriptions
//!
//! Backends publish events from whatever thread the engine calls back on.
//! Each listener owns a [`Subscription`] and drains it on its own thread;
//! dropping the subscription detaches it from the hub.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Identifier attached to each submitted utterance
pub type RequestId = u64;

/// Events reported by a speech backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The backend's voice list changed and should be re-read
    VoicesChanged,
    /// Synthesis of the request started
    Started(RequestId),
    /// Synthesis of the request finished or was stopped
    Ended(RequestId),
    /// Synthesis of the request failed
    Failed { request: RequestId, detail: String },
}

type Subscribers = Vec<(u64, Sender<SpeechEvent>)>;

/// Fan-out point for backend events
pub struct EventHub {
    next_id: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl EventHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        // A panicking publisher cannot leave the list half-written
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new listener
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();
        self.subscribers().push((id, tx));
        debug!("Subscription {} attached", id);

        Subscription {
            id,
            events: rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Send an event to every attached listener
    pub fn publish(&self, event: SpeechEvent) {
        debug!("Publishing {:?}", event);
        self.subscribers()
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Number of attached listeners
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    fn detach(&self, id: u64) {
        self.subscribers().retain(|(sub, _)| *sub != id);
        debug!("Subscription {} detached", id);
    }
}

/// Handle receiving events for one listener
pub struct Subscription {
    id: u64,
    events: Receiver<SpeechEvent>,
    hub: Weak<EventHub>,
}

impl Subscription {
    /// Take the next pending event without blocking
    pub fn try_next(&self) -> Option<SpeechEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every pending event
    pub fn drain(&self) -> Vec<SpeechEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.detach(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(SpeechEvent::Started(7));

        assert_eq!(a.drain(), vec![SpeechEvent::Started(7)]);
        assert_eq!(b.drain(), vec![SpeechEvent::Started(7)]);
    }

    #[test]
    fn test_drop_detaches() {
        let hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(a);
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(SpeechEvent::VoicesChanged);
        assert_eq!(b.try_next(), Some(SpeechEvent::VoicesChanged));
        assert_eq!(b.try_next(), None);
    }

    #[test]
    fn test_subscription_outlives_hub() {
        let hub = EventHub::new();
        let sub = hub.subscribe();
        hub.publish(SpeechEvent::Ended(1));
        drop(hub);

        assert_eq!(sub.drain(), vec![SpeechEvent::Ended(1)]);
    }
}
