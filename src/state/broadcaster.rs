//! Fan-out of cache events to observers over `async_channel`.
//!
//! Each observer owns an unbounded channel, so publishing never waits on a
//! slow observer. Observers that dropped their receiver are pruned on the
//! next publish.

use {
    async_channel::{Receiver, Sender, unbounded},
    async_trait::async_trait,
    parking_lot::Mutex,
    tracing::debug,
};

use crate::state::events::CacheEvent;

/// Publishes cache events to every live subscription.
#[derive(Debug, Default)]
pub struct ChangeBroadcaster {
    observers: Mutex<Vec<Sender<CacheEvent>>>,
}

impl ChangeBroadcaster {
    /// Creates a broadcaster with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer.
    ///
    /// # Returns
    ///
    /// A `Subscription` that receives every event published from now on,
    /// in publish order.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = unbounded();
        self.observers.lock().push(sender);
        Subscription { receiver }
    }

    /// Registers a new observer whose first event is built by `initial`.
    ///
    /// `initial` runs while the observer list is locked, so no publish can
    /// slip in between building the first event and registering the
    /// observer. Only the new observer receives it.
    ///
    /// # Arguments
    ///
    /// * `initial` - Builds the first event; must not publish or subscribe.
    pub fn subscribe_with(&self, initial: impl FnOnce() -> CacheEvent) -> Subscription {
        let (sender, receiver) = unbounded();
        let mut observers = self.observers.lock();
        if sender.try_send(initial()).is_ok() {
            observers.push(sender);
        }
        Subscription { receiver }
    }

    /// Sends an event to every observer without waiting.
    ///
    /// # Returns
    ///
    /// The number of observers the event was delivered to.
    pub fn publish(&self, event: &CacheEvent) -> usize {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|sender| sender.try_send(event.clone()).is_ok());

        let pruned = before - observers.len();
        if pruned > 0 {
            debug!(pruned, kind = event.kind(), "Dropped closed observers");
        }
        observers.len()
    }

    /// Number of registered observers, including ones closed since the last publish.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}

/// Receiving end of a broadcaster registration.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<CacheEvent>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// Returns `None` once the broadcaster has been dropped and every
    /// pending event was received.
    pub async fn recv(&self) -> Option<CacheEvent> {
        self.receiver.recv().await.ok()
    }

    /// Returns the next event if one is already queued.
    #[must_use]
    pub fn try_recv(&self) -> Option<CacheEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drains every queued event.
    #[must_use]
    pub fn drain(&self) -> Vec<CacheEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Feeds every event to an observer until the broadcaster goes away.
    pub async fn forward_to<O: CacheObserver + Send>(self, observer: &mut O) {
        while let Some(event) = self.recv().await {
            observer.handle_event(event).await;
        }
    }
}

/// Trait for components that react to cache changes.
#[async_trait]
pub trait CacheObserver {
    /// Handles a cache change event.
    ///
    /// # Arguments
    ///
    /// * `event` - The cache change event to handle.
    async fn handle_event(&mut self, event: CacheEvent);
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use async_trait::async_trait;

    use crate::state::{
        broadcaster::{CacheObserver, ChangeBroadcaster},
        events::{CacheEvent, SnapshotKind},
    };

    fn error_event(message: &str) -> CacheEvent {
        CacheEvent::error(SnapshotKind::All, message.to_string())
    }

    #[test]
    fn test_publish_preserves_order() {
        let broadcaster = ChangeBroadcaster::new();
        let subscription = broadcaster.subscribe();

        broadcaster.publish(&error_event("first"));
        broadcaster.publish(&error_event("second"));

        assert_eq!(
            subscription.drain(),
            vec![error_event("first"), error_event("second")]
        );
    }

    #[test]
    fn test_publish_reaches_every_observer() {
        let broadcaster = ChangeBroadcaster::new();
        let first = broadcaster.subscribe();
        let second = broadcaster.subscribe();

        assert_eq!(broadcaster.publish(&error_event("x")), 2);
        assert_eq!(first.try_recv(), Some(error_event("x")));
        assert_eq!(second.try_recv(), Some(error_event("x")));
    }

    #[test]
    fn test_closed_observers_are_pruned() {
        let broadcaster = ChangeBroadcaster::new();
        let kept = broadcaster.subscribe();
        drop(broadcaster.subscribe());
        assert_eq!(broadcaster.observer_count(), 2);

        assert_eq!(broadcaster.publish(&error_event("x")), 1);
        assert_eq!(broadcaster.observer_count(), 1);
        assert_eq!(kept.try_recv(), Some(error_event("x")));
    }

    #[test]
    fn test_subscribe_with_orders_initial_before_concurrent_publish() {
        let broadcaster = Arc::new(ChangeBroadcaster::new());

        let mut publisher = None;
        let subscription = broadcaster.subscribe_with(|| {
            let broadcaster = Arc::clone(&broadcaster);
            publisher = Some(thread::spawn(move || {
                broadcaster.publish(&error_event("concurrent"))
            }));
            thread::sleep(Duration::from_millis(50));
            error_event("initial")
        });
        let delivered = publisher.unwrap().join().unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(
            subscription.drain(),
            vec![error_event("initial"), error_event("concurrent")]
        );
    }

    struct Recorder {
        kinds: Vec<&'static str>,
    }

    #[async_trait]
    impl CacheObserver for Recorder {
        async fn handle_event(&mut self, event: CacheEvent) {
            self.kinds.push(event.kind());
        }
    }

    #[tokio::test]
    async fn test_forward_to_observer_until_closed() {
        let broadcaster = ChangeBroadcaster::new();
        let subscription = broadcaster.subscribe();
        broadcaster.publish(&error_event("x"));
        broadcaster.publish(&CacheEvent::diff(SnapshotKind::Query, Default::default()));
        drop(broadcaster);

        let mut recorder = Recorder { kinds: Vec::new() };
        subscription.forward_to(&mut recorder).await;
        assert_eq!(recorder.kinds, ["error-all", "diff-query"]);
    }
}
