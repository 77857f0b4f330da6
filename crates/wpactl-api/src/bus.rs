//! Topic-filtered fan-out of daemon events.
//!
//! The session's reader task is the only publisher. Every subscription
//! owns a bounded [`mpsc`] channel; the publisher never waits on it. When a
//! subscriber's buffer is full the event is dropped *for that subscriber
//! only* and a warning is logged, so one slow consumer cannot stall reply
//! correlation for everybody else.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::event::Event;

/// Per-subscription buffer used when no explicit capacity is configured.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

// ── EventBus ─────────────────────────────────────────────────────────

/// Registry of active subscriptions.
pub struct EventBus {
    subscribers: DashMap<u64, Subscriber>,
    next_id: AtomicU64,
    capacity: usize,
    cancel: CancellationToken,
}

struct Subscriber {
    topics: HashSet<String>,
    tx: mpsc::Sender<Event>,
}

impl EventBus {
    /// Create a bus whose subscriptions buffer up to `capacity` events each
    /// (clamped to at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(0),
            capacity: capacity.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Register interest in the given event names.
    ///
    /// Matching is exact string equality. Subscribing after [`close`](Self::close)
    /// yields a subscription that is already closed.
    pub fn subscribe<I, S>(self: &Arc<Self>, topics: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: HashSet<String> = topics.into_iter().map(Into::into).collect();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let cancel = self.cancel.child_token();

        if !cancel.is_cancelled() {
            debug!(subscription = id, ?topics, "subscribed");
            self.subscribers.insert(
                id,
                Subscriber {
                    topics: topics.clone(),
                    tx,
                },
            );
        }

        Subscription {
            id,
            topics,
            bus: Arc::clone(self),
            rx: Mutex::new(rx),
            cancel,
            released: AtomicBool::new(false),
        }
    }

    /// Offer an event to every subscription whose topic set contains its name.
    pub fn publish(&self, event: &Event) {
        let mut dead = Vec::new();

        for entry in &self.subscribers {
            if !entry.topics.contains(&event.name) {
                continue;
            }
            match entry.tx.try_send(event.clone()) {
                Ok(()) => trace!(subscription = *entry.key(), event = %event.name, "delivered"),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        subscription = *entry.key(),
                        event = %event.name,
                        capacity = self.capacity,
                        "subscriber buffer full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*entry.key()),
            }
        }

        // Removal must happen after iteration: DashMap shards stay read-locked
        // while the iterator is alive.
        for id in dead {
            self.subscribers.remove(&id);
        }
    }

    /// Number of registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Close every subscription and refuse new ones. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
        self.subscribers.clear();
    }

    fn remove(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscription = id, "unsubscribed");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// A live interest in a set of event names.
///
/// Released by [`unsubscribe`](Self::unsubscribe) or on drop. Both `next`
/// and `unsubscribe` take `&self`, so a subscription shared through an
/// `Arc` can be released from another task while a `next()` is pending.
pub struct Subscription {
    id: u64,
    topics: HashSet<String>,
    bus: Arc<EventBus>,
    rx: Mutex<mpsc::Receiver<Event>>,
    cancel: CancellationToken,
    released: AtomicBool,
}

impl Subscription {
    /// Wait for the next matching event.
    ///
    /// Returns `None` once the subscription is released or its session is
    /// closed; release takes priority over events still buffered.
    pub async fn next(&self) -> Option<Event> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            event = rx.recv() => event,
        }
    }

    /// Deregister from the bus. Safe to call repeatedly and after the
    /// session has closed.
    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.bus.remove(self.id);
        self.cancel.cancel();
    }

    /// `true` once released or closed with the session.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn topics(&self) -> &HashSet<String> {
        &self.topics
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topics", &self.topics)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn event(name: &str) -> Event {
        Event {
            name: name.into(),
            payload: String::new(),
        }
    }

    #[tokio::test]
    async fn delivers_only_matching_topics() {
        let bus = Arc::new(EventBus::default());
        let sub = bus.subscribe(["A"]);

        bus.publish(&event("B"));
        bus.publish(&event("A"));

        assert_eq!(sub.next().await.unwrap().name, "A");
    }

    #[tokio::test]
    async fn overlapping_subscriptions_each_get_a_copy() {
        let bus = Arc::new(EventBus::default());
        let both = bus.subscribe(["A", "B"]);
        let only_a = bus.subscribe(["A"]);

        bus.publish(&event("A"));
        bus.publish(&event("B"));
        bus.publish(&event("A"));

        // The slow consumer reads after everything was published.
        assert_eq!(both.next().await.unwrap().name, "A");
        assert_eq!(both.next().await.unwrap().name, "B");
        assert_eq!(both.next().await.unwrap().name, "A");
        assert_eq!(only_a.next().await.unwrap().name, "A");
        assert_eq!(only_a.next().await.unwrap().name, "A");
    }

    #[test]
    fn next_stays_pending_until_published() {
        let bus = Arc::new(EventBus::default());
        let sub = bus.subscribe(["A"]);

        let mut next = task::spawn(sub.next());
        assert_pending!(next.poll());

        bus.publish(&event("A"));
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Some(event("A")));
    }

    #[test]
    fn full_buffer_drops_instead_of_blocking() {
        let bus = Arc::new(EventBus::new(1));
        let sub = bus.subscribe(["A"]);

        bus.publish(&event("A"));
        bus.publish(&Event {
            name: "A".into(),
            payload: "second".into(),
        });

        let mut next = task::spawn(sub.next());
        assert_ready_eq!(next.poll(), Some(event("A")));
        drop(next);
        let mut next = task::spawn(sub.next());
        assert_pending!(next.poll());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = Arc::new(EventBus::default());
        let sub = bus.subscribe(["A"]);
        assert_eq!(bus.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();

        assert_eq!(bus.subscriber_count(), 0);
        assert!(sub.is_closed());
    }

    #[test]
    fn unsubscribe_wakes_pending_next_with_none() {
        let bus = Arc::new(EventBus::default());
        let sub = Arc::new(bus.subscribe(["A"]));

        let waiter = Arc::clone(&sub);
        let mut next = task::spawn(async move { waiter.next().await });
        assert_pending!(next.poll());

        sub.unsubscribe();
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), None);
    }

    #[test]
    fn release_wins_over_buffered_events() {
        let bus = Arc::new(EventBus::default());
        let sub = bus.subscribe(["A"]);
        bus.publish(&event("A"));

        sub.unsubscribe();

        let mut next = task::spawn(sub.next());
        assert_ready_eq!(next.poll(), None);
    }

    #[test]
    fn close_ends_existing_and_future_subscriptions() {
        let bus = Arc::new(EventBus::default());
        let before = bus.subscribe(["A"]);

        bus.close();
        let after = bus.subscribe(["A"]);
        bus.publish(&event("A"));

        assert!(before.is_closed());
        assert!(after.is_closed());
        assert_eq!(bus.subscriber_count(), 0);

        // Releasing after close is a no-op.
        before.unsubscribe();
        after.unsubscribe();
    }

    #[test]
    fn dropping_a_subscription_deregisters_it() {
        let bus = Arc::new(EventBus::default());
        {
            let _sub = bus.subscribe(["A"]);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
