// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast event bus with filtered streams and handler subscriptions.
//!
//! Publishing never waits on subscribers: each receiver has its own cursor
//! into a bounded broadcast ring. A receiver that falls more than `capacity`
//! events behind skips ahead and logs the gap.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::ConversationEvent;
use crate::filter::EventFilter;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-engine event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConversationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus whose ring holds `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live receivers (streams plus handler subscriptions).
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish to every current receiver. Returns how many received it.
    pub fn publish(&self, event: ConversationEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Pull-based stream of matching events published from now on.
    pub fn stream(&self, filter: EventFilter) -> EventStream {
        EventStream {
            filter,
            rx: self.tx.subscribe(),
        }
    }

    /// Run `handler` for every matching event on a dedicated task.
    ///
    /// A panicking handler is logged and keeps receiving later events; it
    /// never affects other subscribers. Must be called inside a Tokio
    /// runtime. The handler runs until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, filter: EventFilter, mut handler: F) -> Subscription
    where
        F: FnMut(&ConversationEvent) + Send + 'static,
    {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        let mut stream = self.stream(filter);
        let task = tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                    warn!(
                        subscription = id,
                        event_type = event.event_type(),
                        "event handler panicked"
                    );
                }
            }
            debug!(subscription = id, "event bus closed, handler task exiting");
        });
        Subscription { id, task }
    }

    /// Like [`subscribe`](Self::subscribe), but each invocation is spawned
    /// as its own task and not awaited.
    pub fn subscribe_async<F, Fut>(&self, filter: EventFilter, handler: F) -> Subscription
    where
        F: Fn(ConversationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        let mut stream = self.stream(filter);
        let task = tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                tokio::spawn(handler(event));
            }
        });
        Subscription { id, task }
    }
}

/// Filtered receiver returned by [`EventBus::stream`].
#[derive(Debug)]
pub struct EventStream {
    filter: EventFilter,
    rx: broadcast::Receiver<ConversationEvent>,
}

impl EventStream {
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ConversationEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged = n, "event stream lagged behind");
                }
            }
        }
    }

    /// Next matching event already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<ConversationEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(lagged = n, "event stream lagged behind");
                }
            }
        }
    }

    /// Drain every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<ConversationEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Handle to a running handler subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once unsubscribed or once the bus has been dropped.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use chatreel_core::ConversationId;

    fn conv() -> ConversationId {
        "demo".into()
    }

    #[tokio::test]
    async fn publish_without_subscribers_returns_zero() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(factory::conversation_paused(&conv(), 0)), 0);
    }

    #[tokio::test]
    async fn stream_receives_in_publish_order() {
        let bus = EventBus::new(8);
        let mut stream = bus.stream(EventFilter::all());
        bus.publish(factory::conversation_paused(&conv(), 1));
        bus.publish(factory::conversation_resumed(&conv(), 1));
        assert_eq!(
            stream.recv().await.map(|e| e.event_type()),
            Some("conversation.paused")
        );
        assert_eq!(
            stream.try_recv().map(|e| e.event_type()),
            Some("conversation.resumed")
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn stream_skips_non_matching() {
        let bus = EventBus::new(8);
        let mut stream = bus.stream(EventFilter::pattern("conversation.resumed"));
        bus.publish(factory::conversation_paused(&conv(), 1));
        bus.publish(factory::conversation_resumed(&conv(), 1));
        let drained = stream.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].event_type(), "conversation.resumed");
    }

    #[tokio::test]
    async fn lagged_stream_continues_with_newest_events() {
        let bus = EventBus::new(2);
        let mut stream = bus.stream(EventFilter::all());
        for i in 0..5 {
            bus.publish(factory::conversation_paused(&conv(), i));
        }
        let drained = stream.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained.last().map(|e| e.kind.clone()),
            Some(crate::EventKind::ConversationPaused { index: 4 })
        );
    }

    #[tokio::test]
    async fn stream_ends_when_bus_dropped() {
        let bus = EventBus::new(4);
        let mut stream = bus.stream(EventFilter::all());
        drop(bus);
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        assert_eq!(bus.capacity(), 1);
    }
}
