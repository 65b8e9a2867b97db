//! # Event Publisher
//!
//! The producing side of the feed. In production the producer is the
//! connection to the peers' block delivery service; here it is whatever
//! holds an `EventPublisher` (the simulated network, tests).

use crate::events::EventFilter;
use crate::subscriber::{EventFeed, EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::BlockEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Producer side of a block event feed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hand `event` to every current subscriber and return how many there
    /// were. Subscribers filter by channel themselves.
    async fn publish(&self, event: BlockEvent) -> usize;

    /// Blocks handed to `publish` so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Block event feed held in process, backed by a `tokio::sync::broadcast`
/// channel. A subscriber that falls more than `capacity` blocks behind
/// skips the gap (logged).
pub struct InMemoryEventFeed {
    sender: broadcast::Sender<BlockEvent>,

    events_published: AtomicU64,

    capacity: usize,
}

impl InMemoryEventFeed {
    /// Feed with [`DEFAULT_CHANNEL_CAPACITY`] buffered blocks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe and wrap the subscription as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed for InMemoryEventFeed {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(channels = ?filter.channels, "New feed subscription created");
        Subscription::new(receiver, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventFeed {
    async fn publish(&self, event: BlockEvent) -> usize {
        let channel = event.channel.clone();
        let block_number = event.block_number;

        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    channel = %channel,
                    block_number,
                    receivers = receiver_count,
                    "Block event published"
                );
                receiver_count
            }
            Err(e) => {
                warn!(
                    channel = %channel,
                    block_number,
                    error = %e,
                    "Block event dropped (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
