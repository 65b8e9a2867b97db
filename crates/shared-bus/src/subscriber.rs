//! # Event Subscriber
//!
//! The consuming side of the feed.

use crate::events::EventFilter;
use shared_types::BlockEvent;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event feed was closed.
    #[error("Event feed closed")]
    Closed,
}

/// Anything that can hand out block event subscriptions.
pub trait EventFeed: Send + Sync {
    /// Subscribe to events matching a filter.
    ///
    /// Only events published after this call are delivered.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// One consumer's view of the feed, filtered by channel. Dropping it
/// detaches from the feed.
pub struct Subscription {
    receiver: broadcast::Receiver<BlockEvent>,

    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BlockEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Next block on a subscribed channel, or `None` once the feed is
    /// closed. Lagged gaps are logged and skipped.
    pub async fn recv(&mut self) -> Option<BlockEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Feed subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking [`recv`](Self::recv): `Ok(None)` when nothing matching
    /// is buffered.
    pub fn try_recv(&mut self) -> Result<Option<BlockEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// A [`Subscription`] as a `tokio_stream::Stream`, for dispatch loops that
/// use stream combinators. Lagged gaps are logged and skipped.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = BlockEvent> + Send>>,
    filter: EventFilter,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription { receiver, filter } = subscription;
        let stream_filter = filter.clone();
        let inner = BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(event) if stream_filter.matches(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(count)) => {
                warn!(lagged = count, "Feed stream lagged, events dropped");
                None
            }
        });

        Self {
            inner: Box::pin(inner),
            filter,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = BlockEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
