//! # Shared Bus - Ledger Event Feed
//!
//! The push source of committed-block notifications the pipeline listens to.
//!
//! ## Shape
//!
//! ```text
//!  event source peers / simulator
//!              │ publish(BlockEvent)
//!              ▼
//!      ┌──────────────┐   subscribe(filter)   ┌────────────────┐
//!      │  Event Feed  │ ────────────────────→ │ Commit Waiter  │
//!      │ (broadcast)  │ ────────────────────→ │ Event Registry │
//!      └──────────────┘                       └────────────────┘
//! ```
//!
//! Subscribers are never polled for work: every consumer is woken by the feed.
//! A subscriber that falls more than the channel capacity behind loses the
//! oldest events and is told how many (see [`Subscription::recv`]).

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::EventFilter;
pub use publisher::{EventPublisher, InMemoryEventFeed};
pub use subscriber::{EventFeed, EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
