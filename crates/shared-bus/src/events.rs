//! # Feed Filters
//!
//! Channel scoping for feed subscriptions.

use shared_types::{BlockEvent, ChannelId};

/// Selects which block events a subscription sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Channels to include. Empty means all channels.
    pub channels: Vec<ChannelId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for a single channel.
    #[must_use]
    pub fn channel(channel: ChannelId) -> Self {
        Self {
            channels: vec![channel],
        }
    }

    /// Create a filter for several channels.
    #[must_use]
    pub fn channels(channels: Vec<ChannelId>) -> Self {
        Self { channels }
    }

    /// Check whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &BlockEvent) -> bool {
        self.channels.is_empty() || self.channels.contains(&event.channel)
    }
}
