//! # Channel Events
//!
//! Block and contract-event listeners over one event feed.
//!
//! Callbacks run on the dispatch task, one block at a time and in
//! registration order. A callback that returns `Err` (or panics) is logged
//! and counted. It stays registered and never affects other listeners.

use crate::metrics;
use lc_04_event_registry::{
    BlockCallback, CallbackResult, ChaincodeCallback, EventRegistry, ListenerHandle,
    ListenerKindTag, RegistryResult,
};
use shared_bus::EventFeed;
use shared_types::{BlockEvent, ChaincodeEvent, ChannelId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Listener registry plus the task feeding it. Dropping it stops delivery.
pub struct ChannelEvents {
    registry: Arc<EventRegistry>,
    task: JoinHandle<()>,
}

impl ChannelEvents {
    /// Subscribe to `feed` and start dispatching. Must be called from within
    /// a tokio runtime.
    pub fn spawn(feed: &dyn EventFeed) -> Self {
        let registry = Arc::new(EventRegistry::new());
        let task = registry.spawn_observed(feed, |report| {
            metrics::record_callback_failures(report.failed);
        });
        Self { registry, task }
    }

    pub fn register_block_listener<F>(&self, channel: &ChannelId, callback: F) -> ListenerHandle
    where
        F: Fn(&BlockEvent) -> CallbackResult + Send + Sync + 'static,
    {
        let callback: BlockCallback = Arc::new(callback);
        self.registry
            .register_block_listener(channel.clone(), callback)
    }

    /// Listen for contract events whose contract name matches
    /// `contract_pattern` and whose event name matches `event_pattern`. Both
    /// are regular expressions that must match the whole name.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` if either pattern does not compile.
    pub fn register_chaincode_event_listener<F>(
        &self,
        channel: &ChannelId,
        contract_pattern: &str,
        event_pattern: &str,
        callback: F,
    ) -> RegistryResult<ListenerHandle>
    where
        F: Fn(&ListenerHandle, &BlockEvent, &ChaincodeEvent) -> CallbackResult
            + Send
            + Sync
            + 'static,
    {
        let callback: ChaincodeCallback = Arc::new(callback);
        self.registry.register_chaincode_listener_regex(
            channel.clone(),
            contract_pattern,
            event_pattern,
            callback,
        )
    }

    /// # Errors
    ///
    /// `UnknownHandle` for a handle that is not registered, `WrongKind` for a
    /// contract-event listener.
    pub fn unregister_block_listener(&self, handle: ListenerHandle) -> RegistryResult<()> {
        self.registry.unregister_kind(handle, ListenerKindTag::Block)
    }

    /// # Errors
    ///
    /// `UnknownHandle` for a handle that is not registered, `WrongKind` for a
    /// block listener.
    pub fn unregister_chaincode_event_listener(
        &self,
        handle: ListenerHandle,
    ) -> RegistryResult<()> {
        self.registry.unregister_kind(handle, ListenerKindTag::Chaincode)
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ChannelEvents {
    fn drop(&mut self) {
        self.task.abort();
    }
}
