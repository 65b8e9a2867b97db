//! # Event Registry
//!
//! Register / unregister and the dispatch path.

use crate::domain::listener::{
    BlockCallback, CallbackResult, ChaincodeCallback, Listener, ListenerHandle, ListenerKind,
    ListenerKindTag,
};
use crate::domain::matcher::{PatternMatcher, RegexMatcher};
use crate::error::{RegistryError, RegistryResult};
use parking_lot::RwLock;
use shared_bus::{EventFeed, EventFilter, EventStream};
use shared_types::{BlockEvent, ChannelId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

type ListenerMap = HashMap<ListenerHandle, Arc<Listener>>;

/// What one `dispatch` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks that ran and returned `Ok`.
    pub delivered: usize,
    /// Callbacks that returned `Err` or panicked.
    pub failed: usize,
    /// Matching listeners skipped because they were unregistered meanwhile.
    pub skipped: usize,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub blocks_dispatched: u64,
    pub callbacks_delivered: u64,
    pub callbacks_failed: u64,
}

/// The listener table.
#[derive(Default)]
pub struct EventRegistry {
    listeners: RwLock<Arc<ListenerMap>>,
    next_seq: AtomicU64,
    blocks_dispatched: AtomicU64,
    callbacks_delivered: AtomicU64,
    callbacks_failed: AtomicU64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, channel: ChannelId, kind: ListenerKind) -> ListenerHandle {
        let handle = ListenerHandle::new();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener::new(handle, seq, channel, kind));

        let mut guard = self.listeners.write();
        let mut next = ListenerMap::clone(&guard);
        next.insert(handle, listener);
        *guard = Arc::new(next);
        handle
    }

    /// Listen to every block on `channel`.
    pub fn register_block_listener(
        &self,
        channel: ChannelId,
        callback: BlockCallback,
    ) -> ListenerHandle {
        let handle = self.insert(channel.clone(), ListenerKind::Block(callback));
        info!(handle = %handle, channel = %channel, "[lc-04] Block listener registered");
        handle
    }

    /// Listen to contract events on `channel` whose contract name and event
    /// name both match.
    pub fn register_chaincode_listener(
        &self,
        channel: ChannelId,
        contract: Arc<dyn PatternMatcher>,
        event: Arc<dyn PatternMatcher>,
        callback: ChaincodeCallback,
    ) -> ListenerHandle {
        debug!(contract = ?contract, event = ?event, "[lc-04] Chaincode listener patterns");
        let handle = self.insert(
            channel.clone(),
            ListenerKind::Chaincode {
                contract,
                event,
                callback,
            },
        );
        info!(handle = %handle, channel = %channel, "[lc-04] Chaincode event listener registered");
        handle
    }

    /// [`register_chaincode_listener`](Self::register_chaincode_listener)
    /// with regular expression patterns.
    pub fn register_chaincode_listener_regex(
        &self,
        channel: ChannelId,
        contract_pattern: &str,
        event_pattern: &str,
        callback: ChaincodeCallback,
    ) -> RegistryResult<ListenerHandle> {
        let contract = Arc::new(RegexMatcher::new(contract_pattern)?);
        let event = Arc::new(RegexMatcher::new(event_pattern)?);
        Ok(self.register_chaincode_listener(channel, contract, event, callback))
    }

    /// Remove a listener. Once this returns, the listener's callback is not
    /// running and is never started again. An invocation in progress on
    /// another thread is waited for. Called from the listener's own callback,
    /// it returns at once and the current invocation completes.
    ///
    /// A callback that removes a different listener waits for that
    /// listener's running invocation, so two dispatch threads whose
    /// callbacks remove each other's listeners deadlock.
    ///
    /// # Errors
    ///
    /// `UnknownHandle` if the handle is not registered (or was already
    /// removed).
    pub fn unregister(&self, handle: ListenerHandle) -> RegistryResult<()> {
        let removed = {
            let mut guard = self.listeners.write();
            if !guard.contains_key(&handle) {
                return Err(RegistryError::UnknownHandle(handle));
            }
            let mut next = ListenerMap::clone(&guard);
            let removed = next.remove(&handle);
            *guard = Arc::new(next);
            removed
        };

        if let Some(listener) = removed {
            listener.deactivate();
            info!(
                handle = %handle,
                kind = %listener.kind.tag(),
                "[lc-04] Listener unregistered"
            );
        }
        Ok(())
    }

    /// Like [`unregister`](Self::unregister), but only for a listener of the
    /// given kind.
    pub fn unregister_kind(
        &self,
        handle: ListenerHandle,
        kind: ListenerKindTag,
    ) -> RegistryResult<()> {
        match self.listeners.read().get(&handle) {
            None => return Err(RegistryError::UnknownHandle(handle)),
            Some(l) if l.kind.tag() != kind => return Err(RegistryError::WrongKind(handle, kind)),
            Some(_) => {}
        }
        self.unregister(handle)
    }

    pub fn contains(&self, handle: &ListenerHandle) -> bool {
        self.listeners.read().contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            blocks_dispatched: self.blocks_dispatched.load(Ordering::Relaxed),
            callbacks_delivered: self.callbacks_delivered.load(Ordering::Relaxed),
            callbacks_failed: self.callbacks_failed.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self) -> Arc<ListenerMap> {
        Arc::clone(&self.listeners.read())
    }

    /// Deliver `block` to every matching live listener, in registration
    /// order.
    pub fn dispatch(&self, block: &BlockEvent) -> DispatchReport {
        let snapshot = self.snapshot();
        let mut listeners: Vec<&Arc<Listener>> = snapshot
            .values()
            .filter(|l| l.channel == block.channel)
            .collect();
        listeners.sort_by_key(|l| l.seq);

        let mut report = DispatchReport::default();
        for listener in listeners {
            match &listener.kind {
                ListenerKind::Block(callback) => {
                    invoke(listener, &mut report, || callback(block));
                }
                ListenerKind::Chaincode {
                    contract,
                    event,
                    callback,
                } => {
                    for ce in block.chaincode_events() {
                        if contract.matches(&ce.contract_name) && event.matches(&ce.event_name) {
                            invoke(listener, &mut report, || {
                                callback(&listener.handle, block, ce)
                            });
                        }
                    }
                }
            }
        }

        self.blocks_dispatched.fetch_add(1, Ordering::Relaxed);
        self.callbacks_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.callbacks_failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
        debug!(
            channel = %block.channel,
            block = block.block_number,
            delivered = report.delivered,
            failed = report.failed,
            "[lc-04] Block dispatched"
        );
        report
    }

    /// Run the dispatch loop over a stream until it ends, handing every
    /// block's report to `observe`.
    pub async fn run<F>(self: Arc<Self>, mut stream: EventStream, observe: F)
    where
        F: Fn(&DispatchReport) + Send + 'static,
    {
        info!("[lc-04] Dispatch loop started");
        while let Some(block) = stream.next().await {
            let report = self.dispatch(&block);
            observe(&report);
        }
        info!("[lc-04] Dispatch loop stopped, event feed closed");
    }

    /// Subscribe to `feed` and spawn the dispatch loop.
    ///
    /// The subscription is taken before this returns, so no event published
    /// afterwards is missed.
    pub fn spawn(self: &Arc<Self>, feed: &dyn EventFeed) -> JoinHandle<()> {
        self.spawn_observed(feed, |_| {})
    }

    /// [`spawn`](Self::spawn) with a per-block report observer.
    pub fn spawn_observed<F>(
        self: &Arc<Self>,
        feed: &dyn EventFeed,
        observe: F,
    ) -> JoinHandle<()>
    where
        F: Fn(&DispatchReport) + Send + 'static,
    {
        let stream = EventStream::new(feed.subscribe(EventFilter::all()));
        tokio::spawn(Arc::clone(self).run(stream, observe))
    }
}

fn invoke<F>(listener: &Listener, report: &mut DispatchReport, call: F)
where
    F: FnOnce() -> CallbackResult,
{
    let Some(_active) = listener.enter() else {
        report.skipped += 1;
        return;
    };

    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => report.delivered += 1,
        Ok(Err(e)) => {
            report.failed += 1;
            warn!(handle = %listener.handle, error = %e, "[lc-04] Listener callback failed");
        }
        Err(panic) => {
            report.failed += 1;
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic".into());
            warn!(handle = %listener.handle, panic = %message, "[lc-04] Listener callback panicked");
        }
    }
}
