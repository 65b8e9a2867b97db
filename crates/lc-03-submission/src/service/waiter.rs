//! # Commit Waiter
//!
//! Resolves commit futures from block events.
//!
//! ## Single writer
//!
//! One dispatch task owns every state transition. `register` only inserts a
//! pending entry and wakes the task. The task removes an entry in the same
//! step that resolves it, so a later event (or a late deadline) for the same
//! transaction finds nothing to change.
//!
//! ## Wake-ups
//!
//! The task sleeps on three things at once: the next block event, the
//! earliest pending deadline and a `Notify` poked by `register` (a new entry
//! may have an earlier deadline). It never polls the feed.

use crate::domain::commit::{CommitFuture, CommitState};
use crate::error::{SubmissionError, SubmissionResult};
use parking_lot::Mutex;
use shared_bus::{EventFeed, EventFilter, Subscription};
use shared_types::{BlockEvent, ChannelId, TransactionId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

struct PendingCommit {
    channel: ChannelId,
    registered_at: Instant,
    /// `None` when the timeout is too large to represent.
    deadline: Option<Instant>,
    state: watch::Sender<CommitState>,
}

impl PendingCommit {
    fn resolve(self, state: CommitState) {
        // No receiver left is fine: the caller stopped caring.
        self.state.send_replace(state);
    }
}

#[derive(Default)]
struct WaiterInner {
    pending: Mutex<HashMap<TransactionId, PendingCommit>>,
    wake: Notify,
}

impl WaiterInner {
    fn next_deadline(&self) -> Option<Instant> {
        self.pending.lock().values().filter_map(|p| p.deadline).min()
    }

    fn on_block(&self, block: &BlockEvent) {
        let mut resolved = Vec::new();
        {
            let mut pending = self.pending.lock();
            for tx in &block.transactions {
                let on_channel = pending
                    .get(&tx.tx_id)
                    .is_some_and(|p| p.channel == block.channel);
                if !on_channel {
                    continue;
                }
                let Some(entry) = pending.remove(&tx.tx_id) else {
                    continue;
                };
                let state = if tx.is_valid() {
                    CommitState::Committed {
                        block_number: block.block_number,
                    }
                } else {
                    CommitState::Invalid {
                        code: tx.validation_code,
                        block_number: block.block_number,
                    }
                };
                resolved.push((tx.tx_id.clone(), entry, state));
            }
        }

        for (tx_id, entry, state) in resolved {
            match state {
                CommitState::Committed { block_number } => info!(
                    tx_id = %tx_id,
                    block = block_number,
                    source = %block.source,
                    "[lc-03] Transaction committed"
                ),
                CommitState::Invalid { code, block_number } => warn!(
                    tx_id = %tx_id,
                    block = block_number,
                    code = %code,
                    "[lc-03] Transaction invalidated by the ledger"
                ),
                CommitState::Pending | CommitState::TimedOut { .. } => {}
            }
            entry.resolve(state);
        }
    }

    fn expire(&self, now: Instant) {
        let expired: Vec<(TransactionId, PendingCommit)> = {
            let mut pending = self.pending.lock();
            let ids: Vec<TransactionId> = pending
                .iter()
                .filter(|(_, p)| p.deadline.is_some_and(|at| at <= now))
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|p| (id, p)))
                .collect()
        };

        for (tx_id, entry) in expired {
            let waited = now.saturating_duration_since(entry.registered_at);
            warn!(
                tx_id = %tx_id,
                waited_ms = waited.as_millis() as u64,
                "[lc-03] Commit wait expired, final state unknown"
            );
            entry.resolve(CommitState::TimedOut { waited });
        }
    }

    fn close(&self) {
        let now = Instant::now();
        let drained: Vec<(TransactionId, PendingCommit)> = self.pending.lock().drain().collect();
        for (tx_id, entry) in drained {
            warn!(tx_id = %tx_id, "[lc-03] Event feed closed while awaiting commit");
            let waited = now.saturating_duration_since(entry.registered_at);
            entry.resolve(CommitState::TimedOut { waited });
        }
    }
}

async fn dispatch(inner: Arc<WaiterInner>, mut subscription: Subscription) {
    loop {
        let next = inner.next_deadline();
        let deadline = async move {
            match next {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            event = subscription.recv() => match event {
                Some(block) => inner.on_block(&block),
                None => {
                    inner.close();
                    return;
                }
            },
            () = inner.wake.notified() => {}
            () = deadline => inner.expire(Instant::now()),
        }
    }
}

/// Event-driven commit tracker.
///
/// Subscribes to the feed when spawned, so no event published after
/// `spawn` returns can be missed. Dropping the waiter stops the dispatch
/// task; futures still pending then report an unknown outcome.
pub struct CommitWaiter {
    inner: Arc<WaiterInner>,
    task: JoinHandle<()>,
}

impl CommitWaiter {
    /// Subscribe to `feed` and start the dispatch task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(feed: &dyn EventFeed) -> Self {
        let subscription = feed.subscribe(EventFilter::all());
        let inner = Arc::new(WaiterInner::default());
        let task = tokio::spawn(dispatch(Arc::clone(&inner), subscription));
        debug!("[lc-03] Commit waiter started");
        Self { inner, task }
    }

    /// Start tracking `tx_id` on `channel` for at most `timeout`.
    ///
    /// # Errors
    ///
    /// `DuplicateTransaction` if the id is already pending.
    pub fn register(
        &self,
        tx_id: TransactionId,
        channel: ChannelId,
        timeout: Duration,
    ) -> SubmissionResult<CommitFuture> {
        let registered_at = Instant::now();
        let (sender, receiver) = watch::channel(CommitState::Pending);

        {
            let mut pending = self.inner.pending.lock();
            if pending.contains_key(&tx_id) {
                return Err(SubmissionError::DuplicateTransaction { tx_id });
            }
            pending.insert(
                tx_id.clone(),
                PendingCommit {
                    channel,
                    registered_at,
                    deadline: registered_at.checked_add(timeout),
                    state: sender,
                },
            );
        }
        self.inner.wake.notify_one();

        debug!(tx_id = %tx_id, timeout_ms = timeout.as_millis() as u64, "[lc-03] Awaiting commit");
        Ok(CommitFuture::new(tx_id, receiver))
    }

    /// Transactions still awaiting an outcome.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for CommitWaiter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventPublisher, InMemoryEventFeed};
    use shared_types::{NodeId, TransactionEvent, ValidationCode};

    fn block(channel: &str, number: u64, txs: &[(&str, ValidationCode)]) -> BlockEvent {
        BlockEvent {
            channel: ChannelId::new(channel),
            block_number: number,
            source: NodeId::new("peer0.org1"),
            transactions: txs
                .iter()
                .map(|(id, code)| TransactionEvent {
                    tx_id: TransactionId::from(*id),
                    validation_code: *code,
                    chaincode_events: Vec::new(),
                })
                .collect(),
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_event_commits_once() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let mut future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            )
            .unwrap();

        feed.publish(block("mychannel", 5, &[("tx1", ValidationCode::Valid)]))
            .await;
        assert_eq!(future.wait().await, CommitState::Committed { block_number: 5 });

        // A second event for the same id changes nothing.
        feed.publish(block(
            "mychannel",
            6,
            &[("tx1", ValidationCode::DuplicateTxId)],
        ))
        .await;
        settle().await;

        assert_eq!(future.state(), CommitState::Committed { block_number: 5 });
        assert_eq!(waiter.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_event_carries_code() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            )
            .unwrap();

        feed.publish(block(
            "mychannel",
            9,
            &[("other", ValidationCode::Valid), ("tx1", ValidationCode::MvccReadConflict)],
        ))
        .await;

        assert!(matches!(
            future.into_result().await,
            Err(SubmissionError::Invalid {
                code: ValidationCode::MvccReadConflict,
                block_number: 9,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_event_is_ignored() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let mut future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(2),
            )
            .unwrap();

        let state = future.wait().await;
        match state {
            CommitState::TimedOut { waited } => assert!(waited >= Duration::from_secs(2)),
            other => panic!("expected timeout, got {other:?}"),
        }

        feed.publish(block("mychannel", 3, &[("tx1", ValidationCode::Valid)]))
            .await;
        settle().await;

        assert_eq!(future.state(), state);
        assert!(waiter.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_registered_later_fires_first() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let slow = waiter
            .register(
                TransactionId::from("slow"),
                ChannelId::new("mychannel"),
                Duration::from_secs(60),
            )
            .unwrap();
        settle().await;
        let mut fast = waiter
            .register(
                TransactionId::from("fast"),
                ChannelId::new("mychannel"),
                Duration::from_secs(1),
            )
            .unwrap();

        assert!(matches!(fast.wait().await, CommitState::TimedOut { .. }));
        assert_eq!(slow.state(), CommitState::Pending);
        assert_eq!(waiter.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_channel_is_ignored() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            )
            .unwrap();

        feed.publish(block("otherchannel", 1, &[("tx1", ValidationCode::Valid)]))
            .await;
        settle().await;

        assert_eq!(future.state(), CommitState::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let _first = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            )
            .unwrap();

        assert!(matches!(
            waiter.register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            ),
            Err(SubmissionError::DuplicateTransaction { .. })
        ));
    }

    #[tokio::test]
    async fn test_feed_closed_resolves_pending_as_unknown() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let mut future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::from_secs(300),
            )
            .unwrap();

        drop(feed);

        assert!(matches!(future.wait().await, CommitState::TimedOut { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_waits_for_event() {
        let feed = InMemoryEventFeed::new();
        let waiter = CommitWaiter::spawn(&feed);
        let mut future = waiter
            .register(
                TransactionId::from("tx1"),
                ChannelId::new("mychannel"),
                Duration::MAX,
            )
            .unwrap();

        tokio::time::advance(Duration::from_secs(86_400)).await;
        settle().await;
        assert_eq!(future.state(), CommitState::Pending);
        assert_eq!(waiter.pending_count(), 1);

        feed.publish(block("mychannel", 3, &[("tx1", ValidationCode::Valid)]))
            .await;
        assert_eq!(future.wait().await, CommitState::Committed { block_number: 3 });
    }
}
