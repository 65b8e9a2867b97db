//! # Transaction Submitter
//!
//! Order of work in `submit`:
//!
//! 1. Build the envelope. An unsatisfied decision fails here, before any
//!    registration or I/O.
//! 2. Register the transaction id with the commit waiter, so that a commit
//!    event can never arrive before anyone is listening.
//! 3. Spawn the broadcast to every orderer and return the pending future.
//!
//! The broadcast is best effort. Failures are logged per orderer and never
//! fail the submission; the commit waiter alone decides the outcome.

use crate::domain::commit::CommitFuture;
use crate::domain::envelope::TransactionEnvelope;
use crate::error::{SubmissionError, SubmissionResult};
use crate::ports::inbound::TransactionSubmission;
use crate::ports::outbound::OrdererClient;
use crate::service::waiter::CommitWaiter;
use futures::future::join_all;
use lc_01_proposal::SignedProposal;
use lc_02_endorsement::EndorsementDecision;
use shared_types::{IdentityProvider, NodeEndpoint, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Best-effort envelope broadcaster backed by a [`CommitWaiter`].
pub struct TransactionSubmitter<O: OrdererClient + ?Sized + 'static> {
    orderer: Arc<O>,
    waiter: Arc<CommitWaiter>,
    identity: Arc<dyn IdentityProvider>,
}

impl<O: OrdererClient + ?Sized + 'static> TransactionSubmitter<O> {
    pub fn new(
        orderer: Arc<O>,
        waiter: Arc<CommitWaiter>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            orderer,
            waiter,
            identity,
        }
    }

    pub fn waiter(&self) -> &Arc<CommitWaiter> {
        &self.waiter
    }

    fn broadcast(&self, envelope: TransactionEnvelope, orderers: Vec<NodeEndpoint>) {
        let client = Arc::clone(&self.orderer);

        tokio::spawn(async move {
            let sends = orderers
                .iter()
                .map(|orderer| send_one(client.as_ref(), orderer, &envelope));
            let results = join_all(sends).await;

            let mut accepted = 0usize;
            for (orderer, result) in orderers.iter().zip(results) {
                match result {
                    Ok(()) => {
                        accepted += 1;
                        debug!(
                            tx_id = %envelope.tx_id(),
                            orderer = %orderer.id,
                            "[lc-03] Envelope accepted by orderer"
                        );
                    }
                    Err(e) => warn!(
                        tx_id = %envelope.tx_id(),
                        orderer = %orderer.id,
                        error = %e,
                        "[lc-03] Orderer broadcast failed"
                    ),
                }
            }

            if accepted == 0 {
                warn!(
                    tx_id = %envelope.tx_id(),
                    orderers = orderers.len(),
                    "[lc-03] No orderer accepted the envelope, commit is unlikely"
                );
            } else {
                info!(
                    tx_id = %envelope.tx_id(),
                    accepted,
                    orderers = orderers.len(),
                    "[lc-03] Envelope broadcast"
                );
            }
        });
    }
}

async fn send_one<O: OrdererClient + ?Sized>(
    client: &O,
    orderer: &NodeEndpoint,
    envelope: &TransactionEnvelope,
) -> Result<(), TransportError> {
    let size = envelope.encoded_len();
    if size > orderer.transport.max_message_size {
        return Err(TransportError::MessageTooLarge {
            node: orderer.id.clone(),
            size,
            limit: orderer.transport.max_message_size,
        });
    }

    let budget = orderer.transport.request_timeout;
    timeout(budget, client.broadcast(orderer, envelope))
        .await
        .unwrap_or_else(|_| {
            Err(TransportError::Timeout {
                node: orderer.id.clone(),
                elapsed_ms: budget.as_millis() as u64,
            })
        })
}

impl<O: OrdererClient + ?Sized + 'static> TransactionSubmission for TransactionSubmitter<O> {
    fn submit(
        &self,
        decision: &EndorsementDecision,
        proposal: &SignedProposal,
        orderers: &[NodeEndpoint],
        commit_wait: Duration,
    ) -> SubmissionResult<CommitFuture> {
        let envelope =
            TransactionEnvelope::from_decision(decision, proposal, self.identity.as_ref())?;

        if orderers.is_empty() {
            return Err(SubmissionError::NoOrderers {
                channel: envelope.channel().to_string(),
            });
        }

        let future = self.waiter.register(
            envelope.tx_id().clone(),
            envelope.channel().clone(),
            commit_wait,
        )?;

        info!(
            tx_id = %envelope.tx_id(),
            channel = %envelope.channel(),
            endorsements = envelope.endorsements().len(),
            "[lc-03] Submitting transaction"
        );
        self.broadcast(envelope, orderers.to_vec());
        Ok(future)
    }
}
