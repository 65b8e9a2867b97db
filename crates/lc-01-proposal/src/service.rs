//! # Response Aggregator
//!
//! Fans a signed proposal out to a node set and joins the results.
//!
//! ## Deadline
//!
//! Every send runs under its own timer, so one slow peer never holds the
//! others back. The effective timer is the smaller of the caller's deadline
//! and the node's own `request_timeout`. A send that is still running when
//! its timer fires is dropped, which cancels it.
//!
//! ## Validation
//!
//! Before sending: the encoded proposal must fit the node's
//! `max_message_size`. After receiving: the response must echo the
//! proposal's transaction id. Either failure becomes a transport error for
//! that node.

use crate::domain::proposal::SignedProposal;
use crate::domain::response::{CollectedResponses, NodeOutcome};
use crate::ports::inbound::ResponseCollector;
use crate::ports::outbound::PeerProposalClient;
use async_trait::async_trait;
use futures::future::join_all;
use shared_types::{NodeEndpoint, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Concurrent proposal fan-out over a [`PeerProposalClient`].
pub struct ResponseAggregator<C: PeerProposalClient + ?Sized> {
    client: Arc<C>,
}

impl<C: PeerProposalClient + ?Sized> Clone for ResponseAggregator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: PeerProposalClient + ?Sized> ResponseAggregator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    async fn send_one(
        &self,
        proposal: &SignedProposal,
        node: &NodeEndpoint,
        deadline: Duration,
    ) -> NodeOutcome {
        let size = proposal.encoded_len();
        if size > node.transport.max_message_size {
            return NodeOutcome::Failed(TransportError::MessageTooLarge {
                node: node.id.clone(),
                size,
                limit: node.transport.max_message_size,
            });
        }

        let budget = deadline.min(node.transport.request_timeout);
        let started = Instant::now();

        match timeout(budget, self.client.send_proposal(node, proposal)).await {
            Err(_) => NodeOutcome::Failed(TransportError::Timeout {
                node: node.id.clone(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
            Ok(Err(e)) => NodeOutcome::Failed(e),
            Ok(Ok(response)) if &response.tx_id != proposal.tx_id() => {
                NodeOutcome::Failed(TransportError::Malformed {
                    node: node.id.clone(),
                    reason: format!(
                        "response for tx {} does not match proposal tx {}",
                        response.tx_id,
                        proposal.tx_id()
                    ),
                })
            }
            Ok(Ok(mut response)) => {
                // Responses are attributed to the node we asked, whatever the
                // peer claims.
                response.origin = node.id.clone();
                NodeOutcome::Responded(response)
            }
        }
    }
}

#[async_trait]
impl<C: PeerProposalClient + ?Sized> ResponseCollector for ResponseAggregator<C> {
    async fn collect(
        &self,
        proposal: &SignedProposal,
        nodes: &[NodeEndpoint],
        deadline: Duration,
    ) -> CollectedResponses {
        let tx_id = proposal.tx_id().clone();
        debug!(
            tx_id = %tx_id,
            kind = %proposal.proposal().kind(),
            nodes = nodes.len(),
            deadline_ms = deadline.as_millis() as u64,
            "[lc-01] Sending proposal"
        );

        let sends = nodes
            .iter()
            .map(|node| self.send_one(proposal, node, deadline));
        let outcomes = join_all(sends).await;

        for outcome in &outcomes {
            match outcome {
                NodeOutcome::Responded(r) => debug!(
                    tx_id = %tx_id,
                    node = %r.origin,
                    status = %r.status,
                    "[lc-01] Proposal response received"
                ),
                NodeOutcome::Failed(e) => warn!(
                    tx_id = %tx_id,
                    node = %e.node(),
                    error = %e,
                    "[lc-01] Proposal send failed"
                ),
            }
        }

        let collected = CollectedResponses::new(tx_id, outcomes);
        info!(
            tx_id = %collected.tx_id,
            queried = collected.queried(),
            responded = collected.response_count(),
            failed = collected.failure_count(),
            "[lc-01] Proposal fan-out complete"
        );
        collected
    }
}
