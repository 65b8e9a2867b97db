//! Driven ports (Outbound dependencies)

use crate::domain::proposal::SignedProposal;
use crate::domain::response::ProposalResponse;
use async_trait::async_trait;
use shared_types::{NodeEndpoint, TransportError};

/// Sends one signed proposal to one endorsing peer.
///
/// Implementations own the wire transport. They must not retry; the
/// aggregator applies the deadline and the caller decides on retries.
#[async_trait]
pub trait PeerProposalClient: Send + Sync {
    /// # Errors
    ///
    /// `TransportError` when the node is unreachable or its answer cannot be
    /// decoded. A contract-level failure is a response with an error status,
    /// not a transport error.
    async fn send_proposal(
        &self,
        node: &NodeEndpoint,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError>;
}
