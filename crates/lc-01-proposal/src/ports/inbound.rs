//! Driving ports (Inbound API)

use crate::domain::proposal::SignedProposal;
use crate::domain::response::CollectedResponses;
use async_trait::async_trait;
use shared_types::NodeEndpoint;
use std::time::Duration;

/// Fan-out API consumed by the contract service.
#[async_trait]
pub trait ResponseCollector: Send + Sync {
    /// Send `proposal` to every node concurrently and wait at most
    /// `deadline` for all of them.
    ///
    /// Never fails as a whole: the result holds exactly one outcome per
    /// node in `nodes`, in the same order.
    async fn collect(
        &self,
        proposal: &SignedProposal,
        nodes: &[NodeEndpoint],
        deadline: Duration,
    ) -> CollectedResponses;
}
