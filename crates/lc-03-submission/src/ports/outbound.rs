//! Driven ports (Outbound dependencies)

use crate::domain::envelope::TransactionEnvelope;
use async_trait::async_trait;
use shared_types::{NodeEndpoint, TransportError};

/// Hands one envelope to one ordering node.
///
/// An `Ok` only means the node accepted the envelope. Whether the
/// transaction commits is learned from block events.
#[async_trait]
pub trait OrdererClient: Send + Sync {
    async fn broadcast(
        &self,
        orderer: &NodeEndpoint,
        envelope: &TransactionEnvelope,
    ) -> Result<(), TransportError>;
}
