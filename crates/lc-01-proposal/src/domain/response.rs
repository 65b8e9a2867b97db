//! Peer responses and aggregated outcomes

use serde::{Deserialize, Serialize};
use shared_types::{ContractId, Digest, MspId, NodeId, TransactionId, TransportError};
use std::fmt;

/// Status code returned by a peer for a proposal.
///
/// Codes in `200..400` count as success, anything else is an error status
/// reported by the contract or the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResponseStatus(pub u32);

impl ResponseStatus {
    pub const SUCCESS: Self = Self(200);
    pub const BAD_REQUEST: Self = Self(400);
    pub const INTERNAL_ERROR: Self = Self(500);

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.0)
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One endorsing peer's answer to a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub origin: NodeId,
    /// Organisation of the endorsing peer.
    pub organization: MspId,
    /// Echoed transaction id; must match the proposal's.
    pub tx_id: TransactionId,
    pub status: ResponseStatus,
    pub message: String,
    pub payload: Vec<u8>,
    pub rw_set_digest: Digest,
    /// Contract that actually executed, as reported by the peer.
    pub contract: ContractId,
    /// Endorser signature over the response.
    pub signature: Vec<u8>,
    /// Whether the signature was verified by the transport layer.
    pub verified: bool,
}

impl ProposalResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Digest of the response payload.
    pub fn payload_digest(&self) -> Digest {
        Digest::of(&self.payload)
    }

    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Outcome of sending one proposal to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Responded(ProposalResponse),
    Failed(TransportError),
}

impl NodeOutcome {
    pub fn node(&self) -> &NodeId {
        match self {
            Self::Responded(r) => &r.origin,
            Self::Failed(e) => e.node(),
        }
    }

    pub fn response(&self) -> Option<&ProposalResponse> {
        match self {
            Self::Responded(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TransportError> {
        match self {
            Self::Responded(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// Every outcome of one fan-out, in node-set order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedResponses {
    pub tx_id: TransactionId,
    pub outcomes: Vec<NodeOutcome>,
}

impl CollectedResponses {
    pub fn new(tx_id: TransactionId, outcomes: Vec<NodeOutcome>) -> Self {
        Self { tx_id, outcomes }
    }

    pub fn responses(&self) -> impl Iterator<Item = &ProposalResponse> {
        self.outcomes.iter().filter_map(NodeOutcome::response)
    }

    pub fn transport_errors(&self) -> impl Iterator<Item = &TransportError> {
        self.outcomes.iter().filter_map(NodeOutcome::error)
    }

    /// Number of nodes queried.
    pub fn queried(&self) -> usize {
        self.outcomes.len()
    }

    pub fn response_count(&self) -> usize {
        self.responses().count()
    }

    pub fn failure_count(&self) -> usize {
        self.transport_errors().count()
    }

    /// Responses with a success status.
    pub fn successful(&self) -> impl Iterator<Item = &ProposalResponse> {
        self.responses().filter(|r| r.is_success())
    }

    /// Move the responses out, dropping transport errors.
    pub fn into_responses(self) -> Vec<ProposalResponse> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                NodeOutcome::Responded(r) => Some(r),
                NodeOutcome::Failed(_) => None,
            })
            .collect()
    }
}
