//! # Node Directory Port
//!
//! Resolves named endorsing and ordering nodes to reachable endpoints and
//! their transport properties. Consumed read-only by the aggregator and the
//! submitter; populated externally (network config file).

use crate::entities::{ChannelId, MspId, NodeId};
use std::collections::BTreeSet;
use std::time::Duration;

/// Role a node plays on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeerRole {
    /// Executes and signs proposals.
    EndorsingPeer,
    /// Answers contract queries.
    ChaincodeQuery,
    /// Answers ledger (block / transaction) queries.
    LedgerQuery,
    /// Delivers block events.
    EventSource,
    /// Accepts transaction envelopes for ordering.
    Orderer,
}

impl PeerRole {
    /// Every role a regular peer takes by default.
    pub fn all_peer_roles() -> BTreeSet<PeerRole> {
        [
            PeerRole::EndorsingPeer,
            PeerRole::ChaincodeQuery,
            PeerRole::LedgerQuery,
            PeerRole::EventSource,
        ]
        .into_iter()
        .collect()
    }
}

/// Transport-layer settings for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportProperties {
    /// Per-request deadline; the effective deadline is the minimum of this and
    /// the caller's wait budget.
    pub request_timeout: Duration,
    /// Largest message the node accepts, in bytes.
    pub max_message_size: usize,
    /// Keep-alive interval, if the connection should be kept warm.
    pub keep_alive: Option<Duration>,
}

impl Default for TransportProperties {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_message_size: 100 * 1024 * 1024,
            keep_alive: Some(Duration::from_secs(60)),
        }
    }
}

/// A resolved node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    pub id: NodeId,
    pub url: String,
    /// Organisation running this node.
    pub msp_id: MspId,
    pub roles: BTreeSet<PeerRole>,
    pub transport: TransportProperties,
}

impl NodeEndpoint {
    pub fn has_role(&self, role: PeerRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Read-only lookup of nodes by name, channel and role.
pub trait NodeDirectory: Send + Sync {
    /// Resolve a single node by name.
    fn endpoint(&self, node: &NodeId) -> Option<NodeEndpoint>;

    /// Peers joined to `channel` that carry `role`.
    fn peers(&self, channel: &ChannelId, role: PeerRole) -> Vec<NodeEndpoint>;

    /// Ordering nodes serving `channel`.
    fn orderers(&self, channel: &ChannelId) -> Vec<NodeEndpoint>;
}
