//! # Error Types
//!
//! Errors shared by every crate that talks to a remote node.

use crate::entities::NodeId;
use thiserror::Error;

/// A node could not be reached or answered with something unusable.
///
/// Never retried by the pipeline itself; callers decide on retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, reset, or endpoint unknown.
    #[error("node {node} unreachable: {reason}")]
    Unreachable { node: NodeId, reason: String },

    /// No answer before the deadline.
    #[error("node {node} timed out after {elapsed_ms}ms")]
    Timeout { node: NodeId, elapsed_ms: u64 },

    /// The node answered but the message could not be decoded.
    #[error("malformed response from node {node}: {reason}")]
    Malformed { node: NodeId, reason: String },

    /// Message exceeds the node's configured size limit.
    #[error("message to node {node} is {size} bytes, limit is {limit}")]
    MessageTooLarge { node: NodeId, size: usize, limit: usize },
}

impl TransportError {
    /// The node this error is attributed to.
    pub fn node(&self) -> &NodeId {
        match self {
            Self::Unreachable { node, .. }
            | Self::Timeout { node, .. }
            | Self::Malformed { node, .. }
            | Self::MessageTooLarge { node, .. } => node,
        }
    }
}
