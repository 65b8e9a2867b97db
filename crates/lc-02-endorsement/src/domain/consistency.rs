//! # Consistency Grouper
//!
//! Partitions responses into equivalence classes. Two responses are in the
//! same class iff they have the same status code, byte-identical payload and
//! the same read/write-set digest.
//!
//! The output does not depend on input order: members are sorted by origin
//! node, and sets are sorted by size (largest first) and then by key.

use lc_01_proposal::{ProposalResponse, ResponseStatus};
use serde::{Deserialize, Serialize};
use shared_types::{Digest, MspId, NodeId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    status: ResponseStatus,
    payload: Vec<u8>,
    rw_set_digest: Digest,
}

impl GroupKey {
    fn of(response: &ProposalResponse) -> Self {
        Self {
            status: response.status,
            payload: response.payload.clone(),
            rw_set_digest: response.rw_set_digest,
        }
    }
}

/// Responses that agree byte for byte on their result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencySet {
    status: ResponseStatus,
    payload: Vec<u8>,
    rw_set_digest: Digest,
    responses: Vec<ProposalResponse>,
}

impl ConsistencySet {
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_digest(&self) -> Digest {
        Digest::of(&self.payload)
    }

    pub fn rw_set_digest(&self) -> Digest {
        self.rw_set_digest
    }

    pub fn responses(&self) -> &[ProposalResponse] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// A group of success-status responses. Error-status groups are
    /// degenerate: they never endorse anything.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Responses whose signature was verified by the transport layer.
    pub fn verified(&self) -> impl Iterator<Item = &ProposalResponse> {
        self.responses.iter().filter(|r| r.verified)
    }

    /// Verified endorsing nodes.
    pub fn signers(&self) -> BTreeSet<NodeId> {
        self.verified().map(|r| r.origin.clone()).collect()
    }

    /// Organisations behind the verified endorsements.
    pub fn organizations(&self) -> BTreeSet<MspId> {
        self.verified().map(|r| r.organization.clone()).collect()
    }

    /// Short form for logs: `status/payload-digest/rw-digest x size`.
    pub fn summary(&self) -> String {
        format!(
            "{}/{}/{} x{}",
            self.status,
            self.payload_digest(),
            self.rw_set_digest,
            self.len()
        )
    }
}

/// Partition `responses` into consistency sets.
pub fn group<'a, I>(responses: I) -> Vec<ConsistencySet>
where
    I: IntoIterator<Item = &'a ProposalResponse>,
{
    let mut classes: BTreeMap<GroupKey, Vec<ProposalResponse>> = BTreeMap::new();
    for response in responses {
        classes
            .entry(GroupKey::of(response))
            .or_default()
            .push(response.clone());
    }

    let mut sets: Vec<ConsistencySet> = classes
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.origin.cmp(&b.origin));
            ConsistencySet {
                status: key.status,
                payload: key.payload,
                rw_set_digest: key.rw_set_digest,
                responses: members,
            }
        })
        .collect();

    // BTreeMap iteration already orders by key; a stable sort keeps that as
    // the tie-break.
    sets.sort_by(|a, b| b.len().cmp(&a.len()));
    sets
}
