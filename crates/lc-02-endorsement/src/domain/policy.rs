//! Endorsement policy predicates
//!
//! All built-in policies count verified endorsements only.

use crate::domain::consistency::ConsistencySet;
use shared_types::NodeId;
use std::collections::BTreeSet;
use std::fmt;

/// A predicate over the membership of one consistency set.
pub trait EndorsementPolicy: Send + Sync + fmt::Debug {
    /// Whether `set` carries enough endorsements.
    fn is_satisfied_by(&self, set: &ConsistencySet) -> bool;

    /// Lower bound on the number of endorsements that could ever satisfy
    /// this policy. Used to report a transport shortfall before the
    /// predicate runs.
    fn minimum_endorsers(&self) -> usize;

    /// Human readable form for logs and errors.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// At least `n` verified endorsements in the agreeing set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgreeingThreshold {
    pub n: usize,
}

impl AgreeingThreshold {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl EndorsementPolicy for AgreeingThreshold {
    fn is_satisfied_by(&self, set: &ConsistencySet) -> bool {
        set.verified().count() >= self.n
    }

    fn minimum_endorsers(&self) -> usize {
        self.n
    }

    fn describe(&self) -> String {
        format!(">= {} agreeing endorsers", self.n)
    }
}

/// Verified endorsements from at least `n` distinct organisations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistinctOrganizations {
    pub n: usize,
}

impl DistinctOrganizations {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl EndorsementPolicy for DistinctOrganizations {
    fn is_satisfied_by(&self, set: &ConsistencySet) -> bool {
        set.organizations().len() >= self.n
    }

    fn minimum_endorsers(&self) -> usize {
        self.n
    }

    fn describe(&self) -> String {
        format!(">= {} distinct organizations", self.n)
    }
}

/// The verified signers of the agreeing group must be exactly the listed
/// nodes: none missing, none extra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactSigners {
    pub signers: BTreeSet<NodeId>,
}

impl ExactSigners {
    pub fn new<I, S>(signers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signers: signers.into_iter().map(|s| NodeId::new(s)).collect(),
        }
    }
}

impl EndorsementPolicy for ExactSigners {
    fn is_satisfied_by(&self, set: &ConsistencySet) -> bool {
        set.signers() == self.signers
    }

    fn minimum_endorsers(&self) -> usize {
        self.signers.len()
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.signers.iter().map(NodeId::as_str).collect();
        format!("signed by [{}]", names.join(", "))
    }
}
