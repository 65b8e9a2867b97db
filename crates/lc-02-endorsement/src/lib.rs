//! # lc-02-endorsement
//!
//! Decides whether the collected proposal responses may be submitted.
//!
//! ## Pipeline
//!
//! ```text
//! CollectedResponses
//!        │
//!        ▼
//!  ┌───────────┐  key = (status, payload, rw-set digest)
//!  │  group()  │──────────────────────────────────────────┐
//!  └───────────┘                                          │
//!        │ Vec<ConsistencySet>, largest first             │
//!        ▼                                                │
//!  ┌───────────────────┐   >1 success group  → InconsistentResponses
//!  │  PolicyEvaluator  │   no usable group   → InsufficientEndorsements
//!  │   + policy        │   below minimum     → InsufficientEndorsements
//!  └───────────────────┘   predicate fails   → InsufficientEndorsements
//!        │
//!        ▼
//!  EndorsementDecision { accepted, satisfied, reason }
//! ```
//!
//! Disagreement is never resolved by majority. Two success groups with
//! different results fail the decision no matter how lopsided they are.
//!
//! ## Policies
//!
//! The evaluator only knows the [`EndorsementPolicy`] trait. Built-ins:
//! [`AgreeingThreshold`], [`DistinctOrganizations`], [`ExactSigners`] and the
//! YAML-described [`SignaturePolicy`]. A [`PolicyStore`] maps contracts to
//! policies.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::memory_store::InMemoryPolicyStore;
pub use domain::consistency::{group, ConsistencySet};
pub use domain::decision::{DecisionReason, EndorsementDecision};
pub use domain::policy::{AgreeingThreshold, DistinctOrganizations, EndorsementPolicy, ExactSigners};
pub use domain::signature_policy::{PolicyDescriptor, Principal, PrincipalRole, SignaturePolicy};
pub use error::{EndorsementError, EndorsementResult};
pub use ports::inbound::EndorsementEvaluator;
pub use ports::outbound::PolicyStore;
pub use service::PolicyEvaluator;
