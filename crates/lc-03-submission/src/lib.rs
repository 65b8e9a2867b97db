//! # lc-03-submission
//!
//! Turns a satisfied endorsement decision into a committed (or rejected)
//! transaction.
//!
//! ```text
//!  EndorsementDecision ──from_decision──→ TransactionEnvelope
//!                                              │
//!            ┌─────────────────────────────────┤
//!            │ 1. register tx id               │ 2. broadcast (spawned,
//!            ▼                                 ▼    best effort)
//!      ┌─────────────┐                   [orderer0] [orderer1] ...
//!      │ CommitWaiter│◀── BlockEvent ── event feed
//!      └─────────────┘
//!            │ single writer
//!            ▼
//!      CommitFuture: Pending → Committed | Invalid | TimedOut
//! ```
//!
//! `submit` returns as soon as the broadcast has been started. Orderer
//! acknowledgements never decide the outcome; only block events do.
//!
//! `TimedOut` means the local wait ended. The transaction may still commit
//! later, so callers must reconcile instead of treating it as a failure.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::commit::{CommitFuture, CommitState};
pub use domain::envelope::{Endorsement, TransactionEnvelope};
pub use error::{SubmissionError, SubmissionResult};
pub use ports::inbound::TransactionSubmission;
pub use ports::outbound::OrdererClient;
pub use service::submitter::TransactionSubmitter;
pub use service::waiter::CommitWaiter;
