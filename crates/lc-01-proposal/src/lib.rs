//! # lc-01-proposal
//!
//! Proposal construction and concurrent fan-out to endorsing peers.
//!
//! ## Overview
//!
//! - **Proposal**: immutable description of one logical contract operation
//!   (install / instantiate / upgrade / invoke / query).
//! - **Peer Proposal Client**: outbound port that sends one signed proposal to
//!   one peer.
//! - **Response Aggregator**: sends the proposal to every selected peer
//!   concurrently and returns one outcome per peer, success or transport
//!   error, within a deadline.
//!
//! ```text
//! Proposal ──sign──→ SignedProposal ──collect──→ [peer0] [peer1] ... [peerN]
//!                                                   │      │           │
//!                                                   └──────┴─────┬─────┘
//!                                                                ▼
//!                                                      CollectedResponses
//!                                               (one NodeOutcome per peer)
//! ```
//!
//! Nothing is hidden: a peer that times out or returns garbage shows up as a
//! `NodeOutcome::Failed`, never silently dropped.
//!
//! ## Example
//!
//! ```rust,ignore
//! let proposal = Proposal::builder(OperationKind::Invoke, channel, contract)
//!     .function("invoke")
//!     .args(["a", "b", "10"])
//!     .build()?;
//! let signed = SignedProposal::sign(proposal, identity.as_ref())?;
//! let collected = aggregator.collect(&signed, &peers, Duration::from_secs(4)).await;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::proposal::{OperationKind, Proposal, ProposalBuilder, SignedProposal};
pub use domain::response::{CollectedResponses, NodeOutcome, ProposalResponse, ResponseStatus};
pub use error::{ProposalError, ProposalResult};
pub use ports::inbound::ResponseCollector;
pub use ports::outbound::PeerProposalClient;
pub use service::ResponseAggregator;
