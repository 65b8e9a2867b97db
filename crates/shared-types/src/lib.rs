//! # Shared Types Crate
//!
//! Identifiers, ledger event types and collaborator ports shared by the
//! ledger-client pipeline crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here (transaction ids, contract ids, digests, events).
//! - **Read-only events**: `BlockEvent` / `ChaincodeEvent` are produced by the
//!   external ledger feed; the pipeline only routes them.
//! - **Collaborators as ports**: the node directory and the signing identity
//!   are traits so the orchestration logic never owns global network state.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod directory;
pub mod entities;
pub mod errors;
pub mod events;
pub mod identity;

pub use directory::{NodeDirectory, NodeEndpoint, PeerRole, TransportProperties};
pub use entities::*;
pub use errors::TransportError;
pub use events::{BlockEvent, ChaincodeEvent, TransactionEvent, ValidationCode};
pub use identity::{IdentityProvider, SigningIdentity};
