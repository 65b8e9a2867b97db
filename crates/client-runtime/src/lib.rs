//! # Client Runtime
//!
//! Wires the pipeline crates into contract operations and channel event
//! listeners. The `client-runtime` binary is the entry point; this library
//! exposes the pieces for embedding and for tests.
//!
//! ```text
//!  client.toml ──ClientConfig──→ ClientContext (directory, identity, policies, timeouts)
//!                                      │
//!                                      ▼
//!  ContractService ── lc-01 fan-out ── lc-02 decision ── lc-03 submit + wait
//!  ChannelEvents   ── lc-04 registry ◀── event feed
//! ```
//!
//! ## Modules
//!
//! - `config` - TOML configuration with environment overrides
//! - `context` - Per-call client context
//! - `directory` - Static node directory built from the configuration
//! - `identity` - Local HMAC signing identity
//! - `contract` - Install, instantiate, upgrade, invoke and query
//! - `events` - Block and contract-event listeners
//! - `simulation` - In-process peers, orderer and ledger
//! - `metrics` - Prometheus metrics (`metrics` feature)

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod context;
pub mod contract;
pub mod directory;
pub mod error;
pub mod events;
pub mod identity;
pub mod metrics;
pub mod simulation;

pub use config::{ClientConfig, IdentityConfig, NetworkConfig, PolicyConfig, TimeoutConfig};
pub use context::ClientContext;
pub use contract::ContractService;
pub use directory::StaticNodeDirectory;
pub use error::{ConfigError, ConfigResult, ContractError, ContractResult};
pub use events::ChannelEvents;
pub use identity::LocalIdentity;
pub use simulation::{OrdererFault, PeerFault, SimulatedNetwork};
