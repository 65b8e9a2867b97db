//! # Ledger-Client Test Suite
//!
//! Cross-crate flows that no single pipeline crate can exercise alone.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs           # Scripted peers, recording orderer, identities
//!     ├── endorsement_flows.rs  # lc-01 fan-out → lc-02 decision
//!     ├── commit_flows.rs       # lc-02 decision → lc-03 submit → commit event
//!     ├── listener_flows.rs     # event feed → lc-04 registry
//!     └── contract_flows.rs     # client-runtime over the simulated network
//! tests/benches/
//! └── pipeline_benchmarks.rs    # grouping, policy evaluation, dispatch
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lc-tests
//!
//! # By flow
//! cargo test -p lc-tests integration::commit_flows
//!
//! # Benchmarks
//! cargo bench -p lc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
