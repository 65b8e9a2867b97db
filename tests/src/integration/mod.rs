//! # Integration Flows
//!
//! Each module drives real pipeline crates end to end. Only the transports
//! (peers, orderers) are scripted.

#[cfg(test)]
mod fixtures;

pub mod commit_flows;
pub mod contract_flows;
pub mod endorsement_flows;
pub mod listener_flows;
