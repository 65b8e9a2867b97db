//! Domain model: consistency sets, policies and decisions

pub mod consistency;
pub mod decision;
pub mod policy;
pub mod signature_policy;
