//! Ports (hexagonal architecture)
//!
//! - `inbound`: the API this crate offers (response collection)
//! - `outbound`: what it needs from the transport layer

pub mod inbound;
pub mod outbound;
