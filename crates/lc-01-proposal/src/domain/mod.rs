//! Domain model for proposals and peer responses

pub mod proposal;
pub mod response;
