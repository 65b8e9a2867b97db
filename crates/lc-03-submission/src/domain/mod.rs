//! Domain model: envelopes and commit state

pub mod commit;
pub mod envelope;
