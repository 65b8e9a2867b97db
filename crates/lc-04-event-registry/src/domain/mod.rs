//! Listener model and pattern matchers

pub mod listener;
pub mod matcher;
