//! Pattern matchers for contract names and event names

use crate::error::{RegistryError, RegistryResult};
use regex::Regex;
use std::fmt;

/// Decides whether a name is of interest.
pub trait PatternMatcher: Send + Sync + fmt::Debug {
    fn matches(&self, candidate: &str) -> bool;
}

/// Regular expression that must match the whole name.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    source: String,
    regex: Regex,
}

impl RegexMatcher {
    /// Compile `pattern`, anchored at both ends.
    pub fn new(pattern: &str) -> RegistryResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PatternMatcher for RegexMatcher {
    fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// Literal equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatcher(pub String);

impl ExactMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl PatternMatcher for ExactMatcher {
    fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

/// Matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyMatcher;

impl PatternMatcher for AnyMatcher {
    fn matches(&self, _candidate: &str) -> bool {
        true
    }
}
