//! Error types for the event registry

use crate::domain::listener::{ListenerHandle, ListenerKindTag};
use thiserror::Error;

/// Registry failures. Callback failures are not errors of the registry; they
/// are logged and counted in the dispatch report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No live listener with this handle
    #[error("Unknown listener handle {0}")]
    UnknownHandle(ListenerHandle),

    /// Handle exists but belongs to the other listener kind
    #[error("Listener {0} is not a {1} listener")]
    WrongKind(ListenerHandle, ListenerKindTag),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
