//! # lc-04-event-registry
//!
//! Process-wide table of block listeners and contract-event listeners.
//!
//! ```text
//!   register / unregister                 event feed
//!          │ (writers)                        │
//!          ▼                                  ▼
//!  ┌──────────────────────┐  snapshot  ┌──────────────┐
//!  │ RwLock<Arc<HashMap>> │──────────→ │ dispatch loop│──→ callback (isolated)
//!  └──────────────────────┘            └──────────────┘──→ callback (isolated)
//! ```
//!
//! - Writers replace the map; the dispatch loop clones the `Arc` and works
//!   on a consistent snapshot.
//! - Every listener carries an `active` flag cleared by `unregister`. Dispatch
//!   holds the flag's lock from the check until the callback returns, so
//!   `unregister` on another thread waits for a running invocation. Once it
//!   returns, the callback is not running and never starts again.
//! - A callback that returns an error or panics is logged and counted; the
//!   remaining listeners still run and the loop keeps going.
//!
//! Patterns go through the [`PatternMatcher`] trait so tests can use exact or
//! match-all matchers instead of regular expressions.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod service;

pub use domain::listener::{
    BlockCallback, CallbackResult, ChaincodeCallback, ListenerHandle, ListenerKind,
    ListenerKindTag,
};
pub use domain::matcher::{AnyMatcher, ExactMatcher, PatternMatcher, RegexMatcher};
pub use error::{RegistryError, RegistryResult};
pub use service::{DispatchReport, EventRegistry, RegistryStats};
