//! Listener handles and callbacks

use crate::domain::matcher::PatternMatcher;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use shared_types::{BlockEvent, ChaincodeEvent, ChannelId};
use std::cell::Cell;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// What a callback returns. An `Err` is logged and counted, nothing more.
pub type CallbackResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Invoked once per block on the listener's channel.
pub type BlockCallback = Arc<dyn Fn(&BlockEvent) -> CallbackResult + Send + Sync>;

/// Invoked once per matching contract event, with the listener's own handle.
pub type ChaincodeCallback =
    Arc<dyn Fn(&ListenerHandle, &BlockEvent, &ChaincodeEvent) -> CallbackResult + Send + Sync>;

/// Opaque, unique listener handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(Uuid);

impl ListenerHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two listener flavours.
#[derive(Clone)]
pub enum ListenerKind {
    Block(BlockCallback),
    Chaincode {
        contract: Arc<dyn PatternMatcher>,
        event: Arc<dyn PatternMatcher>,
        callback: ChaincodeCallback,
    },
}

impl ListenerKind {
    pub fn tag(&self) -> ListenerKindTag {
        match self {
            Self::Block(_) => ListenerKindTag::Block,
            Self::Chaincode { .. } => ListenerKindTag::Chaincode,
        }
    }
}

/// A listener flavour without its callback and patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKindTag {
    Block,
    Chaincode,
}

impl fmt::Display for ListenerKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Chaincode => f.write_str("chaincode event"),
        }
    }
}

impl fmt::Debug for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(_) => f.write_str("Block"),
            Self::Chaincode {
                contract, event, ..
            } => f
                .debug_struct("Chaincode")
                .field("contract", contract)
                .field("event", event)
                .finish_non_exhaustive(),
        }
    }
}

/// Held while a callback runs.
pub(crate) type ActiveGuard<'a> = ReentrantMutexGuard<'a, Cell<bool>>;

/// One registered listener.
///
/// The `active` flag sits behind a reentrant lock. Dispatch holds it from the
/// flag check until the callback returns, so `deactivate` on another thread
/// waits for a running invocation. The same thread (a callback removing its
/// own listener) re-enters without blocking.
#[derive(Debug)]
pub(crate) struct Listener {
    pub handle: ListenerHandle,
    /// Registration order, used to dispatch deterministically.
    pub seq: u64,
    pub channel: ChannelId,
    pub kind: ListenerKind,
    active: ReentrantMutex<Cell<bool>>,
}

impl Listener {
    pub fn new(handle: ListenerHandle, seq: u64, channel: ChannelId, kind: ListenerKind) -> Self {
        Self {
            handle,
            seq,
            channel,
            kind,
            active: ReentrantMutex::new(Cell::new(true)),
        }
    }

    /// Lock the flag for one invocation. `None` once deactivated.
    pub fn enter(&self) -> Option<ActiveGuard<'_>> {
        let guard = self.active.lock();
        if guard.get() {
            Some(guard)
        } else {
            None
        }
    }

    /// Clear the flag, waiting for an invocation running on another thread.
    pub fn deactivate(&self) {
        self.active.lock().set(false);
    }
}
