//! Fetcher state machine and change fingerprinting

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::error::FetchError;

/// Observable lifecycle state of one fetcher.
///
/// `loading` excludes a terminal transition at any instant: a fetcher that is
/// loading settles into exactly one of `loaded` or `error` when its cycle
/// completes. A failed cycle leaves the previous `loaded` marker (and any
/// cached results) in place.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// A cycle is in flight
    pub loading: bool,
    /// When the fetcher last completed successfully
    pub loaded: Option<DateTime<Utc>>,
    /// The most recent failure, cleared on the next attempt
    pub error: Option<FetchError>,
}

/// Uniform observable surface every fetcher exposes to the UI layer
pub trait Loadable {
    /// A cycle is in flight
    fn loading(&self) -> bool;

    /// When the fetcher last completed successfully
    fn loaded(&self) -> Option<DateTime<Utc>>;

    /// The most recent failure
    fn error(&self) -> Option<FetchError>;

    /// Display title for the fetcher
    fn title(&self) -> String;
}

/// Shared state-machine core: the at-most-one-in-flight guard, terminal
/// transitions, and the change-notification channel.
pub struct FetchCore {
    state: Mutex<FetchState>,
    notify: watch::Sender<u64>,
}

impl FetchCore {
    /// Fresh, never-loaded core
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: Mutex::new(FetchState::default()),
            notify,
        }
    }

    /// Try to start a cycle. Returns false (and changes nothing) while one is
    /// already in flight.
    pub fn begin(&self) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if state.loading {
                return false;
            }
            state.loading = true;
            state.error = None;
        }
        self.bump();
        true
    }

    /// Settle the in-flight cycle into exactly one terminal state
    pub fn finish(&self, outcome: Result<(), FetchError>) {
        {
            let mut state = self.state.lock().unwrap();
            state.loading = false;
            match outcome {
                Ok(()) => {
                    state.loaded = Some(Utc::now());
                    state.error = None;
                }
                Err(err) => state.error = Some(err),
            }
        }
        self.bump();
    }

    /// Emit a change notification
    pub fn bump(&self) {
        self.notify.send_modify(|version| *version += 1);
    }

    /// Subscribe to change notifications (a version counter)
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Snapshot the current state
    pub fn snapshot(&self) -> FetchState {
        self.state.lock().unwrap().clone()
    }

    /// Whether a cycle is in flight
    pub fn loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    /// Last successful completion stamp
    pub fn loaded(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().loaded
    }

    /// Most recent failure
    pub fn error(&self) -> Option<FetchError> {
        self.state.lock().unwrap().error.clone()
    }
}

impl Default for FetchCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint of the last known shape of a remote response.
///
/// Compared by equality only; used to skip the write/re-read half of a cycle
/// when a refresh produced nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeHash([u8; 32]);

impl ChangeHash {
    /// Hash a serializable remote payload. Returns `None` if the payload
    /// cannot be encoded, which callers treat as "always changed".
    pub fn of<T: Serialize>(value: &T) -> Option<Self> {
        let bytes = serde_json::to_vec(value).ok()?;
        Some(Self(Sha256::digest(&bytes).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_guards_reentry() {
        let core = FetchCore::new();
        assert!(core.begin());
        assert!(!core.begin());
        core.finish(Ok(()));
        assert!(core.begin());
    }

    #[test]
    fn test_finish_settles_exactly_one_terminal_state() {
        let core = FetchCore::new();
        core.begin();
        core.finish(Ok(()));
        let state = core.snapshot();
        assert!(!state.loading);
        assert!(state.loaded.is_some());
        assert!(state.error.is_none());

        core.begin();
        core.finish(Err(FetchError::network("offline")));
        let state = core.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_some());
        // A failure keeps the previous loaded marker.
        assert!(state.loaded.is_some());
    }

    #[test]
    fn test_transitions_notify_observers() {
        let core = FetchCore::new();
        let watcher = core.subscribe();
        let before = *watcher.borrow();
        core.begin();
        core.finish(Ok(()));
        assert!(*watcher.borrow() > before);
    }

    #[test]
    fn test_change_hash_equality() {
        let a = ChangeHash::of(&vec!["app", "calvin"]).unwrap();
        let b = ChangeHash::of(&vec!["app", "calvin"]).unwrap();
        let c = ChangeHash::of(&vec!["app", "calvin", "newuser"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
