//! Cache-backed single-entity fetcher

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Client;
use crate::db::SharedDatabase;
use crate::error::FetchError;

use super::state::{ChangeHash, FetchCore, Loadable};

/// Binds one record kind to its local reads/writes and its remote fetch.
///
/// A source never touches fetcher state; the generic [`RecordFetcher`] drives
/// the cycle and owns all observable state.
#[allow(async_fn_in_trait)]
pub trait RecordSource: Send + Sync {
    /// The cached record type
    type Output: Clone + Serialize + Send + Sync + 'static;

    /// Identity of the record. A blank key means the record has no valid
    /// identity and must never generate a network call.
    fn key(&self) -> &str;

    /// Display title for the fetcher
    fn title(&self) -> String;

    /// Read the record from the local store
    async fn read(&self, db: &SharedDatabase) -> Result<Option<Self::Output>, FetchError>;

    /// Fetch the record from the remote interface; `None` means not found
    async fn fetch(&self, client: &Client) -> Result<Option<Self::Output>, FetchError>;

    /// Overwrite the record in the local store
    async fn write(&self, db: &SharedDatabase, record: &Self::Output) -> Result<(), FetchError>;
}

/// Fetcher for a single cached record: read, publish cached, refresh remote,
/// persist, re-read. The local store is the single source of truth for what
/// observers see; the raw network response is never published directly.
pub struct RecordFetcher<S: RecordSource> {
    source: S,
    db: SharedDatabase,
    client: Arc<Client>,
    core: FetchCore,
    result: Mutex<Option<S::Output>>,
    last_hash: Mutex<Option<ChangeHash>>,
}

impl<S: RecordSource> RecordFetcher<S> {
    /// Create a fetcher over the shared store and client
    pub fn new(source: S, db: SharedDatabase, client: Arc<Client>) -> Self {
        Self {
            source,
            db,
            client,
            core: FetchCore::new(),
            result: Mutex::new(None),
            last_hash: Mutex::new(None),
        }
    }

    /// The currently published record, if any
    pub fn result(&self) -> Option<S::Output> {
        self.result.lock().unwrap().clone()
    }

    /// Derived "has content" signal
    pub fn has_content(&self) -> bool {
        self.result.lock().unwrap().is_some()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<u64> {
        self.core.subscribe()
    }

    /// Run one full cycle. No-op while a cycle is already in flight.
    pub async fn perform(&self) {
        if !self.core.begin() {
            return;
        }
        let outcome = self.cycle().await;
        if let Err(err) = &outcome {
            tracing::debug!(key = self.source.key(), %err, "record fetch failed");
        }
        self.core.finish(outcome);
    }

    /// Idempotent entry point, safe to call repeatedly from lifecycle events
    pub async fn update_if_needed(&self) {
        if self.core.loading() {
            return;
        }
        self.perform().await;
    }

    async fn cycle(&self) -> Result<(), FetchError> {
        if self.source.key().is_empty() {
            return Ok(());
        }

        // Serve whatever the cache already has before going to the network.
        if let Some(cached) = self.source.read(&self.db).await? {
            *self.result.lock().unwrap() = Some(cached);
            self.core.bump();
        }

        let Some(fetched) = self.source.fetch(&self.client).await? else {
            // Not found remotely: absent result, not an error.
            return Ok(());
        };

        let hash = ChangeHash::of(&fetched);
        if hash.is_some() && hash == *self.last_hash.lock().unwrap() {
            // Nothing new since the last cycle; skip the write and re-read.
            return Ok(());
        }

        self.source.write(&self.db, &fetched).await?;
        let persisted = self.source.read(&self.db).await?;
        *self.result.lock().unwrap() = persisted;
        *self.last_hash.lock().unwrap() = hash;
        self.core.bump();
        Ok(())
    }
}

impl<S: RecordSource> Loadable for RecordFetcher<S> {
    fn loading(&self) -> bool {
        self.core.loading()
    }

    fn loaded(&self) -> Option<DateTime<Utc>> {
        self.core.loaded()
    }

    fn error(&self) -> Option<FetchError> {
        self.core.error()
    }

    fn title(&self) -> String {
        self.source.title()
    }
}
