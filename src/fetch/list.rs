//! Paginated, filterable, cache-backed list fetcher

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Client;
use crate::db::SharedDatabase;
use crate::error::FetchError;
use crate::models::Record;

use super::filters::{Filter, Selection, Sort};
use super::state::{ChangeHash, FetchCore, Loadable};

/// Binds one list kind to its paged local reads, its full remote fetch, and
/// its local writes.
///
/// `fetch` always returns the entire authoritative remote list; pagination is
/// a local-read optimization only.
#[allow(async_fn_in_trait)]
pub trait ListSource: Send + Sync {
    /// The cached item type
    type Item: Record + Clone + Serialize + Send + Sync + 'static;

    /// Display title for the fetcher
    fn title(&self) -> String;

    /// Read one page from the local store under the given selection
    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<Self::Item>, FetchError>;

    /// Fetch the full authoritative list from the remote interface
    async fn fetch(&self, client: &Client) -> Result<Vec<Self::Item>, FetchError>;

    /// Upsert every item into the local store
    async fn write(&self, db: &SharedDatabase, items: &[Self::Item]) -> Result<(), FetchError>;
}

/// Merge a freshly read page into the displayed list.
///
/// Items present in both keep their old position (scroll stability) with the
/// fresh payload swapped in; new items append in incoming order; items absent
/// from the incoming page are retained, stale but present.
pub fn reconcile<T: Record + Clone>(existing: &[T], incoming: Vec<T>) -> Vec<T> {
    let mut merged: Vec<T> = existing.to_vec();
    for item in incoming {
        let slot = merged
            .iter_mut()
            .find(|seen| seen.record_id() == item.record_id() && seen.owner() == item.owner());
        match slot {
            Some(seen) => *seen = item,
            None => merged.push(item),
        }
    }
    merged
}

struct ListState<T> {
    filters: Vec<Filter>,
    sort: Sort,
    /// Next page to read; `None` means no more pages
    page: Option<u32>,
    limit: usize,
    results: Vec<T>,
    /// Whether any remote refresh has ever completed
    ever_loaded: bool,
}

/// Fetcher for an ordered collection backed by the local cache.
///
/// Results are rebuilt, never mutated in place, on each reconciliation pass,
/// so concurrent observers never see a torn list.
pub struct ListFetcher<S: ListSource> {
    source: S,
    db: SharedDatabase,
    client: Arc<Client>,
    core: FetchCore,
    state: Mutex<ListState<S::Item>>,
    last_hash: Mutex<Option<ChangeHash>>,
}

impl<S: ListSource> ListFetcher<S> {
    /// Create a fetcher with the given page size
    pub fn new(source: S, db: SharedDatabase, client: Arc<Client>, limit: usize) -> Self {
        Self {
            source,
            db,
            client,
            core: FetchCore::new(),
            state: Mutex::new(ListState {
                filters: Vec::new(),
                sort: Sort::default(),
                page: Some(0),
                limit,
                results: Vec::new(),
                ever_loaded: false,
            }),
            last_hash: Mutex::new(None),
        }
    }

    /// Set the initial filters
    #[must_use]
    pub fn with_filters(self, filters: Vec<Filter>) -> Self {
        self.state.lock().unwrap().filters = filters;
        self
    }

    /// Set the initial sort
    #[must_use]
    pub fn with_sort(self, sort: Sort) -> Self {
        self.state.lock().unwrap().sort = sort;
        self
    }

    /// The currently displayed results
    pub fn results(&self) -> Vec<S::Item> {
        self.state.lock().unwrap().results.clone()
    }

    /// Active filters
    pub fn filters(&self) -> Vec<Filter> {
        self.state.lock().unwrap().filters.clone()
    }

    /// Active sort
    pub fn sort(&self) -> Sort {
        self.state.lock().unwrap().sort
    }

    /// Pagination cursor; `None` means no more pages
    pub fn page(&self) -> Option<u32> {
        self.state.lock().unwrap().page
    }

    /// Replace the filters; resets pagination and displayed results
    pub fn set_filters(&self, filters: Vec<Filter>) {
        {
            let mut state = self.state.lock().unwrap();
            state.filters = filters;
            state.page = Some(0);
            state.results = Vec::new();
        }
        self.core.bump();
    }

    /// Replace the sort; resets pagination and displayed results
    pub fn set_sort(&self, sort: Sort) {
        {
            let mut state = self.state.lock().unwrap();
            state.sort = sort;
            state.page = Some(0);
            state.results = Vec::new();
        }
        self.core.bump();
    }

    /// Swap in a new result list, returning the previous one.
    ///
    /// This is the optimistic-overlay hook: callers swap the expected outcome
    /// in before a remote write and swap the returned snapshot back if the
    /// write fails.
    pub fn replace_results(&self, items: Vec<S::Item>) -> Vec<S::Item> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            std::mem::replace(&mut state.results, items)
        };
        self.core.bump();
        previous
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<u64> {
        self.core.subscribe()
    }

    /// Read the next page from the local store and merge it into the
    /// displayed results.
    ///
    /// A full page advances the cursor; a short page ends pagination, except
    /// on page 0 before any remote refresh has completed (an empty cache is
    /// not the same as an empty list).
    pub async fn fetch_models(&self) -> Result<(), FetchError> {
        let (selection, page) = {
            let state = self.state.lock().unwrap();
            let Some(page) = state.page else {
                return Ok(());
            };
            let selection = Selection {
                filters: state.filters.clone(),
                sort: state.sort,
                limit: Some(state.limit),
                offset: page as usize * state.limit,
            };
            (selection, page)
        };

        let items = self.source.read(&self.db, &selection).await?;
        let count = items.len();

        {
            let mut state = self.state.lock().unwrap();
            state.results = reconcile(&state.results, items);
            state.page = if count == state.limit {
                Some(page + 1)
            } else if page == 0 && !state.ever_loaded {
                Some(0)
            } else {
                None
            };
        }
        self.core.bump();
        Ok(())
    }

    /// Run one full cycle. No-op while a cycle is already in flight.
    pub async fn perform(&self) {
        if !self.core.begin() {
            return;
        }
        let outcome = self.refresh().await;
        if let Err(err) = &outcome {
            tracing::debug!(title = %self.source.title(), %err, "list fetch failed");
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

    async fn refresh(&self) -> Result<(), FetchError> {
        // Serve the cached prefix first; a failed remote fetch below leaves
        // it visible. The pagination cursor only moves on explicit
        // fetch_models calls from the scroll path, so repeated refreshes
        // never grow the displayed list.
        self.reload().await?;

        let items = self.source.fetch(&self.client).await?;
        let hash = ChangeHash::of(&items);
        let changed = hash.is_none() || hash != *self.last_hash.lock().unwrap();

        if changed {
            self.source.write(&self.db, &items).await?;
            self.reload().await?;
            *self.last_hash.lock().unwrap() = hash;
        }

        self.state.lock().unwrap().ever_loaded = true;
        Ok(())
    }

    /// Re-read the displayed prefix after a remote write landed
    async fn reload(&self) -> Result<(), FetchError> {
        let selection = {
            let state = self.state.lock().unwrap();
            Selection {
                filters: state.filters.clone(),
                sort: state.sort,
                limit: Some(state.results.len().max(state.limit)),
                offset: 0,
            }
        };
        let fresh = self.source.read(&self.db, &selection).await?;
        {
            let mut state = self.state.lock().unwrap();
            state.results = reconcile(&state.results, fresh);
        }
        self.core.bump();
        Ok(())
    }
}

impl<S: ListSource> Loadable for ListFetcher<S> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn status(id: &str) -> Status {
        Status::new(id, "app", id)
    }

    #[test]
    fn test_reconcile_preserves_old_positions_and_appends_new() {
        let existing = vec![status("A"), status("B"), status("C")];
        let incoming = vec![status("B"), status("D"), status("A")];

        let merged = reconcile(&existing, incoming);
        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        // B and A keep their original slots, C stays (stale but present),
        // D appends.
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_reconcile_swaps_in_fresh_payloads() {
        let existing = vec![status("A")];
        let mut fresher = status("A");
        fresher.content = "updated".to_string();

        let merged = reconcile(&existing, vec![fresher]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content, "updated");
    }

    #[test]
    fn test_reconcile_identity_is_scoped_by_owner() {
        let existing = vec![Status::new("1", "app", "from app")];
        let merged = reconcile(&existing, vec![Status::new("1", "calvin", "from calvin")]);
        assert_eq!(merged.len(), 2);
    }
}
