//! Privileged account aggregate: authorized addresses, write operations, and
//! the bounded cache of per-address summaries

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use lru::LruCache;

use crate::api::{Client, Credential};
use crate::db::SharedDatabase;
use crate::error::FetchError;
use crate::models::{DirectoryEntry, NowPage, Paste, Profile, Purl, Status};

use super::sources::{AddressListKind, DirectoryFetcher, DirectorySource, StatuslogFetcher, StatuslogSource};
use super::state::{FetchCore, Loadable};
use super::summary::AddressSummaryFetcher;
use super::ListFetcher;

/// Default capacity of the summary-fetcher cache
pub const DEFAULT_SUMMARY_CAP: usize = 32;

/// The signed-in account: owns the credential, the directory and global
/// statuslog fetchers, and a bounded cache of address summaries.
///
/// Write operations check that the target address is one the account
/// controls before touching the network; an unauthorized write returns
/// [`FetchError::NotAuthorized`] without side effects.
pub struct AccountFetcher {
    credential: Credential,
    db: SharedDatabase,
    client: Arc<Client>,
    core: FetchCore,
    limit: usize,
    addresses: Mutex<Vec<String>>,
    directory: Arc<DirectoryFetcher>,
    statuslog: Arc<StatuslogFetcher>,
    summaries: Mutex<LruCache<String, Arc<AddressSummaryFetcher>>>,
}

impl AccountFetcher {
    /// Create the aggregate with the default summary-cache capacity
    pub fn new(
        credential: Credential,
        db: SharedDatabase,
        client: Arc<Client>,
        limit: usize,
    ) -> Self {
        Self::with_summary_cap(
            credential,
            db,
            client,
            limit,
            NonZeroUsize::new(DEFAULT_SUMMARY_CAP).unwrap(),
        )
    }

    /// Create the aggregate with an explicit summary-cache capacity
    pub fn with_summary_cap(
        credential: Credential,
        db: SharedDatabase,
        client: Arc<Client>,
        limit: usize,
        summary_cap: NonZeroUsize,
    ) -> Self {
        let directory = Arc::new(ListFetcher::new(
            DirectorySource,
            db.clone(),
            client.clone(),
            limit,
        ));
        let statuslog = Arc::new(ListFetcher::new(
            StatuslogSource::latest(),
            db.clone(),
            client.clone(),
            limit,
        ));
        Self {
            credential,
            db,
            client,
            core: FetchCore::new(),
            limit,
            addresses: Mutex::new(Vec::new()),
            directory,
            statuslog,
            summaries: Mutex::new(LruCache::new(summary_cap)),
        }
    }

    /// The addresses this account controls, as last fetched
    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }

    /// Whether the account controls the given address
    pub fn controls(&self, address: &str) -> bool {
        self.addresses.lock().unwrap().iter().any(|a| a == address)
    }

    /// The public address directory fetcher
    pub fn directory(&self) -> &Arc<DirectoryFetcher> {
        &self.directory
    }

    /// The service-wide statuslog fetcher
    pub fn statuslog(&self) -> &Arc<StatuslogFetcher> {
        &self.statuslog
    }

    /// The summary fetcher for an address.
    ///
    /// Repeat requests for the same address return the same instance while
    /// the entry stays in the bounded cache, so an entity never has two
    /// in-flight fetches from this aggregate.
    pub fn summary(&self, address: &str) -> Arc<AddressSummaryFetcher> {
        let mut cache = self.summaries.lock().unwrap();
        if let Some(found) = cache.get(address) {
            return found.clone();
        }
        let credential = self.controls(address).then(|| self.credential.clone());
        let summary = Arc::new(AddressSummaryFetcher::new(
            address,
            &self.db,
            &self.client,
            credential,
            self.limit,
        ));
        cache.put(address.to_string(), summary.clone());
        summary
    }

    /// Refresh the authorized address list plus the directory and statuslog,
    /// concurrently. No-op while already in flight.
    pub async fn perform(&self) {
        if !self.core.begin() {
            return;
        }
        let (outcome, (), ()) = tokio::join!(
            self.fetch_addresses(),
            self.directory.update_if_needed(),
            self.statuslog.update_if_needed(),
        );
        if let Err(err) = &outcome {
            tracing::debug!(%err, "account refresh failed");
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

    async fn fetch_addresses(&self) -> Result<(), FetchError> {
        let fetched = self
            .client
            .account_addresses(&self.credential)
            .await
            .map_err(FetchError::network)?;
        *self.addresses.lock().unwrap() = fetched;
        self.core.bump();
        Ok(())
    }

    fn require_control(&self, address: &str) -> Result<(), FetchError> {
        if self.controls(address) {
            Ok(())
        } else {
            Err(FetchError::not_authorized(address))
        }
    }

    // ==================== Writes ====================

    /// Save a profile page remotely and into the cache
    pub async fn save_profile(&self, profile: &Profile) -> Result<(), FetchError> {
        self.require_control(&profile.address)?;
        self.client
            .save_profile(profile, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .put_profile(profile)
            .map_err(FetchError::store)
    }

    /// Save a /now page remotely and into the cache
    pub async fn save_now_page(&self, page: &NowPage) -> Result<(), FetchError> {
        self.require_control(&page.address)?;
        self.client
            .save_now_page(page, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .put_now_page(page)
            .map_err(FetchError::store)
    }

    /// Save a paste remotely and into the cache
    pub async fn save_paste(&self, paste: &Paste) -> Result<(), FetchError> {
        self.require_control(&paste.owner)?;
        self.client
            .save_paste(paste, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .put_paste(paste)
            .map_err(FetchError::store)
    }

    /// Delete a paste remotely and from the cache
    pub async fn delete_paste(&self, owner: &str, title: &str) -> Result<(), FetchError> {
        self.require_control(owner)?;
        self.client
            .delete_paste(owner, title, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .delete_paste(owner, title)
            .map_err(FetchError::store)
    }

    /// Save a PURL remotely and into the cache
    pub async fn save_purl(&self, purl: &Purl) -> Result<(), FetchError> {
        self.require_control(&purl.owner)?;
        self.client
            .save_purl(purl, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .put_purl(purl)
            .map_err(FetchError::store)
    }

    /// Delete a PURL remotely and from the cache
    pub async fn delete_purl(&self, owner: &str, name: &str) -> Result<(), FetchError> {
        self.require_control(owner)?;
        self.client
            .delete_purl(owner, name, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .delete_purl(owner, name)
            .map_err(FetchError::store)
    }

    /// Post a status and cache what the service returned
    pub async fn post_status(
        &self,
        address: &str,
        content: &str,
        emoji: Option<&str>,
    ) -> Result<Status, FetchError> {
        self.require_control(address)?;
        let posted = self
            .client
            .post_status(address, content, emoji, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .put_status(&posted)
            .map_err(FetchError::store)?;
        Ok(posted)
    }

    /// Delete a status remotely and from the cache
    pub async fn delete_status(&self, address: &str, id: &str) -> Result<(), FetchError> {
        self.require_control(address)?;
        self.client
            .delete_status(address, id, &self.credential)
            .await
            .map_err(FetchError::network)?;
        self.db
            .lock()
            .await
            .delete_status(address, id)
            .map_err(FetchError::store)
    }

    // ==================== Follow / block ====================

    /// Add an address to the owner's follow list
    pub async fn follow(&self, owner: &str, target: &str) -> Result<(), FetchError> {
        self.mutate_list(owner, AddressListKind::Following, target, true)
            .await
    }

    /// Remove an address from the owner's follow list
    pub async fn unfollow(&self, owner: &str, target: &str) -> Result<(), FetchError> {
        self.mutate_list(owner, AddressListKind::Following, target, false)
            .await
    }

    /// Add an address to the owner's block list
    pub async fn block(&self, owner: &str, target: &str) -> Result<(), FetchError> {
        self.mutate_list(owner, AddressListKind::Blocked, target, true)
            .await
    }

    /// Remove an address from the owner's block list
    pub async fn unblock(&self, owner: &str, target: &str) -> Result<(), FetchError> {
        self.mutate_list(owner, AddressListKind::Blocked, target, false)
            .await
    }

    /// Two-phase optimistic list mutation: read the authoritative member set
    /// from the convention paste, swap the expected outcome into the list
    /// fetcher, write the paste remotely, keep the swap and persist locally
    /// on success, roll back on failure.
    async fn mutate_list(
        &self,
        owner: &str,
        kind: AddressListKind,
        target: &str,
        add: bool,
    ) -> Result<(), FetchError> {
        self.require_control(owner)?;

        let summary = self.summary(owner);
        let fetcher = match kind {
            AddressListKind::Following => summary.following(),
            AddressListKind::Blocked => summary.blocked(),
        };

        // The convention paste is the authoritative member set. The overlay
        // may hold a truncated page, or nothing at all if the list was never
        // loaded, and a union computed from it would clobber the remote list.
        let current: Vec<String> = self
            .client
            .paste(owner, kind.paste_title(), Some(&self.credential))
            .await
            .map_err(FetchError::network)?
            .map(|paste| paste.address_list())
            .unwrap_or_default();
        let mut next = current.clone();
        if add {
            if !next.iter().any(|a| a == target) {
                next.push(target.to_string());
            }
        } else {
            next.retain(|a| a != target);
        }
        if next == current {
            return Ok(());
        }

        let entries: Vec<DirectoryEntry> =
            next.iter().map(|address| DirectoryEntry::new(address)).collect();
        let previous = fetcher.replace_results(entries);

        let paste = Paste::from_address_list(owner, kind.paste_title(), &next);
        match self.client.save_paste(&paste, &self.credential).await {
            Ok(()) => self
                .db
                .lock()
                .await
                .put_paste(&paste)
                .map_err(FetchError::store),
            Err(err) => {
                fetcher.replace_results(previous);
                Err(FetchError::network(err))
            }
        }
    }
}

impl Loadable for AccountFetcher {
    fn loading(&self) -> bool {
        self.core.loading() || self.directory.loading() || self.statuslog.loading()
    }

    fn loaded(&self) -> Option<DateTime<Utc>> {
        self.core.loaded()
    }

    fn error(&self) -> Option<FetchError> {
        self.core
            .error()
            .or_else(|| self.directory.error())
            .or_else(|| self.statuslog.error())
    }

    fn title(&self) -> String {
        self.addresses
            .lock()
            .unwrap()
            .first()
            .cloned()
            .unwrap_or_else(|| "account".to_string())
    }
}
