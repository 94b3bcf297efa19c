//! Composite fetcher for everything known about one address

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{Client, Credential};
use crate::db::SharedDatabase;
use crate::error::FetchError;

use super::sources::{
    AddressListFetcher, AddressListKind, AddressListSource, IconFetcher, IconSource,
    NowPageFetcher, NowPageSource, PasteListFetcher, PasteListSource, ProfileFetcher,
    ProfileSource, PurlListFetcher, PurlListSource, StatuslogFetcher, StatuslogSource,
};
use super::state::Loadable;
use super::{ListFetcher, RecordFetcher};

/// Everything known about one address: profile, /now page, icon, pastebin,
/// PURLs, statuses, and the follow/block lists.
///
/// `perform` fans out to every child concurrently; no child's failure blocks
/// another's completion. Aggregate state is derived from the children and is
/// read-only.
pub struct AddressSummaryFetcher {
    address: String,
    profile: Arc<ProfileFetcher>,
    now: Arc<NowPageFetcher>,
    icon: Arc<IconFetcher>,
    pastes: Arc<PasteListFetcher>,
    purls: Arc<PurlListFetcher>,
    statuses: Arc<StatuslogFetcher>,
    following: Arc<AddressListFetcher>,
    blocked: Arc<AddressListFetcher>,
}

impl AddressSummaryFetcher {
    /// Build the summary and its children. The credential, when present,
    /// lets list children see unlisted content.
    pub fn new(
        address: &str,
        db: &SharedDatabase,
        client: &Arc<Client>,
        credential: Option<Credential>,
        limit: usize,
    ) -> Self {
        Self {
            address: address.to_string(),
            profile: Arc::new(RecordFetcher::new(
                ProfileSource::new(address),
                db.clone(),
                client.clone(),
            )),
            now: Arc::new(RecordFetcher::new(
                NowPageSource::new(address),
                db.clone(),
                client.clone(),
            )),
            icon: Arc::new(RecordFetcher::new(
                IconSource::new(address),
                db.clone(),
                client.clone(),
            )),
            pastes: Arc::new(ListFetcher::new(
                PasteListSource::new(address, credential.clone()),
                db.clone(),
                client.clone(),
                limit,
            )),
            purls: Arc::new(ListFetcher::new(
                PurlListSource::new(address, credential.clone()),
                db.clone(),
                client.clone(),
                limit,
            )),
            statuses: Arc::new(ListFetcher::new(
                StatuslogSource::for_address(address),
                db.clone(),
                client.clone(),
                limit,
            )),
            following: Arc::new(ListFetcher::new(
                AddressListSource::new(address, AddressListKind::Following, credential.clone()),
                db.clone(),
                client.clone(),
                limit,
            )),
            blocked: Arc::new(ListFetcher::new(
                AddressListSource::new(address, AddressListKind::Blocked, credential),
                db.clone(),
                client.clone(),
                limit,
            )),
        }
    }

    /// The address this summary covers
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Profile child
    pub fn profile(&self) -> &Arc<ProfileFetcher> {
        &self.profile
    }

    /// /now page child
    pub fn now(&self) -> &Arc<NowPageFetcher> {
        &self.now
    }

    /// Icon child
    pub fn icon(&self) -> &Arc<IconFetcher> {
        &self.icon
    }

    /// Pastebin child
    pub fn pastes(&self) -> &Arc<PasteListFetcher> {
        &self.pastes
    }

    /// PURLs child
    pub fn purls(&self) -> &Arc<PurlListFetcher> {
        &self.purls
    }

    /// Statuslog child
    pub fn statuses(&self) -> &Arc<StatuslogFetcher> {
        &self.statuses
    }

    /// Follow-list child
    pub fn following(&self) -> &Arc<AddressListFetcher> {
        &self.following
    }

    /// Block-list child
    pub fn blocked(&self) -> &Arc<AddressListFetcher> {
        &self.blocked
    }

    fn children(&self) -> [&dyn Loadable; 8] {
        [
            self.profile.as_ref(),
            self.now.as_ref(),
            self.icon.as_ref(),
            self.pastes.as_ref(),
            self.purls.as_ref(),
            self.statuses.as_ref(),
            self.following.as_ref(),
            self.blocked.as_ref(),
        ]
    }

    /// Fan out to every child concurrently. Sibling order is not guaranteed.
    pub async fn perform(&self) {
        tokio::join!(
            self.profile.update_if_needed(),
            self.now.update_if_needed(),
            self.icon.update_if_needed(),
            self.pastes.update_if_needed(),
            self.purls.update_if_needed(),
            self.statuses.update_if_needed(),
            self.following.update_if_needed(),
            self.blocked.update_if_needed(),
        );
    }

    /// Same as [`perform`](Self::perform): every child already guards its own
    /// in-flight cycle
    pub async fn update_if_needed(&self) {
        self.perform().await;
    }

    /// Whether all children have completed at least once
    pub fn all_loaded(&self) -> bool {
        self.children().iter().all(|child| child.loaded().is_some())
    }

    /// Whether there is anything to show for the address
    pub fn has_content(&self) -> bool {
        self.profile.has_content()
            || self.now.has_content()
            || !self.statuses.results().is_empty()
            || !self.pastes.results().is_empty()
            || !self.purls.results().is_empty()
    }

    /// Resolve when any child emits a change notification
    pub async fn changed(&self) {
        let mut profile = self.profile.subscribe();
        let mut now = self.now.subscribe();
        let mut icon = self.icon.subscribe();
        let mut pastes = self.pastes.subscribe();
        let mut purls = self.purls.subscribe();
        let mut statuses = self.statuses.subscribe();
        let mut following = self.following.subscribe();
        let mut blocked = self.blocked.subscribe();
        tokio::select! {
            _ = profile.changed() => {}
            _ = now.changed() => {}
            _ = icon.changed() => {}
            _ = pastes.changed() => {}
            _ = purls.changed() => {}
            _ = statuses.changed() => {}
            _ = following.changed() => {}
            _ = blocked.changed() => {}
        }
    }
}

impl Loadable for AddressSummaryFetcher {
    fn loading(&self) -> bool {
        self.children().iter().any(|child| child.loading())
    }

    fn loaded(&self) -> Option<DateTime<Utc>> {
        // Loaded only once every child is; stamp of the latest completion.
        self.children()
            .iter()
            .map(|child| child.loaded())
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .max()
    }

    fn error(&self) -> Option<FetchError> {
        self.children().iter().find_map(|child| child.error())
    }

    fn title(&self) -> String {
        self.address.clone()
    }
}
