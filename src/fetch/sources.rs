//! Concrete sources binding each record kind to the store and the remote
//! interface, plus type aliases for the fetchers built from them

use crate::api::{Client, Credential};
use crate::db::SharedDatabase;
use crate::error::FetchError;
use crate::models::{
    AddressIcon, BLOCKED_PASTE, DirectoryEntry, FOLLOWING_PASTE, NowPage, Paste, Profile, Purl,
    Status,
};

use super::filters::{Filter, Selection};
use super::list::{ListFetcher, ListSource};
use super::record::{RecordFetcher, RecordSource};

/// Fetcher for one address's profile page
pub type ProfileFetcher = RecordFetcher<ProfileSource>;
/// Fetcher for one address's /now page
pub type NowPageFetcher = RecordFetcher<NowPageSource>;
/// Fetcher for one address's icon
pub type IconFetcher = RecordFetcher<IconSource>;
/// Fetcher for a single paste
pub type PasteFetcher = RecordFetcher<PasteSource>;
/// Fetcher for a single PURL
pub type PurlFetcher = RecordFetcher<PurlSource>;
/// Fetcher for a single status
pub type StatusFetcher = RecordFetcher<StatusSource>;
/// Fetcher for the public address directory
pub type DirectoryFetcher = ListFetcher<DirectorySource>;
/// Fetcher for a statuslog (global or per address)
pub type StatuslogFetcher = ListFetcher<StatuslogSource>;
/// Fetcher for an address's pastebin
pub type PasteListFetcher = ListFetcher<PasteListSource>;
/// Fetcher for an address's PURLs
pub type PurlListFetcher = ListFetcher<PurlListSource>;
/// Fetcher for an address's follow or block list
pub type AddressListFetcher = ListFetcher<AddressListSource>;

/// Prepend an owner scope to a caller selection
fn scoped(selection: &Selection, owner: &str) -> Selection {
    let mut scoped = selection.clone();
    scoped
        .filters
        .insert(0, Filter::Owner(owner.to_string()));
    scoped
}

// ==================== Profile ====================

/// Source for an address's profile page
pub struct ProfileSource {
    address: String,
}

impl ProfileSource {
    /// Source for the given address
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

impl RecordSource for ProfileSource {
    type Output = Profile;

    fn key(&self) -> &str {
        &self.address
    }

    fn title(&self) -> String {
        format!("{}.profile", self.address)
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<Profile>, FetchError> {
        db.lock()
            .await
            .profile(&self.address)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<Profile>, FetchError> {
        client
            .profile(&self.address)
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, record: &Profile) -> Result<(), FetchError> {
        db.lock().await.put_profile(record).map_err(FetchError::store)
    }
}

// ==================== Now page ====================

/// Source for an address's /now page
pub struct NowPageSource {
    address: String,
}

impl NowPageSource {
    /// Source for the given address
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

impl RecordSource for NowPageSource {
    type Output = NowPage;

    fn key(&self) -> &str {
        &self.address
    }

    fn title(&self) -> String {
        format!("{}.now", self.address)
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<NowPage>, FetchError> {
        db.lock()
            .await
            .now_page(&self.address)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<NowPage>, FetchError> {
        client
            .now_page(&self.address)
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, record: &NowPage) -> Result<(), FetchError> {
        db.lock()
            .await
            .put_now_page(record)
            .map_err(FetchError::store)
    }
}

// ==================== Icon ====================

/// Source for an address's icon bytes
pub struct IconSource {
    address: String,
}

impl IconSource {
    /// Source for the given address
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

impl RecordSource for IconSource {
    type Output = AddressIcon;

    fn key(&self) -> &str {
        &self.address
    }

    fn title(&self) -> String {
        format!("{}.icon", self.address)
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<AddressIcon>, FetchError> {
        db.lock()
            .await
            .icon(&self.address)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<AddressIcon>, FetchError> {
        let bytes = client
            .icon(&self.address)
            .await
            .map_err(FetchError::network)?;
        Ok(bytes.map(|data| AddressIcon::new(&self.address, data)))
    }

    async fn write(&self, db: &SharedDatabase, record: &AddressIcon) -> Result<(), FetchError> {
        db.lock().await.put_icon(record).map_err(FetchError::store)
    }
}

// ==================== Single paste ====================

/// Source for one paste by owner and title
pub struct PasteSource {
    owner: String,
    title: String,
    key: String,
    credential: Option<Credential>,
}

impl PasteSource {
    /// Source for the given paste
    pub fn new(owner: &str, title: &str, credential: Option<Credential>) -> Self {
        let key = if owner.is_empty() || title.is_empty() {
            String::new()
        } else {
            format!("{owner}/{title}")
        };
        Self {
            owner: owner.to_string(),
            title: title.to_string(),
            key,
            credential,
        }
    }
}

impl RecordSource for PasteSource {
    type Output = Paste;

    fn key(&self) -> &str {
        &self.key
    }

    fn title(&self) -> String {
        self.key.clone()
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<Paste>, FetchError> {
        db.lock()
            .await
            .paste(&self.owner, &self.title)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<Paste>, FetchError> {
        client
            .paste(&self.owner, &self.title, self.credential.as_ref())
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, record: &Paste) -> Result<(), FetchError> {
        db.lock().await.put_paste(record).map_err(FetchError::store)
    }
}

// ==================== Single PURL ====================

/// Source for one PURL by owner and name
pub struct PurlSource {
    owner: String,
    name: String,
    key: String,
    credential: Option<Credential>,
}

impl PurlSource {
    /// Source for the given PURL
    pub fn new(owner: &str, name: &str, credential: Option<Credential>) -> Self {
        let key = if owner.is_empty() || name.is_empty() {
            String::new()
        } else {
            format!("{owner}/{name}")
        };
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            key,
            credential,
        }
    }
}

impl RecordSource for PurlSource {
    type Output = Purl;

    fn key(&self) -> &str {
        &self.key
    }

    fn title(&self) -> String {
        self.key.clone()
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<Purl>, FetchError> {
        db.lock()
            .await
            .purl(&self.owner, &self.name)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<Purl>, FetchError> {
        client
            .purl(&self.owner, &self.name, self.credential.as_ref())
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, record: &Purl) -> Result<(), FetchError> {
        db.lock().await.put_purl(record).map_err(FetchError::store)
    }
}

// ==================== Single status ====================

/// Source for one status by address and id
pub struct StatusSource {
    address: String,
    id: String,
    key: String,
}

impl StatusSource {
    /// Source for the given status
    pub fn new(address: &str, id: &str) -> Self {
        let key = if address.is_empty() || id.is_empty() {
            String::new()
        } else {
            format!("{address}/{id}")
        };
        Self {
            address: address.to_string(),
            id: id.to_string(),
            key,
        }
    }
}

impl RecordSource for StatusSource {
    type Output = Status;

    fn key(&self) -> &str {
        &self.key
    }

    fn title(&self) -> String {
        self.key.clone()
    }

    async fn read(&self, db: &SharedDatabase) -> Result<Option<Status>, FetchError> {
        db.lock()
            .await
            .status(&self.address, &self.id)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Option<Status>, FetchError> {
        // The service has no single-status read; filter the address log.
        let statuses = client
            .statuses(&self.address)
            .await
            .map_err(FetchError::network)?;
        Ok(statuses.into_iter().find(|status| status.id == self.id))
    }

    async fn write(&self, db: &SharedDatabase, record: &Status) -> Result<(), FetchError> {
        db.lock().await.put_status(record).map_err(FetchError::store)
    }
}

// ==================== Directory ====================

/// Source for the public address directory
pub struct DirectorySource;

impl ListSource for DirectorySource {
    type Item = DirectoryEntry;

    fn title(&self) -> String {
        "directory".to_string()
    }

    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<DirectoryEntry>, FetchError> {
        db.lock()
            .await
            .directory(selection)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<DirectoryEntry>, FetchError> {
        let addresses = client.directory().await.map_err(FetchError::network)?;
        Ok(addresses
            .iter()
            .map(|address| DirectoryEntry::new(address))
            .collect())
    }

    async fn write(
        &self,
        db: &SharedDatabase,
        items: &[DirectoryEntry],
    ) -> Result<(), FetchError> {
        db.lock()
            .await
            .put_directory(items)
            .map_err(FetchError::store)
    }
}

// ==================== Statuslog ====================

/// Source for the statuslog, either one address's or the service-wide log
pub struct StatuslogSource {
    address: Option<String>,
}

impl StatuslogSource {
    /// The service-wide latest statuslog
    pub fn latest() -> Self {
        Self { address: None }
    }

    /// One address's statuslog
    pub fn for_address(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
        }
    }
}

impl ListSource for StatuslogSource {
    type Item = Status;

    fn title(&self) -> String {
        match &self.address {
            Some(address) => format!("{address}.statuses"),
            None => "statuslog".to_string(),
        }
    }

    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<Status>, FetchError> {
        let selection = match &self.address {
            Some(address) => scoped(selection, address),
            None => selection.clone(),
        };
        db.lock()
            .await
            .statuses(&selection)
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Status>, FetchError> {
        match &self.address {
            Some(address) => client.statuses(address).await.map_err(FetchError::network),
            None => client.statuslog().await.map_err(FetchError::network),
        }
    }

    async fn write(&self, db: &SharedDatabase, items: &[Status]) -> Result<(), FetchError> {
        db.lock().await.put_statuses(items).map_err(FetchError::store)
    }
}

// ==================== Pastebin ====================

/// Source for an address's pastebin
pub struct PasteListSource {
    address: String,
    credential: Option<Credential>,
}

impl PasteListSource {
    /// Source for the given address
    pub fn new(address: &str, credential: Option<Credential>) -> Self {
        Self {
            address: address.to_string(),
            credential,
        }
    }
}

impl ListSource for PasteListSource {
    type Item = Paste;

    fn title(&self) -> String {
        format!("{}.pastebin", self.address)
    }

    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<Paste>, FetchError> {
        db.lock()
            .await
            .pastes(&scoped(selection, &self.address))
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Paste>, FetchError> {
        client
            .pastes(&self.address, self.credential.as_ref())
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, items: &[Paste]) -> Result<(), FetchError> {
        db.lock().await.put_pastes(items).map_err(FetchError::store)
    }
}

// ==================== PURLs ====================

/// Source for an address's PURLs
pub struct PurlListSource {
    address: String,
    credential: Option<Credential>,
}

impl PurlListSource {
    /// Source for the given address
    pub fn new(address: &str, credential: Option<Credential>) -> Self {
        Self {
            address: address.to_string(),
            credential,
        }
    }
}

impl ListSource for PurlListSource {
    type Item = Purl;

    fn title(&self) -> String {
        format!("{}.purls", self.address)
    }

    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<Purl>, FetchError> {
        db.lock()
            .await
            .purls(&scoped(selection, &self.address))
            .map_err(FetchError::store)
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Purl>, FetchError> {
        client
            .purls(&self.address, self.credential.as_ref())
            .await
            .map_err(FetchError::network)
    }

    async fn write(&self, db: &SharedDatabase, items: &[Purl]) -> Result<(), FetchError> {
        db.lock().await.put_purls(items).map_err(FetchError::store)
    }
}

// ==================== Follow / block lists ====================

/// Which convention-named address list a source reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressListKind {
    /// The follow list
    Following,
    /// The block list
    Blocked,
}

impl AddressListKind {
    /// The convention paste title holding the list
    pub fn paste_title(self) -> &'static str {
        match self {
            Self::Following => FOLLOWING_PASTE,
            Self::Blocked => BLOCKED_PASTE,
        }
    }
}

/// Source for a follow or block list: newline-delimited addresses inside a
/// convention-named paste. Items are parsed out of the paste body, so the
/// selection is evaluated in memory rather than in SQL.
pub struct AddressListSource {
    owner: String,
    kind: AddressListKind,
    credential: Option<Credential>,
}

impl AddressListSource {
    /// Source for the given owner and list kind
    pub fn new(owner: &str, kind: AddressListKind, credential: Option<Credential>) -> Self {
        Self {
            owner: owner.to_string(),
            kind,
            credential,
        }
    }

    fn entries(paste: Option<&Paste>) -> Vec<DirectoryEntry> {
        paste
            .map(Paste::address_list)
            .unwrap_or_default()
            .iter()
            .map(|address| DirectoryEntry::new(address))
            .collect()
    }
}

impl ListSource for AddressListSource {
    type Item = DirectoryEntry;

    fn title(&self) -> String {
        format!("{}.{}", self.owner, self.kind.paste_title())
    }

    async fn read(
        &self,
        db: &SharedDatabase,
        selection: &Selection,
    ) -> Result<Vec<DirectoryEntry>, FetchError> {
        let paste = db
            .lock()
            .await
            .paste(&self.owner, self.kind.paste_title())
            .map_err(FetchError::store)?;
        Ok(selection.apply(&Self::entries(paste.as_ref())))
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<DirectoryEntry>, FetchError> {
        let paste = client
            .paste(&self.owner, self.kind.paste_title(), self.credential.as_ref())
            .await
            .map_err(FetchError::network)?;
        Ok(Self::entries(paste.as_ref()))
    }

    async fn write(
        &self,
        db: &SharedDatabase,
        items: &[DirectoryEntry],
    ) -> Result<(), FetchError> {
        let addresses: Vec<String> = items.iter().map(|entry| entry.address.clone()).collect();
        let paste = Paste::from_address_list(&self.owner, self.kind.paste_title(), &addresses);
        db.lock().await.put_paste(&paste).map_err(FetchError::store)
    }
}
