//! The fetcher family: offline-first synchronization between the remote
//! interface and the local cache
//!
//! Fetchers serve cached results immediately, refresh from the remote
//! interface in the background, and persist everything through the local
//! store, which is the single source of truth for what observers see.
//! Composition over inheritance: concrete fetchers are built from
//! [`RecordFetcher`]/[`ListFetcher`] plus a source trait, and composites own
//! their children as plain fields.

mod account;
mod filters;
mod list;
mod record;
mod sources;
mod state;
mod summary;

pub use account::{AccountFetcher, DEFAULT_SUMMARY_CAP};
pub use filters::{Filter, Selection, Sort, all_match};
pub use list::{ListFetcher, ListSource, reconcile};
pub use record::{RecordFetcher, RecordSource};
pub use sources::{
    AddressListFetcher, AddressListKind, AddressListSource, DirectoryFetcher, DirectorySource,
    IconFetcher, IconSource, NowPageFetcher, NowPageSource, PasteFetcher, PasteListFetcher,
    PasteListSource, PasteSource, ProfileFetcher, ProfileSource, PurlFetcher, PurlListFetcher,
    PurlListSource, PurlSource, StatusFetcher, StatusSource, StatuslogFetcher, StatuslogSource,
};
pub use state::{ChangeHash, FetchCore, FetchState, Loadable};
pub use summary::AddressSummaryFetcher;

/// Default page size for list reads
pub const DEFAULT_PAGE_LIMIT: usize = 24;
