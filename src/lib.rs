//! # Roost 🪺
//!
//! An offline-first fetch and cache core for omg.lol-style publishing
//! services (addresses, statuses, pastes, PURLs, /now pages).
//!
//! ## Overview
//!
//! Roost sits between a remote publishing service and a UI layer. A family
//! of asynchronous fetcher objects serves cached results immediately,
//! refreshes from the network in the background, persists everything into a
//! local SQLite cache, and exposes observable loading/loaded/error state.
//! The local store is the single source of truth for what the UI sees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     AccountFetcher                          │
//! │  Credential gating, write ops, bounded summary cache        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │ AddressSummary  │ │ RecordFetcher   │ │  ListFetcher    │
//! │                 │ │                 │ │                 │
//! │ • Fan-out       │ │ • Read→fetch→   │ │ • Pagination    │
//! │ • Derived state │ │   write→reread  │ │ • Reconcile     │
//! │ • Child notify  │ │ • Change hash   │ │ • Filter/sort   │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │    Database     │ │     Client      │ │     Models      │
//! │                 │ │                 │ │                 │
//! │ • SQLite cache  │ │ • HTTP          │ │ • Paste, PURL   │
//! │ • Paged reads   │ │ • Mock          │ │ • Status, Now   │
//! │ • Upserts       │ │ • Credential    │ │ • Profile, Icon │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Remote interface clients (HTTP, mock)
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` cache of record
//! - [`error`] — Observable fetcher error taxonomy
//! - [`fetch`] — The fetcher family (the core of the crate)
//! - [`models`] — Cache-record types
//! - [`sync`] — Background refresh loop
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use roost::api::{Client, Credential, http::HttpClient};
//! use roost::db::Database;
//! use roost::fetch::AccountFetcher;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = Database::open()?.into_shared();
//! let client = Arc::new(Client::Http(HttpClient::new()));
//! let account = AccountFetcher::new(Credential::new("token"), db, client, 24);
//! account.perform().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Offline-First** — Cached results are served before the network answers
//! - **Scroll-Stable** — Refreshed lists keep already-seen items in place
//! - **Observable** — Every fetcher exposes loading/loaded/error state
//! - **Gated Writes** — Mutations require control of the target address
//! - **Fast** — Async networking with Tokio

#![doc(html_root_url = "https://docs.rs/roost/0.2.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod models;
pub mod paths;
pub mod sync;

// Re-export main types for convenience
pub use api::{Client, Credential};
pub use config::Config;
pub use db::{Database, SharedDatabase};
pub use error::FetchError;
pub use fetch::{
    AccountFetcher, AddressSummaryFetcher, Filter, ListFetcher, Loadable, RecordFetcher,
    Selection, Sort,
};
pub use models::{
    AddressIcon, DirectoryEntry, NowPage, Paste, Profile, Purl, Record, Status,
};
pub use sync::RefreshManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
