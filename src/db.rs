//! Database module for `SQLite` cache storage (the cache of record)
//!
//! Every table shares the queryable columns `id`, `owner`, `content`, and
//! `created_at` so a [`Selection`] can drive paged reads uniformly. Upserts
//! replace the whole row for an identity; partial writes never happen.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, params_from_iter};
use std::path::PathBuf;
use std::sync::Arc;

use crate::fetch::Selection;
use crate::models::{AddressIcon, DirectoryEntry, NowPage, Paste, Profile, Purl, Status};
use crate::paths;

/// Shared handle used by fetchers; `rusqlite::Connection` is single-threaded,
/// so access goes through an async mutex.
pub type SharedDatabase = Arc<tokio::sync::Mutex<Database>>;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Open an in-memory database (tests and previews)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        paths::database_path()
    }

    /// Wrap the database in the shared handle the fetch layer uses
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            -- Public address directory
            CREATE TABLE IF NOT EXISTS directory (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                created_at TEXT,
                cached_at TEXT NOT NULL
            );

            -- Profile pages, keyed by address
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT,
                cached_at TEXT NOT NULL
            );

            -- /now pages, keyed by address
            CREATE TABLE IF NOT EXISTS now_pages (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT,
                listed INTEGER NOT NULL DEFAULT 1,
                cached_at TEXT NOT NULL
            );

            -- Pastes, keyed by (owner, title)
            CREATE TABLE IF NOT EXISTS pastes (
                owner TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT,
                listed INTEGER NOT NULL DEFAULT 1,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (owner, id)
            );

            -- PURLs, keyed by (owner, name); content holds the target URL
            CREATE TABLE IF NOT EXISTS purls (
                owner TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                counter INTEGER,
                listed INTEGER NOT NULL DEFAULT 1,
                cached_at TEXT NOT NULL,
                created_at TEXT,
                PRIMARY KEY (owner, id)
            );

            -- Statuslog entries, keyed by (owner, id)
            CREATE TABLE IF NOT EXISTS statuses (
                id TEXT NOT NULL,
                owner TEXT NOT NULL,
                content TEXT NOT NULL,
                emoji TEXT,
                created_at TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (owner, id)
            );

            -- Icon bytes, keyed by address
            CREATE TABLE IF NOT EXISTS icons (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                data BLOB NOT NULL,
                created_at TEXT,
                cached_at TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_statuses_owner ON statuses(owner);
            CREATE INDEX IF NOT EXISTS idx_statuses_created_at ON statuses(created_at);
            CREATE INDEX IF NOT EXISTS idx_pastes_owner ON pastes(owner);
            CREATE INDEX IF NOT EXISTS idx_purls_owner ON purls(owner);
            ",
        )?;

        Ok(())
    }

    // ==================== Directory ====================

    /// Upsert a batch of directory entries
    pub fn put_directory(&self, entries: &[DirectoryEntry]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        for entry in entries {
            self.conn.execute(
                r"INSERT OR REPLACE INTO directory (id, owner, content, created_at, cached_at)
                   VALUES (?1, ?1, ?1, ?2, ?3)",
                params![
                    entry.address,
                    entry.registered.map(|dt| dt.to_rfc3339()),
                    now,
                ],
            )?;
        }
        Ok(())
    }

    /// Read directory entries matching a selection
    pub fn directory(&self, selection: &Selection) -> Result<Vec<DirectoryEntry>> {
        let (suffix, args) = selection.sql_suffix();
        let sql = format!("SELECT id, created_at FROM directory{suffix}");
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt.query_map(params_from_iter(args), |row| {
            Ok(DirectoryEntry {
                address: row.get(0)?,
                registered: parse_stamp(row.get::<_, Option<String>>(1)?),
            })
        })?;
        entries.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Read a single directory entry by address
    pub fn directory_entry(&self, address: &str) -> Result<Option<DirectoryEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at FROM directory WHERE id = ?1")?;
        let result = stmt.query_row(params![address], |row| {
            Ok(DirectoryEntry {
                address: row.get(0)?,
                registered: parse_stamp(row.get::<_, Option<String>>(1)?),
            })
        });
        optional(result)
    }

    // ==================== Profiles ====================

    /// Upsert a profile
    pub fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO profiles (id, owner, content, created_at, cached_at)
               VALUES (?1, ?1, ?2, ?3, ?4)",
            params![
                profile.address,
                profile.content,
                profile.updated.map(|dt| dt.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read a profile by address
    pub fn profile(&self, address: &str) -> Result<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, content, created_at FROM profiles WHERE id = ?1")?;
        let result = stmt.query_row(params![address], |row| {
            Ok(Profile {
                address: row.get(0)?,
                content: row.get(1)?,
                updated: parse_stamp(row.get::<_, Option<String>>(2)?),
            })
        });
        optional(result)
    }

    // ==================== Now pages ====================

    /// Upsert a now page
    pub fn put_now_page(&self, page: &NowPage) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO now_pages (id, owner, content, created_at, listed, cached_at)
               VALUES (?1, ?1, ?2, ?3, ?4, ?5)",
            params![
                page.address,
                page.content,
                page.updated.map(|dt| dt.to_rfc3339()),
                i32::from(page.listed),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read a now page by address
    pub fn now_page(&self, address: &str) -> Result<Option<NowPage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, content, created_at, listed FROM now_pages WHERE id = ?1")?;
        let result = stmt.query_row(params![address], |row| {
            Ok(NowPage {
                address: row.get(0)?,
                content: row.get(1)?,
                updated: parse_stamp(row.get::<_, Option<String>>(2)?),
                listed: row.get::<_, i32>(3)? != 0,
            })
        });
        optional(result)
    }

    // ==================== Pastes ====================

    /// Upsert a paste
    pub fn put_paste(&self, paste: &Paste) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO pastes (owner, id, content, created_at, listed, cached_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                paste.owner,
                paste.title,
                paste.content,
                paste.modified.map(|dt| dt.to_rfc3339()),
                i32::from(paste.listed),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of pastes
    pub fn put_pastes(&self, pastes: &[Paste]) -> Result<()> {
        for paste in pastes {
            self.put_paste(paste)?;
        }
        Ok(())
    }

    /// Read pastes matching a selection
    pub fn pastes(&self, selection: &Selection) -> Result<Vec<Paste>> {
        let (suffix, args) = selection.sql_suffix();
        let sql = format!("SELECT owner, id, content, created_at, listed FROM pastes{suffix}");
        let mut stmt = self.conn.prepare(&sql)?;
        let pastes = stmt.query_map(params_from_iter(args), Self::row_to_paste)?;
        pastes.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Read a single paste by owner and title
    pub fn paste(&self, owner: &str, title: &str) -> Result<Option<Paste>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner, id, content, created_at, listed FROM pastes WHERE owner = ?1 AND id = ?2",
        )?;
        let result = stmt.query_row(params![owner, title], Self::row_to_paste);
        optional(result)
    }

    /// Delete a paste (explicit user deletion, already synced remotely)
    pub fn delete_paste(&self, owner: &str, title: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM pastes WHERE owner = ?1 AND id = ?2",
            params![owner, title],
        )?;
        Ok(())
    }

    fn row_to_paste(row: &rusqlite::Row<'_>) -> rusqlite::Result<Paste> {
        Ok(Paste {
            owner: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            modified: parse_stamp(row.get::<_, Option<String>>(3)?),
            listed: row.get::<_, i32>(4)? != 0,
        })
    }

    // ==================== PURLs ====================

    /// Upsert a PURL
    pub fn put_purl(&self, purl: &Purl) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO purls (owner, id, content, counter, listed, cached_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                purl.owner,
                purl.name,
                purl.url,
                purl.counter,
                i32::from(purl.listed),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of PURLs
    pub fn put_purls(&self, purls: &[Purl]) -> Result<()> {
        for purl in purls {
            self.put_purl(purl)?;
        }
        Ok(())
    }

    /// Read PURLs matching a selection
    pub fn purls(&self, selection: &Selection) -> Result<Vec<Purl>> {
        let (suffix, args) = selection.sql_suffix();
        let sql = format!("SELECT owner, id, content, counter, listed FROM purls{suffix}");
        let mut stmt = self.conn.prepare(&sql)?;
        let purls = stmt.query_map(params_from_iter(args), Self::row_to_purl)?;
        purls.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Read a single PURL by owner and name
    pub fn purl(&self, owner: &str, name: &str) -> Result<Option<Purl>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner, id, content, counter, listed FROM purls WHERE owner = ?1 AND id = ?2",
        )?;
        let result = stmt.query_row(params![owner, name], Self::row_to_purl);
        optional(result)
    }

    /// Delete a PURL
    pub fn delete_purl(&self, owner: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM purls WHERE owner = ?1 AND id = ?2",
            params![owner, name],
        )?;
        Ok(())
    }

    fn row_to_purl(row: &rusqlite::Row<'_>) -> rusqlite::Result<Purl> {
        Ok(Purl {
            owner: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            counter: row.get(3)?,
            listed: row.get::<_, i32>(4)? != 0,
        })
    }

    // ==================== Statuses ====================

    /// Upsert a status
    pub fn put_status(&self, status: &Status) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO statuses (id, owner, content, emoji, created_at, cached_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                status.id,
                status.address,
                status.content,
                status.emoji,
                status.posted.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of statuses
    pub fn put_statuses(&self, statuses: &[Status]) -> Result<()> {
        for status in statuses {
            self.put_status(status)?;
        }
        Ok(())
    }

    /// Read statuses matching a selection
    pub fn statuses(&self, selection: &Selection) -> Result<Vec<Status>> {
        let (suffix, args) = selection.sql_suffix();
        let sql = format!("SELECT id, owner, content, emoji, created_at FROM statuses{suffix}");
        let mut stmt = self.conn.prepare(&sql)?;
        let statuses = stmt.query_map(params_from_iter(args), Self::row_to_status)?;
        statuses.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Read a single status by address and id
    pub fn status(&self, address: &str, id: &str) -> Result<Option<Status>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, content, emoji, created_at FROM statuses WHERE owner = ?1 AND id = ?2",
        )?;
        let result = stmt.query_row(params![address, id], Self::row_to_status);
        optional(result)
    }

    /// Delete a status
    pub fn delete_status(&self, address: &str, id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM statuses WHERE owner = ?1 AND id = ?2",
            params![address, id],
        )?;
        Ok(())
    }

    fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<Status> {
        Ok(Status {
            id: row.get(0)?,
            address: row.get(1)?,
            content: row.get(2)?,
            emoji: row.get(3)?,
            posted: parse_stamp(Some(row.get::<_, String>(4)?)).unwrap_or_default(),
        })
    }

    // ==================== Icons ====================

    /// Upsert an icon
    pub fn put_icon(&self, icon: &AddressIcon) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO icons (id, owner, data, created_at, cached_at)
               VALUES (?1, ?1, ?2, ?3, ?4)",
            params![
                icon.address,
                icon.data,
                icon.fetched.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read an icon by address
    pub fn icon(&self, address: &str) -> Result<Option<AddressIcon>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, data, created_at FROM icons WHERE id = ?1")?;
        let result = stmt.query_row(params![address], |row| {
            Ok(AddressIcon {
                address: row.get(0)?,
                data: row.get(1)?,
                fetched: parse_stamp(row.get::<_, Option<String>>(2)?).unwrap_or_default(),
            })
        });
        optional(result)
    }

    // ==================== Maintenance ====================

    /// Clear cache rows older than the given age, across all tables
    pub fn clear_stale(&self, max_age_hours: u64) -> Result<usize> {
        let cutoff = (Utc::now() - chrono::Duration::hours(max_age_hours as i64)).to_rfc3339();
        let mut total = 0;
        for table in [
            "directory",
            "profiles",
            "now_pages",
            "pastes",
            "purls",
            "statuses",
            "icons",
        ] {
            total += self.conn.execute(
                &format!("DELETE FROM {table} WHERE cached_at < ?1"),
                params![cutoff],
            )?;
        }
        Ok(total)
    }
}

/// Parse an optional RFC 3339 column value
fn parse_stamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Map `QueryReturnedNoRows` to `None`
fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Filter, Sort};
    use tempfile::tempdir;

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _db = Database::open_path(&path).unwrap();
        // Should create without error
    }

    #[test]
    fn test_paste_round_trip() {
        let db = Database::open_in_memory().unwrap();

        let mut paste = Paste::new("app", "greeting", "hello there");
        paste.listed = false;
        db.put_paste(&paste).unwrap();

        let read = db.paste("app", "greeting").unwrap().unwrap();
        assert_eq!(read, paste);

        db.delete_paste("app", "greeting").unwrap();
        assert!(db.paste("app", "greeting").unwrap().is_none());
    }

    #[test]
    fn test_purl_round_trip_keeps_counter() {
        let db = Database::open_in_memory().unwrap();

        let mut purl = Purl::new("app", "repo", "https://example.com/repo");
        purl.counter = Some(41);
        db.put_purl(&purl).unwrap();

        let read = db.purl("app", "repo").unwrap().unwrap();
        assert_eq!(read, purl);
        assert_eq!(read.counter, Some(41));
    }

    #[test]
    fn test_directory_upsert_does_not_duplicate() {
        let db = Database::open_in_memory().unwrap();

        let entries = vec![DirectoryEntry::new("app"), DirectoryEntry::new("calvin")];
        db.put_directory(&entries).unwrap();
        assert!(db.directory_entry("calvin").unwrap().is_some());

        let grown = vec![
            DirectoryEntry::new("app"),
            DirectoryEntry::new("calvin"),
            DirectoryEntry::new("newuser"),
        ];
        db.put_directory(&grown).unwrap();

        let all = db.directory(&Selection::all()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_status_selection_orders_and_pages() {
        let db = Database::open_in_memory().unwrap();

        for i in 0..5 {
            let mut status = Status::new(&format!("s{i}"), "app", &format!("status {i}"));
            status.posted = Utc::now() - chrono::Duration::minutes(i);
            db.put_status(&status).unwrap();
        }

        let selection = Selection {
            filters: vec![Filter::Owner("app".to_string())],
            sort: Sort::NewestFirst,
            limit: Some(2),
            offset: 2,
        };
        let page = db.statuses(&selection).unwrap();
        assert_eq!(page.len(), 2);
        // Newest first, offset past the two most recent.
        assert_eq!(page[0].id, "s2");
        assert_eq!(page[1].id, "s3");
    }

    #[test]
    fn test_excluding_filter_in_sql() {
        let db = Database::open_in_memory().unwrap();
        db.put_status(&Status::new("1", "app", "x")).unwrap();
        db.put_status(&Status::new("2", "blocked", "x")).unwrap();

        let selection = Selection {
            filters: vec![
                Filter::Excluding(vec!["blocked".to_string()]),
                Filter::Query("x".to_string()),
            ],
            ..Selection::all()
        };
        let rows = db.statuses(&selection).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].address, "app");
    }

    #[test]
    fn test_clear_stale_removes_nothing_fresh() {
        let db = Database::open_in_memory().unwrap();
        db.put_profile(&Profile::new("app", "hi")).unwrap();
        assert_eq!(db.clear_stale(1).unwrap(), 0);
        assert!(db.profile("app").unwrap().is_some());
    }
}
