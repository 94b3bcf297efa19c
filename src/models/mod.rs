//! Cache-record models for Roost

mod directory;
mod icon;
mod now;
mod paste;
mod profile;
mod purl;
mod status;

pub use directory::DirectoryEntry;
pub use icon::AddressIcon;
pub use now::NowPage;
pub use paste::Paste;
pub use profile::Profile;
pub use purl::Purl;
pub use status::Status;

use chrono::{DateTime, Utc};

/// Well-known paste holding an address's follow list (newline-delimited).
pub const FOLLOWING_PASTE: &str = "app.lol.following";

/// Well-known paste holding an address's block list (newline-delimited).
pub const BLOCKED_PASTE: &str = "app.lol.blocked";

/// Common shape shared by every cache record.
///
/// Gives the fetch layer a uniform view for reconciliation identity and for
/// in-memory filter evaluation. The id is unique within a record's list scope
/// (paste titles per owner, status ids per address, and so on).
pub trait Record {
    /// Identity of the record within its list scope
    fn record_id(&self) -> &str;

    /// Address that owns the record
    fn owner(&self) -> &str;

    /// Text body used by query filters
    fn body(&self) -> &str;

    /// Creation/update stamp, if the record kind carries one
    fn created(&self) -> Option<DateTime<Utc>>;
}
