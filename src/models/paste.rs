//! Paste model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// A paste: a titled text document owned by an address.
///
/// Identity is the (owner, title) pair. Follow and block lists are stored as
/// convention-named pastes containing newline-delimited addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    /// Owning address
    pub owner: String,
    /// Paste title (unique per owner)
    pub title: String,
    /// Paste body
    pub content: String,
    /// Last modification stamp
    pub modified: Option<DateTime<Utc>>,
    /// Whether the paste is publicly listed
    pub listed: bool,
}

impl Paste {
    /// Create a paste record
    pub fn new(owner: &str, title: &str, content: &str) -> Self {
        Self {
            owner: owner.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            modified: None,
            listed: true,
        }
    }

    /// Parse the body as a newline-delimited address list.
    ///
    /// Blank lines and surrounding whitespace are dropped.
    pub fn address_list(&self) -> Vec<String> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Serialize an address list as a paste body
    pub fn from_address_list(owner: &str, title: &str, addresses: &[String]) -> Self {
        Self::new(owner, title, &addresses.join("\n"))
    }
}

impl Record for Paste {
    fn record_id(&self) -> &str {
        &self.title
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn body(&self) -> &str {
        &self.content
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}
