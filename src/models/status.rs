//! Status (statuslog entry) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// A single statuslog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Service-assigned status id (unique per address)
    pub id: String,
    /// Posting address
    pub address: String,
    /// Status text
    pub content: String,
    /// Leading emoji, if any
    pub emoji: Option<String>,
    /// When the status was posted
    pub posted: DateTime<Utc>,
}

impl Status {
    /// Create a status record
    pub fn new(id: &str, address: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            address: address.to_string(),
            content: content.to_string(),
            emoji: None,
            posted: Utc::now(),
        }
    }

    /// Emoji plus content, the way the statuslog displays an entry
    pub fn display_text(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{emoji} {}", self.content),
            None => self.content.clone(),
        }
    }
}

impl Record for Status {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.address
    }

    fn body(&self) -> &str {
        &self.content
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        Some(self.posted)
    }
}
