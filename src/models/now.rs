//! "Now" page model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// An address's /now page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPage {
    /// Address the page belongs to
    pub address: String,
    /// Page content (markdown)
    pub content: String,
    /// Last update stamp
    pub updated: Option<DateTime<Utc>>,
    /// Whether the page is listed in the public now garden
    pub listed: bool,
}

impl NowPage {
    /// Create a now-page record
    pub fn new(address: &str, content: &str) -> Self {
        Self {
            address: address.to_string(),
            content: content.to_string(),
            updated: None,
            listed: true,
        }
    }
}

impl Record for NowPage {
    fn record_id(&self) -> &str {
        &self.address
    }

    fn owner(&self) -> &str {
        &self.address
    }

    fn body(&self) -> &str {
        &self.content
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.updated
    }
}
