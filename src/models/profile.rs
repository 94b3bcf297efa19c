//! Profile page model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// An address's public profile page content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Address the profile belongs to
    pub address: String,
    /// Raw profile content (markdown/HTML, rendered elsewhere)
    pub content: String,
    /// When the profile was last updated, if the service reports it
    pub updated: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create a profile record
    pub fn new(address: &str, content: &str) -> Self {
        Self {
            address: address.to_string(),
            content: content.to_string(),
            updated: None,
        }
    }
}

impl Record for Profile {
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
