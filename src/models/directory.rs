//! Address directory model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// One entry in the public address directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// The address name
    pub address: String,
    /// Registration date, when known
    pub registered: Option<DateTime<Utc>>,
}

impl DirectoryEntry {
    /// Create a directory entry
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            registered: None,
        }
    }
}

impl Record for DirectoryEntry {
    fn record_id(&self) -> &str {
        &self.address
    }

    fn owner(&self) -> &str {
        &self.address
    }

    fn body(&self) -> &str {
        &self.address
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.registered
    }
}
