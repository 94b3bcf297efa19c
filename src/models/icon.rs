//! Address icon (profile picture) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// Cached icon bytes for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressIcon {
    /// Address the icon belongs to
    pub address: String,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// When the icon was fetched
    pub fetched: DateTime<Utc>,
}

impl AddressIcon {
    /// Create an icon record stamped now
    pub fn new(address: &str, data: Vec<u8>) -> Self {
        Self {
            address: address.to_string(),
            data,
            fetched: Utc::now(),
        }
    }
}

impl Record for AddressIcon {
    fn record_id(&self) -> &str {
        &self.address
    }

    fn owner(&self) -> &str {
        &self.address
    }

    fn body(&self) -> &str {
        ""
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        Some(self.fetched)
    }
}
