//! PURL (persistent URL) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// A persistent short URL owned by an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purl {
    /// Owning address
    pub owner: String,
    /// PURL name (unique per owner)
    pub name: String,
    /// Target URL
    pub url: String,
    /// Hit counter, if the service reports one
    pub counter: Option<i64>,
    /// Whether the PURL is publicly listed
    pub listed: bool,
}

impl Purl {
    /// Create a PURL record
    pub fn new(owner: &str, name: &str, url: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            counter: None,
            listed: true,
        }
    }
}

impl Record for Purl {
    fn record_id(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn body(&self) -> &str {
        &self.url
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        None
    }
}
