//! Remote interface clients
//!
//! The fetch layer talks to the service through [`Client`], an enum over the
//! real HTTP implementation and a programmable mock. Every write operation
//! takes a [`Credential`]; reads may take one to see unlisted content.

pub mod http;
pub mod mock;

use anyhow::Result;

use crate::models::{NowPage, Paste, Profile, Purl, Status};

/// Opaque authorization token for an account
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log token material
        f.write_str("Credential(…)")
    }
}

/// Unified client over the remote interface implementations
pub enum Client {
    /// Real HTTP client
    Http(http::HttpClient),
    /// Programmable in-memory client for tests and previews
    Mock(mock::MockClient),
}

impl Client {
    /// The mock behind this client, if it is one (test hooks)
    pub fn as_mock(&self) -> Option<&mock::MockClient> {
        match self {
            Client::Mock(c) => Some(c),
            Client::Http(_) => None,
        }
    }

    /// Fetch the public address directory
    pub async fn directory(&self) -> Result<Vec<String>> {
        match self {
            Client::Http(c) => c.directory().await,
            Client::Mock(c) => c.directory().await,
        }
    }

    /// Fetch an address's profile page
    pub async fn profile(&self, address: &str) -> Result<Option<Profile>> {
        match self {
            Client::Http(c) => c.profile(address).await,
            Client::Mock(c) => c.profile(address).await,
        }
    }

    /// Save an address's profile page
    pub async fn save_profile(&self, profile: &Profile, credential: &Credential) -> Result<()> {
        match self {
            Client::Http(c) => c.save_profile(profile, credential).await,
            Client::Mock(c) => c.save_profile(profile, credential).await,
        }
    }

    /// Fetch an address's /now page
    pub async fn now_page(&self, address: &str) -> Result<Option<NowPage>> {
        match self {
            Client::Http(c) => c.now_page(address).await,
            Client::Mock(c) => c.now_page(address).await,
        }
    }

    /// Save an address's /now page
    pub async fn save_now_page(&self, page: &NowPage, credential: &Credential) -> Result<()> {
        match self {
            Client::Http(c) => c.save_now_page(page, credential).await,
            Client::Mock(c) => c.save_now_page(page, credential).await,
        }
    }

    /// Fetch an address's pastebin
    pub async fn pastes(&self, address: &str, credential: Option<&Credential>) -> Result<Vec<Paste>> {
        match self {
            Client::Http(c) => c.pastes(address, credential).await,
            Client::Mock(c) => c.pastes(address, credential).await,
        }
    }

    /// Fetch a single paste by title
    pub async fn paste(
        &self,
        address: &str,
        title: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<Paste>> {
        match self {
            Client::Http(c) => c.paste(address, title, credential).await,
            Client::Mock(c) => c.paste(address, title, credential).await,
        }
    }

    /// Create or update a paste
    pub async fn save_paste(&self, paste: &Paste, credential: &Credential) -> Result<()> {
        match self {
            Client::Http(c) => c.save_paste(paste, credential).await,
            Client::Mock(c) => c.save_paste(paste, credential).await,
        }
    }

    /// Delete a paste
    pub async fn delete_paste(
        &self,
        address: &str,
        title: &str,
        credential: &Credential,
    ) -> Result<()> {
        match self {
            Client::Http(c) => c.delete_paste(address, title, credential).await,
            Client::Mock(c) => c.delete_paste(address, title, credential).await,
        }
    }

    /// Fetch an address's PURLs
    pub async fn purls(&self, address: &str, credential: Option<&Credential>) -> Result<Vec<Purl>> {
        match self {
            Client::Http(c) => c.purls(address, credential).await,
            Client::Mock(c) => c.purls(address, credential).await,
        }
    }

    /// Fetch a single PURL by name
    pub async fn purl(
        &self,
        address: &str,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<Purl>> {
        match self {
            Client::Http(c) => c.purl(address, name, credential).await,
            Client::Mock(c) => c.purl(address, name, credential).await,
        }
    }

    /// Create or update a PURL
    pub async fn save_purl(&self, purl: &Purl, credential: &Credential) -> Result<()> {
        match self {
            Client::Http(c) => c.save_purl(purl, credential).await,
            Client::Mock(c) => c.save_purl(purl, credential).await,
        }
    }

    /// Delete a PURL
    pub async fn delete_purl(
        &self,
        address: &str,
        name: &str,
        credential: &Credential,
    ) -> Result<()> {
        match self {
            Client::Http(c) => c.delete_purl(address, name, credential).await,
            Client::Mock(c) => c.delete_purl(address, name, credential).await,
        }
    }

    /// Fetch one address's statuslog
    pub async fn statuses(&self, address: &str) -> Result<Vec<Status>> {
        match self {
            Client::Http(c) => c.statuses(address).await,
            Client::Mock(c) => c.statuses(address).await,
        }
    }

    /// Fetch the service-wide latest statuslog
    pub async fn statuslog(&self) -> Result<Vec<Status>> {
        match self {
            Client::Http(c) => c.statuslog().await,
            Client::Mock(c) => c.statuslog().await,
        }
    }

    /// Post a new status
    pub async fn post_status(
        &self,
        address: &str,
        content: &str,
        emoji: Option<&str>,
        credential: &Credential,
    ) -> Result<Status> {
        match self {
            Client::Http(c) => c.post_status(address, content, emoji, credential).await,
            Client::Mock(c) => c.post_status(address, content, emoji, credential).await,
        }
    }

    /// Delete a status
    pub async fn delete_status(
        &self,
        address: &str,
        id: &str,
        credential: &Credential,
    ) -> Result<()> {
        match self {
            Client::Http(c) => c.delete_status(address, id, credential).await,
            Client::Mock(c) => c.delete_status(address, id, credential).await,
        }
    }

    /// Fetch an address's icon bytes
    pub async fn icon(&self, address: &str) -> Result<Option<Vec<u8>>> {
        match self {
            Client::Http(c) => c.icon(address).await,
            Client::Mock(c) => c.icon(address).await,
        }
    }

    /// Fetch the addresses owned by the credential's account
    pub async fn account_addresses(&self, credential: &Credential) -> Result<Vec<String>> {
        match self {
            Client::Http(c) => c.account_addresses(credential).await,
            Client::Mock(c) => c.account_addresses(credential).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("super-secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(…)");
    }
}
