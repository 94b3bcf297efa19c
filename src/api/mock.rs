//! Programmable in-memory remote interface
//!
//! Test double used throughout the fetcher tests: canned responses,
//! per-operation call counters, optional injected latency and failure.
//! Mutations update the canned state, so scenarios behave end to end.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::models::{NowPage, Paste, Profile, Purl, Status};

use super::Credential;

#[derive(Default)]
struct MockState {
    directory: Vec<String>,
    profiles: HashMap<String, Profile>,
    now_pages: HashMap<String, NowPage>,
    pastes: HashMap<(String, String), Paste>,
    purls: HashMap<(String, String), Purl>,
    statuses: Vec<Status>,
    icons: HashMap<String, Vec<u8>>,
    addresses: Vec<String>,
    next_status_id: u64,
    failure: Option<String>,
}

/// In-memory mock client
#[derive(Default)]
pub struct MockClient {
    state: Mutex<MockState>,
    calls: Mutex<HashMap<&'static str, usize>>,
    latency: Option<Duration>,
}

impl MockClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a delay before every response (for in-flight tests)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every subsequent call fail with the given message
    pub fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_string());
    }

    /// Stop failing
    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }

    /// How many times the named operation ran
    pub fn calls(&self, operation: &str) -> usize {
        *self.calls.lock().unwrap().get(operation).unwrap_or(&0)
    }

    /// Set the canned directory
    pub fn set_directory(&self, addresses: &[&str]) {
        self.state.lock().unwrap().directory =
            addresses.iter().map(|a| (*a).to_string()).collect();
    }

    /// Set a canned profile
    pub fn set_profile(&self, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.address.clone(), profile);
    }

    /// Set a canned now page
    pub fn set_now_page(&self, page: NowPage) {
        self.state
            .lock()
            .unwrap()
            .now_pages
            .insert(page.address.clone(), page);
    }

    /// Set a canned paste
    pub fn set_paste(&self, paste: Paste) {
        self.state
            .lock()
            .unwrap()
            .pastes
            .insert((paste.owner.clone(), paste.title.clone()), paste);
    }

    /// Set a canned PURL
    pub fn set_purl(&self, purl: Purl) {
        self.state
            .lock()
            .unwrap()
            .purls
            .insert((purl.owner.clone(), purl.name.clone()), purl);
    }

    /// Set the canned statuslog
    pub fn set_statuses(&self, statuses: Vec<Status>) {
        self.state.lock().unwrap().statuses = statuses;
    }

    /// Set canned icon bytes
    pub fn set_icon(&self, address: &str, data: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .icons
            .insert(address.to_string(), data);
    }

    /// Set the account's authorized addresses
    pub fn set_addresses(&self, addresses: &[&str]) {
        self.state.lock().unwrap().addresses =
            addresses.iter().map(|a| (*a).to_string()).collect();
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.state.lock().unwrap().failure.clone();
        if let Some(message) = failure {
            bail!("{message}");
        }
        Ok(())
    }

    pub(crate) async fn directory(&self) -> Result<Vec<String>> {
        self.enter("directory").await?;
        Ok(self.state.lock().unwrap().directory.clone())
    }

    pub(crate) async fn profile(&self, address: &str) -> Result<Option<Profile>> {
        self.enter("profile").await?;
        Ok(self.state.lock().unwrap().profiles.get(address).cloned())
    }

    pub(crate) async fn save_profile(
        &self,
        profile: &Profile,
        _credential: &Credential,
    ) -> Result<()> {
        self.enter("save_profile").await?;
        self.set_profile(profile.clone());
        Ok(())
    }

    pub(crate) async fn now_page(&self, address: &str) -> Result<Option<NowPage>> {
        self.enter("now_page").await?;
        Ok(self.state.lock().unwrap().now_pages.get(address).cloned())
    }

    pub(crate) async fn save_now_page(
        &self,
        page: &NowPage,
        _credential: &Credential,
    ) -> Result<()> {
        self.enter("save_now_page").await?;
        self.set_now_page(page.clone());
        Ok(())
    }

    pub(crate) async fn pastes(
        &self,
        address: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<Paste>> {
        self.enter("pastes").await?;
        let state = self.state.lock().unwrap();
        let mut pastes: Vec<Paste> = state
            .pastes
            .values()
            .filter(|paste| paste.owner == address)
            .cloned()
            .collect();
        pastes.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pastes)
    }

    pub(crate) async fn paste(
        &self,
        address: &str,
        title: &str,
        _credential: Option<&Credential>,
    ) -> Result<Option<Paste>> {
        self.enter("paste").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .pastes
            .get(&(address.to_string(), title.to_string()))
            .cloned())
    }

    pub(crate) async fn save_paste(&self, paste: &Paste, _credential: &Credential) -> Result<()> {
        self.enter("save_paste").await?;
        self.set_paste(paste.clone());
        Ok(())
    }

    pub(crate) async fn delete_paste(
        &self,
        address: &str,
        title: &str,
        _credential: &Credential,
    ) -> Result<()> {
        self.enter("delete_paste").await?;
        self.state
            .lock()
            .unwrap()
            .pastes
            .remove(&(address.to_string(), title.to_string()));
        Ok(())
    }

    pub(crate) async fn purls(
        &self,
        address: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<Purl>> {
        self.enter("purls").await?;
        let state = self.state.lock().unwrap();
        let mut purls: Vec<Purl> = state
            .purls
            .values()
            .filter(|purl| purl.owner == address)
            .cloned()
            .collect();
        purls.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(purls)
    }

    pub(crate) async fn purl(
        &self,
        address: &str,
        name: &str,
        _credential: Option<&Credential>,
    ) -> Result<Option<Purl>> {
        self.enter("purl").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .purls
            .get(&(address.to_string(), name.to_string()))
            .cloned())
    }

    pub(crate) async fn save_purl(&self, purl: &Purl, _credential: &Credential) -> Result<()> {
        self.enter("save_purl").await?;
        self.set_purl(purl.clone());
        Ok(())
    }

    pub(crate) async fn delete_purl(
        &self,
        address: &str,
        name: &str,
        _credential: &Credential,
    ) -> Result<()> {
        self.enter("delete_purl").await?;
        self.state
            .lock()
            .unwrap()
            .purls
            .remove(&(address.to_string(), name.to_string()));
        Ok(())
    }

    pub(crate) async fn statuses(&self, address: &str) -> Result<Vec<Status>> {
        self.enter("statuses").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .statuses
            .iter()
            .filter(|status| status.address == address)
            .cloned()
            .collect())
    }

    pub(crate) async fn statuslog(&self) -> Result<Vec<Status>> {
        self.enter("statuslog").await?;
        Ok(self.state.lock().unwrap().statuses.clone())
    }

    pub(crate) async fn post_status(
        &self,
        address: &str,
        content: &str,
        emoji: Option<&str>,
        _credential: &Credential,
    ) -> Result<Status> {
        self.enter("post_status").await?;
        let mut state = self.state.lock().unwrap();
        state.next_status_id += 1;
        let mut status = Status::new(&format!("mock-{}", state.next_status_id), address, content);
        status.emoji = emoji.map(str::to_string);
        state.statuses.push(status.clone());
        Ok(status)
    }

    pub(crate) async fn delete_status(
        &self,
        address: &str,
        id: &str,
        _credential: &Credential,
    ) -> Result<()> {
        self.enter("delete_status").await?;
        self.state
            .lock()
            .unwrap()
            .statuses
            .retain(|status| !(status.address == address && status.id == id));
        Ok(())
    }

    pub(crate) async fn icon(&self, address: &str) -> Result<Option<Vec<u8>>> {
        self.enter("icon").await?;
        Ok(self.state.lock().unwrap().icons.get(address).cloned())
    }

    pub(crate) async fn account_addresses(&self, _credential: &Credential) -> Result<Vec<String>> {
        self.enter("account_addresses").await?;
        Ok(self.state.lock().unwrap().addresses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls_and_fails_on_demand() {
        let mock = MockClient::new();
        mock.set_directory(&["app", "calvin"]);

        assert_eq!(mock.directory().await.unwrap(), vec!["app", "calvin"]);
        assert_eq!(mock.calls("directory"), 1);

        mock.fail_with("boom");
        assert!(mock.directory().await.is_err());
        // Failed calls still count as calls.
        assert_eq!(mock.calls("directory"), 2);

        mock.recover();
        assert!(mock.directory().await.is_ok());
    }
}
