//! Background refresh loop over the account aggregate

use std::sync::Arc;
use tokio::time::{Duration, interval};

use crate::fetch::{AccountFetcher, Loadable};

/// Drives periodic refreshes of the account's fetchers
pub struct RefreshManager {
    account: Arc<AccountFetcher>,
}

impl RefreshManager {
    /// Create a manager over the account aggregate
    pub fn new(account: Arc<AccountFetcher>) -> Self {
        Self { account }
    }

    /// Refresh the account plus every cached address summary once
    pub async fn refresh_all(&self) {
        self.account.update_if_needed().await;
        if let Some(err) = self.account.error() {
            tracing::warn!("Account refresh failed: {err}");
        }

        for address in self.account.addresses() {
            let summary = self.account.summary(&address);
            summary.update_if_needed().await;
            if let Some(err) = summary.error() {
                tracing::warn!("Failed to refresh {address}: {err}");
            }
        }
    }

    /// Start a background refresh loop
    pub async fn start_background_refresh(self: Arc<Self>, interval_secs: u64) {
        if interval_secs == 0 {
            return; // Manual refresh only
        }

        let mut interval = interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            self.refresh_all().await;
            tracing::debug!("background refresh pass complete");
        }
    }
}
