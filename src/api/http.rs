//! HTTP client for the omg.lol-style REST interface

use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use super::Credential;
use crate::models::{NowPage, Paste, Profile, Purl, Status};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.omg.lol";

/// HTTP remote-interface client
pub struct HttpClient {
    client: reqwest::Client,
    base: String,
}

/// Standard response envelope wrapping every endpoint payload
#[derive(Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Deserialize)]
struct DirectoryResponse {
    directory: Vec<String>,
}

#[derive(Deserialize)]
struct ProfileResponse {
    content: String,
}

#[derive(Deserialize)]
struct NowResponse {
    now: NowValue,
}

#[derive(Deserialize)]
struct NowValue {
    content: String,
    #[serde(default)]
    updated: Option<i64>,
    #[serde(default)]
    listed: Option<i64>,
}

#[derive(Deserialize)]
struct PastebinResponse {
    pastebin: Vec<PasteValue>,
}

#[derive(Deserialize)]
struct PasteResponse {
    paste: PasteValue,
}

#[derive(Deserialize)]
struct PasteValue {
    title: String,
    content: String,
    #[serde(default)]
    modified_on: Option<i64>,
    #[serde(default)]
    listed: Option<i64>,
}

#[derive(Deserialize)]
struct PurlsResponse {
    purls: Vec<PurlValue>,
}

#[derive(Deserialize)]
struct PurlResponse {
    purl: PurlValue,
}

#[derive(Deserialize)]
struct PurlValue {
    name: String,
    url: String,
    #[serde(default)]
    counter: Option<i64>,
    #[serde(default)]
    listed: Option<i64>,
}

#[derive(Deserialize)]
struct StatusesResponse {
    statuses: Vec<StatusValue>,
}

#[derive(Deserialize)]
struct StatusValue {
    id: String,
    address: String,
    content: String,
    #[serde(default)]
    emoji: Option<String>,
    created: i64,
}

#[derive(Deserialize)]
struct PostedStatusResponse {
    status: StatusValue,
}

#[derive(Deserialize)]
struct AddressesResponse {
    addresses: Vec<String>,
}

#[derive(Serialize)]
struct SavePasteRequest<'a> {
    title: &'a str,
    content: &'a str,
    listed: i64,
}

#[derive(Serialize)]
struct SavePurlRequest<'a> {
    name: &'a str,
    url: &'a str,
    listed: i64,
}

#[derive(Serialize)]
struct PostStatusRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    emoji: Option<&'a str>,
}

#[derive(Serialize)]
struct SaveContentRequest<'a> {
    content: &'a str,
}

impl HttpClient {
    /// Create a client against the default service
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a specific base URL
    pub fn with_base_url(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base)
    }

    fn get(&self, endpoint: &str, credential: Option<&Credential>) -> reqwest::RequestBuilder {
        let mut request = self.client.get(self.url(endpoint));
        if let Some(credential) = credential {
            request = request.header("Authorization", format!("Bearer {}", credential.as_str()));
        }
        request
    }

    fn authed(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(endpoint))
            .header("Authorization", format!("Bearer {}", credential.as_str()))
    }

    /// Fetch the public address directory
    pub async fn directory(&self) -> Result<Vec<String>> {
        let response = self
            .get("/directory", None)
            .send()
            .await
            .context("Failed to fetch directory")?;
        let envelope: Envelope<DirectoryResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse directory response")?;
        Ok(envelope.response.directory)
    }

    /// Fetch an address's profile page
    pub async fn profile(&self, address: &str) -> Result<Option<Profile>> {
        let endpoint = format!("/address/{}/web", encode(address));
        let response = self
            .get(&endpoint, None)
            .send()
            .await
            .context("Failed to fetch profile")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<ProfileResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse profile response")?;
        Ok(Some(Profile::new(address, &envelope.response.content)))
    }

    /// Save an address's profile page
    pub async fn save_profile(&self, profile: &Profile, credential: &Credential) -> Result<()> {
        let endpoint = format!("/address/{}/web", encode(&profile.address));
        let response = self
            .authed(reqwest::Method::POST, &endpoint, credential)
            .json(&SaveContentRequest {
                content: &profile.content,
            })
            .send()
            .await
            .context("Failed to save profile")?;
        checked(response).await.map(|_| ())
    }

    /// Fetch an address's /now page
    pub async fn now_page(&self, address: &str) -> Result<Option<NowPage>> {
        let endpoint = format!("/address/{}/now", encode(address));
        let response = self
            .get(&endpoint, None)
            .send()
            .await
            .context("Failed to fetch now page")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<NowResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse now page response")?;
        let value = envelope.response.now;
        let mut page = NowPage::new(address, &value.content);
        page.updated = value.updated.and_then(|ts| DateTime::from_timestamp(ts, 0));
        page.listed = value.listed.unwrap_or(1) != 0;
        Ok(Some(page))
    }

    /// Save an address's /now page
    pub async fn save_now_page(&self, page: &NowPage, credential: &Credential) -> Result<()> {
        let endpoint = format!("/address/{}/now", encode(&page.address));
        let response = self
            .authed(reqwest::Method::POST, &endpoint, credential)
            .json(&SaveContentRequest {
                content: &page.content,
            })
            .send()
            .await
            .context("Failed to save now page")?;
        checked(response).await.map(|_| ())
    }

    /// Fetch an address's pastebin
    pub async fn pastes(
        &self,
        address: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<Paste>> {
        let endpoint = format!("/address/{}/pastebin", encode(address));
        let response = self
            .get(&endpoint, credential)
            .send()
            .await
            .context("Failed to fetch pastebin")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let envelope: Envelope<PastebinResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse pastebin response")?;
        Ok(envelope
            .response
            .pastebin
            .into_iter()
            .map(|value| value.into_paste(address))
            .collect())
    }

    /// Fetch a single paste by title
    pub async fn paste(
        &self,
        address: &str,
        title: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<Paste>> {
        let endpoint = format!("/address/{}/pastebin/{}", encode(address), encode(title));
        let response = self
            .get(&endpoint, credential)
            .send()
            .await
            .context("Failed to fetch paste")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<PasteResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse paste response")?;
        Ok(Some(envelope.response.paste.into_paste(address)))
    }

    /// Create or update a paste
    pub async fn save_paste(&self, paste: &Paste, credential: &Credential) -> Result<()> {
        let endpoint = format!("/address/{}/pastebin", encode(&paste.owner));
        let response = self
            .authed(reqwest::Method::POST, &endpoint, credential)
            .json(&SavePasteRequest {
                title: &paste.title,
                content: &paste.content,
                listed: i64::from(paste.listed),
            })
            .send()
            .await
            .context("Failed to save paste")?;
        checked(response).await.map(|_| ())
    }

    /// Delete a paste
    pub async fn delete_paste(
        &self,
        address: &str,
        title: &str,
        credential: &Credential,
    ) -> Result<()> {
        let endpoint = format!("/address/{}/pastebin/{}", encode(address), encode(title));
        let response = self
            .authed(reqwest::Method::DELETE, &endpoint, credential)
            .send()
            .await
            .context("Failed to delete paste")?;
        checked(response).await.map(|_| ())
    }

    /// Fetch an address's PURLs
    pub async fn purls(&self, address: &str, credential: Option<&Credential>) -> Result<Vec<Purl>> {
        let endpoint = format!("/address/{}/purls", encode(address));
        let response = self
            .get(&endpoint, credential)
            .send()
            .await
            .context("Failed to fetch PURLs")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let envelope: Envelope<PurlsResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse PURLs response")?;
        Ok(envelope
            .response
            .purls
            .into_iter()
            .map(|value| value.into_purl(address))
            .collect())
    }

    /// Fetch a single PURL by name
    pub async fn purl(
        &self,
        address: &str,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<Purl>> {
        let endpoint = format!("/address/{}/purl/{}", encode(address), encode(name));
        let response = self
            .get(&endpoint, credential)
            .send()
            .await
            .context("Failed to fetch PURL")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<PurlResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse PURL response")?;
        Ok(Some(envelope.response.purl.into_purl(address)))
    }

    /// Create or update a PURL
    pub async fn save_purl(&self, purl: &Purl, credential: &Credential) -> Result<()> {
        let endpoint = format!("/address/{}/purl", encode(&purl.owner));
        let response = self
            .authed(reqwest::Method::POST, &endpoint, credential)
            .json(&SavePurlRequest {
                name: &purl.name,
                url: &purl.url,
                listed: i64::from(purl.listed),
            })
            .send()
            .await
            .context("Failed to save PURL")?;
        checked(response).await.map(|_| ())
    }

    /// Delete a PURL
    pub async fn delete_purl(
        &self,
        address: &str,
        name: &str,
        credential: &Credential,
    ) -> Result<()> {
        let endpoint = format!("/address/{}/purl/{}", encode(address), encode(name));
        let response = self
            .authed(reqwest::Method::DELETE, &endpoint, credential)
            .send()
            .await
            .context("Failed to delete PURL")?;
        checked(response).await.map(|_| ())
    }

    /// Fetch one address's statuslog
    pub async fn statuses(&self, address: &str) -> Result<Vec<Status>> {
        let endpoint = format!("/address/{}/statuses", encode(address));
        let response = self
            .get(&endpoint, None)
            .send()
            .await
            .context("Failed to fetch statuses")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let envelope: Envelope<StatusesResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse statuses response")?;
        Ok(envelope
            .response
            .statuses
            .into_iter()
            .map(StatusValue::into_status)
            .collect())
    }

    /// Fetch the service-wide latest statuslog
    pub async fn statuslog(&self) -> Result<Vec<Status>> {
        let response = self
            .get("/statuslog/latest", None)
            .send()
            .await
            .context("Failed to fetch statuslog")?;
        let envelope: Envelope<StatusesResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse statuslog response")?;
        Ok(envelope
            .response
            .statuses
            .into_iter()
            .map(StatusValue::into_status)
            .collect())
    }

    /// Post a new status
    pub async fn post_status(
        &self,
        address: &str,
        content: &str,
        emoji: Option<&str>,
        credential: &Credential,
    ) -> Result<Status> {
        let endpoint = format!("/address/{}/statuses", encode(address));
        let response = self
            .authed(reqwest::Method::POST, &endpoint, credential)
            .json(&PostStatusRequest { content, emoji })
            .send()
            .await
            .context("Failed to post status")?;
        let envelope: Envelope<PostedStatusResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse posted status")?;
        Ok(envelope.response.status.into_status())
    }

    /// Delete a status
    pub async fn delete_status(
        &self,
        address: &str,
        id: &str,
        credential: &Credential,
    ) -> Result<()> {
        let endpoint = format!("/address/{}/statuses/{}", encode(address), encode(id));
        let response = self
            .authed(reqwest::Method::DELETE, &endpoint, credential)
            .send()
            .await
            .context("Failed to delete status")?;
        checked(response).await.map(|_| ())
    }

    /// Fetch an address's icon bytes
    pub async fn icon(&self, address: &str) -> Result<Option<Vec<u8>>> {
        let endpoint = format!("/address/{}/pfp", encode(address));
        let response = self
            .get(&endpoint, None)
            .send()
            .await
            .context("Failed to fetch icon")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = checked(response)
            .await?
            .bytes()
            .await
            .context("Failed to read icon bytes")?;
        Ok(Some(bytes.to_vec()))
    }

    /// Fetch the addresses owned by the credential's account
    pub async fn account_addresses(&self, credential: &Credential) -> Result<Vec<String>> {
        let response = self
            .get("/account/addresses", Some(credential))
            .send()
            .await
            .context("Failed to fetch account addresses")?;
        let envelope: Envelope<AddressesResponse> = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse addresses response")?;
        Ok(envelope.response.addresses)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Bail with status and body on a non-2xx response
async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("service error {status}: {body}");
    }
    Ok(response)
}

impl PasteValue {
    fn into_paste(self, owner: &str) -> Paste {
        let mut paste = Paste::new(owner, &self.title, &self.content);
        paste.modified = self
            .modified_on
            .and_then(|ts| DateTime::from_timestamp(ts, 0));
        paste.listed = self.listed.unwrap_or(1) != 0;
        paste
    }
}

impl PurlValue {
    fn into_purl(self, owner: &str) -> Purl {
        let mut purl = Purl::new(owner, &self.name, &self.url);
        purl.counter = self.counter;
        purl.listed = self.listed.unwrap_or(1) != 0;
        purl
    }
}

impl StatusValue {
    fn into_status(self) -> Status {
        let mut status = Status::new(&self.id, &self.address, &self.content);
        status.emoji = self.emoji;
        if let Some(posted) = DateTime::from_timestamp(self.created, 0) {
            status.posted = posted;
        }
        status
    }
}
