//! reqwest client for the Vimeo REST API; implements [`SourceLibrary`] and
//! [`DestinationLibrary`].
//!
//! - Construct one [`VimeoClient`] per account with [`VimeoClient::from_config`].
//! - Every API request carries the bearer token and the versioned `Accept` header.
//! - Metadata calls (listing pages, detail, ticket, move) go through [`with_retry`].
//!   The streaming download and the tus transfer do not, since their bodies are consumed.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::{AccountConfig, MigrationConfig, RetryConfig, DEFAULT_PAGE_SIZE};
use crate::contract::{
    DestinationLibrary, SourceLibrary, UploadTicket, VideoDetail, VideoRecord,
};
use crate::error::ApiError;
use crate::retry::with_retry;
use crate::{download, listing};

pub const VIMEO_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
pub const TUS_RESUMABLE_VERSION: &str = "1.0.0";
pub const TUS_CONTENT_TYPE: &str = "application/offset+octet-stream";

pub struct VimeoClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    page_size: u32,
    retry: RetryConfig,
}

impl VimeoClient {
    /// Client with default HTTP settings and the default retry policy.
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_http(reqwest::Client::new(), base_url, access_token)
    }

    /// Client for one account, using the timeout, TLS and retry settings of `config`.
    pub fn from_config(config: &MigrationConfig, account: &AccountConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if config.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;
        let client = Self::with_http(http, &config.api_base_url, account.access_token.clone())?
            .with_page_size(config.page_size)
            .with_retry(config.retry.clone());
        info!(
            api_base_url = %client.base_url,
            token_set = !client.access_token.is_empty(),
            "Initialized VimeoClient"
        );
        Ok(client)
    }

    fn with_http(
        http: reqwest::Client,
        base_url: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let mut base_url =
            Url::parse(base_url).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        // Url::join drops the last path segment unless it ends in '/'.
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }
        Ok(Self {
            http,
            base_url,
            access_token: access_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Absolute links are used as-is; anything else is appended to the API base URL,
    /// keeping any path prefix the base URL carries.
    pub fn resolve_url(&self, path_or_url: &str) -> Result<Url, ApiError> {
        match Url::parse(path_or_url) {
            Ok(url) => Ok(url),
            Err(_) => self
                .base_url
                .join(path_or_url.trim_start_matches('/'))
                .map_err(|_| ApiError::InvalidUrl(path_or_url.to_string())),
        }
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, VIMEO_ACCEPT)
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        with_retry(&self.retry, "get_json", move || async move {
            debug!(url = %url, "GET");
            let response = self.authorized(Method::GET, url.clone()).send().await?;
            let body = ensure_success(response).await?.text().await?;
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
        })
        .await
    }
}

/// Turns a non-2xx response into [`ApiError::Status`], keeping the body for diagnostics.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<failed to read response body>"));
    Err(ApiError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

#[derive(Deserialize)]
struct TicketResponse {
    uri: Option<String>,
    upload: Option<TicketUpload>,
}

#[derive(Deserialize)]
struct TicketUpload {
    upload_link: Option<String>,
}

#[async_trait]
impl SourceLibrary for VimeoClient {
    async fn list_folder_videos(&self, folder_id: &str) -> Result<Vec<VideoRecord>, ApiError> {
        listing::list_folder_videos(self, folder_id).await
    }

    async fn get_video(&self, video_uri: &str) -> Result<VideoDetail, ApiError> {
        let url = self.resolve_url(video_uri)?;
        self.get_json(&url).await
    }

    async fn download_to(&self, link: &str, destination: &Path) -> Result<u64, ApiError> {
        let url = self.resolve_url(link)?;
        let response = self.authorized(Method::GET, url).send().await?;
        let response = ensure_success(response).await?;
        download::stream_to_file(response, destination).await
    }
}

#[async_trait]
impl DestinationLibrary for VimeoClient {
    async fn create_upload_ticket(&self, name: &str, size: u64) -> Result<UploadTicket, ApiError> {
        let url = self.resolve_url("/me/videos")?;
        let body = serde_json::json!({
            "upload": {
                "approach": "tus",
                "size": size,
            },
            "name": name,
        });

        let (url, body) = (&url, &body);
        let ticket: TicketResponse = with_retry(&self.retry, "create_upload_ticket", move || async move {
            let response = self
                .authorized(Method::POST, url.clone())
                .header(CONTENT_TYPE, "application/json")
                .json(body)
                .send()
                .await?;
            let text = ensure_success(response).await?.text().await?;
            serde_json::from_str(&text).map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
        })
        .await?;

        let uri = ticket.uri.ok_or(ApiError::MissingField("uri"))?;
        let upload_link = ticket
            .upload
            .and_then(|upload| upload.upload_link)
            .ok_or(ApiError::MissingField("upload.upload_link"))?;
        info!(uri = %uri, size, "Received upload ticket");
        Ok(UploadTicket { uri, upload_link })
    }

    async fn transfer_file(
        &self,
        ticket: &UploadTicket,
        file: &Path,
        size: u64,
    ) -> Result<(), ApiError> {
        let url = self.resolve_url(&ticket.upload_link)?;
        let body = tokio::fs::File::open(file).await?;

        let response = self
            .http
            .patch(url)
            .header("Tus-Resumable", TUS_RESUMABLE_VERSION)
            .header("Upload-Offset", "0")
            .header(CONTENT_TYPE, TUS_CONTENT_TYPE)
            .header(CONTENT_LENGTH, size)
            .body(reqwest::Body::from(body))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let reported = response
            .headers()
            .get("Upload-Offset")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        match reported {
            Some(offset) if offset != size => {
                error!(uri = %ticket.uri, offset, size, "tus server acknowledged a partial upload");
                Err(ApiError::IncompleteTransfer {
                    expected: size,
                    actual: offset,
                })
            }
            _ => Ok(()),
        }
    }

    async fn move_to_folder(&self, folder_id: &str, video_id: &str) -> Result<(), ApiError> {
        let url = self.resolve_url(&format!("/me/projects/{folder_id}/videos/{video_id}"))?;
        let url = &url;
        with_retry(&self.retry, "move_to_folder", move || async move {
            let response = self.authorized(Method::PUT, url.clone()).send().await?;
            ensure_success(response).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_joined_onto_base_url() {
        let client = VimeoClient::new("https://api.vimeo.com", "token").unwrap();
        let url = client
            .resolve_url("/me/projects/1/videos?page=2&per_page=100")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.vimeo.com/me/projects/1/videos?page=2&per_page=100"
        );
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        for base in ["http://localhost:1/api", "http://localhost:1/api/"] {
            let client = VimeoClient::new(base, "token").unwrap();
            assert_eq!(
                client.resolve_url("/me/videos").unwrap().as_str(),
                "http://localhost:1/api/me/videos"
            );
            assert_eq!(
                client.resolve_url("/me/projects/1/videos?page=2").unwrap().as_str(),
                "http://localhost:1/api/me/projects/1/videos?page=2"
            );
        }
    }

    #[test]
    fn absolute_links_are_kept() {
        let client = VimeoClient::new("https://api.vimeo.com", "token").unwrap();
        let url = client
            .resolve_url("https://player.vimeo.com/play/123?s=abc")
            .unwrap();
        assert_eq!(url.host_str(), Some("player.vimeo.com"));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            VimeoClient::new("not a url", "token"),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
