//! # contract: the remote seams of the migration pipeline
//!
//! This module defines the plain data types exchanged with the video platform and the two
//! async traits the pipeline talks to:
//!
//! - [`SourceLibrary`]: the account videos are migrated *from* (list, inspect, download).
//! - [`DestinationLibrary`]: the account videos are migrated *to* (ticket, tus transfer, move).
//!
//! [`crate::client::VimeoClient`] implements both against the Vimeo REST API. Tests use the
//! `mockall` generated [`MockSourceLibrary`] and [`MockDestinationLibrary`], exported when the
//! `test-export-mocks` feature is on.
//!
//! ## Errors
//! Every method returns [`ApiError`]; callers decide whether a failure skips the current item
//! or aborts the run.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// One entry of a folder listing.
///
/// Both fields are optional on the wire; the pipeline skips records missing either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Resource path such as `/videos/123456`.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl VideoRecord {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            name: Some(name.into()),
        }
    }
}

/// A single downloadable rendition of a video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadVariant {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub link: Option<String>,
}

impl DownloadVariant {
    pub fn new(width: u64, link: impl Into<String>) -> Self {
        Self {
            width: Some(width),
            link: Some(link.into()),
            ..Default::default()
        }
    }
}

/// Item detail as returned by `GET {video_uri}`; only the fields the migration needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub download: Option<Vec<DownloadVariant>>,
}

impl VideoDetail {
    /// Downloadable variants in server order; empty when the field is absent or null.
    pub fn variants(&self) -> &[DownloadVariant] {
        self.download.as_deref().unwrap_or(&[])
    }
}

/// The outcome of resolving an item: what to call it and where to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub name: String,
    pub link: String,
}

/// Upload ticket returned by the destination for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    /// Resource path of the newly created video, e.g. `/videos/987654`.
    pub uri: String,
    /// tus endpoint the file body is sent to.
    pub upload_link: String,
}

impl UploadTicket {
    /// Numeric video id: the last path segment of [`UploadTicket::uri`].
    pub fn video_id(&self) -> Option<&str> {
        video_id_from_uri(&self.uri)
    }
}

/// Last non-empty path segment of a resource path (`/videos/42` -> `42`).
pub fn video_id_from_uri(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// The account videos are migrated from.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SourceLibrary: Send + Sync {
    /// Every video in the folder, following pagination to the end.
    async fn list_folder_videos(&self, folder_id: &str) -> Result<Vec<VideoRecord>, ApiError>;

    /// Metadata for one video, including its download variants.
    async fn get_video(&self, video_uri: &str) -> Result<VideoDetail, ApiError>;

    /// Streams `link` into `destination`, overwriting it. Returns the number of bytes written.
    async fn download_to(&self, link: &str, destination: &Path) -> Result<u64, ApiError>;
}

/// The account videos are migrated to.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DestinationLibrary: Send + Sync {
    /// Requests a tus upload ticket for a file of `size` bytes.
    async fn create_upload_ticket(&self, name: &str, size: u64) -> Result<UploadTicket, ApiError>;

    /// Sends the whole file as a single tus chunk starting at offset zero.
    async fn transfer_file(
        &self,
        ticket: &UploadTicket,
        file: &Path,
        size: u64,
    ) -> Result<(), ApiError>;

    /// Places an existing video into a folder.
    async fn move_to_folder(&self, folder_id: &str, video_id: &str) -> Result<(), ApiError>;
}
