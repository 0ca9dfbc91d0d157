//! Uploader: ticket, tus transfer, then move into the destination folder.
//!
//! The three calls share no transaction. A ticket or transfer failure aborts the item. A move
//! failure is reported separately as [`UploadError::Move`] and carries the new video's uri,
//! because the video exists on the destination account but outside the intended folder.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::contract::{video_id_from_uri, DestinationLibrary};
use crate::error::ApiError;

/// A video that exists on the destination account and sits in the destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    pub uri: String,
    pub video_id: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read local file {path:?}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get upload ticket: {0}")]
    Ticket(#[source] ApiError),

    #[error("failed to upload file for {uri}: {source}")]
    Transfer {
        uri: String,
        #[source]
        source: ApiError,
    },

    #[error("uploaded {new_uri} but failed to move it to folder {folder_id}: {source}")]
    Move {
        new_uri: String,
        folder_id: String,
        #[source]
        source: ApiError,
    },
}

impl UploadError {
    /// The destination uri when the video was created before the failure.
    pub fn new_uri(&self) -> Option<&str> {
        match self {
            UploadError::Move { new_uri, .. } => Some(new_uri),
            UploadError::Transfer { uri, .. } => Some(uri),
            UploadError::LocalFile { .. } | UploadError::Ticket(_) => None,
        }
    }
}

/// Uploads `file_path` as `title` and moves the new video into `folder_id`.
pub async fn upload_video<D>(
    destination: &D,
    file_path: &Path,
    title: &str,
    folder_id: &str,
) -> Result<UploadedVideo, UploadError>
where
    D: DestinationLibrary + ?Sized,
{
    let size = tokio::fs::metadata(file_path)
        .await
        .map_err(|source| UploadError::LocalFile {
            path: file_path.display().to_string(),
            source,
        })?
        .len();

    info!(title, size, "Starting upload");
    let ticket = destination
        .create_upload_ticket(title, size)
        .await
        .map_err(|e| {
            error!(title, error = %e, "Failed to get upload ticket");
            UploadError::Ticket(e)
        })?;

    destination
        .transfer_file(&ticket, file_path, size)
        .await
        .map_err(|e| {
            error!(title, uri = %ticket.uri, error = %e, "Failed to upload file");
            UploadError::Transfer {
                uri: ticket.uri.clone(),
                source: e,
            }
        })?;
    info!(title, uri = %ticket.uri, "Upload complete");

    let video_id = video_id_from_uri(&ticket.uri)
        .ok_or_else(|| UploadError::Move {
            new_uri: ticket.uri.clone(),
            folder_id: folder_id.to_string(),
            source: ApiError::MissingField("uri"),
        })?
        .to_string();

    info!(video_id = %video_id, folder_id, "Moving video to folder");
    if let Err(e) = destination.move_to_folder(folder_id, &video_id).await {
        error!(title, video_id = %video_id, folder_id, error = %e, "Failed to move video to folder");
        return Err(UploadError::Move {
            new_uri: ticket.uri,
            folder_id: folder_id.to_string(),
            source: e,
        });
    }
    info!(title, video_id = %video_id, folder_id, "Video moved to folder");

    Ok(UploadedVideo {
        uri: ticket.uri,
        video_id,
    })
}
