//! High-level pipeline: list → resolve → download → upload → move → cleanup.
//!
//! [`migrate`] lists the source folder once and then processes each video to completion
//! before starting the next one. Per-item failures are logged and recorded in the
//! [`MigrationReport`]; only a failure to prepare the download directory or to list the
//! source folder aborts the run.
//!
//! # Cleanup
//! Every downloaded temporary file is removed after its upload attempt, whatever the upload
//! outcome. A failed download claims no file, so nothing is removed for it.
//!
//! # Navigation
//! - Main entrypoint: [`migrate`]
//! - Supporting types: [`MigrationReport`], [`ItemReport`], [`ItemOutcome`].

use std::path::Path;

use tracing::{error, info, warn};

use crate::config::MigrationConfig;
use crate::contract::{DestinationLibrary, SourceLibrary, VideoRecord};
use crate::download::download_video;
use crate::error::MigrateError;
use crate::resolve::resolve_video;
use crate::upload::{upload_video, UploadError};

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub items: Vec<ItemReport>,
    pub temp_files_removed: usize,
}

impl MigrationReport {
    pub fn migrated(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Migrated { .. }))
    }

    /// Items that were attempted but did not end up in the destination folder.
    pub fn failed(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                ItemOutcome::DownloadFailed { .. }
                    | ItemOutcome::UploadFailed { .. }
                    | ItemOutcome::MoveFailed { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Skipped { .. }))
    }

    /// Items whose download completed and that reached the upload step. This includes uploads
    /// that failed before a ticket was requested, such as an unreadable temp file.
    pub fn upload_attempts(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                ItemOutcome::Migrated { .. }
                    | ItemOutcome::UploadFailed { .. }
                    | ItemOutcome::MoveFailed { .. }
            )
        })
    }

    /// Videos that were uploaded but are not in the destination folder.
    pub fn needs_reconciliation(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::MoveFailed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(&item.outcome)).count()
    }
}

#[derive(Debug)]
pub struct ItemReport {
    pub source_uri: Option<String>,
    pub name: Option<String>,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Migrated { new_uri: String },
    /// Uploaded, but left outside the destination folder.
    MoveFailed { new_uri: String, error: String },
    Skipped { reason: String },
    DownloadFailed { error: String },
    UploadFailed { error: String },
}

/// Migrates every video of the source folder into the destination folder.
pub async fn migrate<S, D>(
    config: &MigrationConfig,
    source: &S,
    destination: &D,
) -> Result<MigrationReport, MigrateError>
where
    S: SourceLibrary + ?Sized,
    D: DestinationLibrary + ?Sized,
{
    info!("[MIGRATE] Starting migration");

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .map_err(|source| {
            error!(path = %config.download_dir.display(), error = ?source, "[MIGRATE][ERROR] Failed to create download directory");
            MigrateError::DownloadDir {
                path: config.download_dir.clone(),
                source,
            }
        })?;

    let folder_id = &config.source.folder_id;
    let videos = source
        .list_folder_videos(folder_id)
        .await
        .map_err(|source| {
            error!(folder_id = %folder_id, error = %source, "[MIGRATE][ERROR] Failed to list source folder");
            MigrateError::Listing {
                folder_id: folder_id.clone(),
                source,
            }
        })?;
    info!(count = videos.len(), folder_id = %folder_id, "[MIGRATE] Found videos in source folder");

    let mut report = MigrationReport::default();

    for VideoRecord { uri, name } in videos {
        let (uri, name) = match (uri, name) {
            (Some(uri), Some(name)) if !uri.is_empty() && !name.is_empty() => (uri, name),
            (uri, name) => {
                warn!(?uri, ?name, "[MIGRATE] Skipping a video due to missing URI or name");
                report.items.push(ItemReport {
                    source_uri: uri,
                    name,
                    outcome: ItemOutcome::Skipped {
                        reason: "missing uri or name".into(),
                    },
                });
                continue;
            }
        };

        info!(video_uri = %uri, "[MIGRATE] Processing source video");
        let outcome = migrate_one(config, source, destination, &uri, &mut report).await;
        match &outcome {
            ItemOutcome::Migrated { new_uri } => {
                info!(video_uri = %uri, new_uri = %new_uri, "[MIGRATE] Video migrated")
            }
            ItemOutcome::MoveFailed { new_uri, .. } => {
                warn!(video_uri = %uri, new_uri = %new_uri, "[MIGRATE] Video uploaded but not moved; needs manual reconciliation")
            }
            ItemOutcome::Skipped { reason } => {
                warn!(video_uri = %uri, reason = %reason, "[MIGRATE] Video skipped")
            }
            ItemOutcome::DownloadFailed { .. } | ItemOutcome::UploadFailed { .. } => {}
        }
        report.items.push(ItemReport {
            source_uri: Some(uri),
            name: Some(name),
            outcome,
        });
    }

    info!(
        total = report.items.len(),
        migrated = report.migrated(),
        failed = report.failed(),
        skipped = report.skipped(),
        temp_files_removed = report.temp_files_removed,
        "[MIGRATE] Migration completed"
    );
    Ok(report)
}

async fn migrate_one<S, D>(
    config: &MigrationConfig,
    source: &S,
    destination: &D,
    video_uri: &str,
    report: &mut MigrationReport,
) -> ItemOutcome
where
    S: SourceLibrary + ?Sized,
    D: DestinationLibrary + ?Sized,
{
    let Some(resolved) = resolve_video(source, video_uri).await else {
        return ItemOutcome::Skipped {
            reason: "no download link or title".into(),
        };
    };

    let temp_path =
        match download_video(source, &resolved.link, &resolved.name, &config.download_dir).await {
            Ok(path) => path,
            Err(e) => {
                return ItemOutcome::DownloadFailed {
                    error: e.to_string(),
                }
            }
        };

    let uploaded = upload_video(
        destination,
        &temp_path,
        &resolved.name,
        &config.destination.folder_id,
    )
    .await;

    if remove_temp_file(&temp_path).await {
        report.temp_files_removed += 1;
    }

    match uploaded {
        Ok(video) => ItemOutcome::Migrated { new_uri: video.uri },
        Err(e @ UploadError::Move { .. }) => ItemOutcome::MoveFailed {
            new_uri: e.new_uri().unwrap_or_default().to_string(),
            error: e.to_string(),
        },
        Err(e) => ItemOutcome::UploadFailed {
            error: e.to_string(),
        },
    }
}

async fn remove_temp_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "[MIGRATE] Removed temporary file");
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = ?e, "[MIGRATE][ERROR] Failed to remove temporary file");
            false
        }
    }
}
