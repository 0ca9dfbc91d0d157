//! Item resolver: picks the widest download variant of a video.

use tracing::{debug, error, warn};

use crate::contract::{DownloadVariant, ResolvedVideo, SourceLibrary};

/// The variant with the greatest width. A missing width counts as zero and the
/// first of several equally wide variants wins.
pub fn select_best_variant(variants: &[DownloadVariant]) -> Option<&DownloadVariant> {
    variants.iter().fold(None, |best: Option<&DownloadVariant>, candidate| match best {
        Some(current) if current.width.unwrap_or(0) >= candidate.width.unwrap_or(0) => Some(current),
        _ => Some(candidate),
    })
}

/// Fetches the video's detail and returns its name with the best download link.
///
/// Returns `None` when the request fails, the video has no name, or no variant carries a
/// link. The reason is logged.
pub async fn resolve_video<S>(source: &S, video_uri: &str) -> Option<ResolvedVideo>
where
    S: SourceLibrary + ?Sized,
{
    let detail = match source.get_video(video_uri).await {
        Ok(detail) => detail,
        Err(e) => {
            error!(video_uri, error = %e, "Failed to fetch video details");
            return None;
        }
    };

    let Some(best) = select_best_variant(detail.variants()) else {
        warn!(video_uri, "No download links found");
        return None;
    };
    let Some(link) = best.link.clone() else {
        warn!(video_uri, width = ?best.width, "Best download variant has no link");
        return None;
    };
    let Some(name) = detail.name.clone() else {
        warn!(video_uri, "Video detail has no name");
        return None;
    };

    debug!(video_uri, width = ?best.width, quality = ?best.quality, "Selected download variant");
    Some(ResolvedVideo { name, link })
}
