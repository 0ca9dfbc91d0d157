use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info};

use crate::contract::SourceLibrary;
use crate::error::ApiError;

/// Write buffer size used while streaming a download to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// Local file name for a video title: spaces (and path separators) become `_`, plus `.mp4`.
pub fn temp_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{stem}.mp4")
}

/// Downloads `link` into `download_dir` under [`temp_filename`] of `title`.
///
/// An existing file of the same name is overwritten. On failure the partial file, if any,
/// is left where it is and the error is returned to the caller.
pub async fn download_video<S>(
    source: &S,
    link: &str,
    title: &str,
    download_dir: &Path,
) -> Result<PathBuf, ApiError>
where
    S: SourceLibrary + ?Sized,
{
    let path = download_dir.join(temp_filename(title));
    info!(title, path = %path.display(), "Downloading video");

    match source.download_to(link, &path).await {
        Ok(bytes) => {
            info!(title, bytes, path = %path.display(), "Download complete");
            Ok(path)
        }
        Err(e) => {
            error!(title, error = %e, path = %path.display(), "Failed to download video");
            Err(e)
        }
    }
}

/// Streams a response body into `destination`, truncating it first.
pub(crate) async fn stream_to_file(
    response: reqwest::Response,
    destination: &Path,
) -> Result<u64, ApiError> {
    let file = tokio::fs::File::create(destination).await?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;

    debug!(path = %destination.display(), bytes = written, "Wrote download to disk");
    Ok(written)
}
