//! Folder lister: walks every page of a project's video listing.

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::VimeoClient;
use crate::contract::VideoRecord;
use crate::error::ApiError;

/// One page of `GET /me/projects/{id}/videos`.
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<VideoRecord>,
    #[serde(default)]
    pub paging: Paging,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// Path of the first listing page: alphabetical, ascending.
pub fn first_page_path(folder_id: &str, page_size: u32) -> String {
    format!("/me/projects/{folder_id}/videos?per_page={page_size}&sort=alphabetical&direction=asc")
}

/// Fetches pages until `paging.next` is absent and returns all records in server order.
/// Any failed page fails the whole listing.
pub async fn list_folder_videos(
    client: &VimeoClient,
    folder_id: &str,
) -> Result<Vec<VideoRecord>, ApiError> {
    let mut videos = Vec::new();
    let mut next = Some(first_page_path(folder_id, client.page_size()));
    let mut pages = 0usize;

    while let Some(path) = next.take() {
        let url = client.resolve_url(&path)?;
        let page: Page = client.get_json(&url).await?;
        pages += 1;
        debug!(page = pages, items = page.data.len(), url = %url, "Fetched listing page");
        videos.extend(page.data);
        next = page.paging.next.filter(|link| !link.is_empty());
    }

    info!(folder_id, pages, count = videos.len(), "Listed source folder");
    Ok(videos)
}
