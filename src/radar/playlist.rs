use std::{collections::BTreeSet, path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::time::sleep;

use crate::{
    config,
    error::{Error, Result},
    spotify::CatalogClient,
    types::{ImageUpload, ReconcileOutcome},
    utils::PLAYLIST_BATCH_LIMIT,
};

const DEFAULT_COVER_JPEG: &[u8] = include_bytes!("../../assets/cover.jpg");

/// Base64 JPEG for the playlist cover: the file at `path`, or the bundled image.
pub async fn load_cover_image(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            let bytes = async_fs::read(path).await?;
            Ok(STANDARD.encode(bytes))
        }
        None => Ok(STANDARD.encode(DEFAULT_COVER_JPEG)),
    }
}

/// Applies a final track set to a user's single Release Radar playlist.
///
/// Without a playlist one is created, given its cover and filled. With one,
/// its current content is removed and the new set inserted, so applying the
/// same set twice leaves the same content behind.
///
/// Persisting a newly created id is left to the caller, see
/// [`ReconcileOutcome::Created`].
#[derive(Debug, Clone)]
pub struct PlaylistReconciler {
    pub name: String,
    pub description: String,
    pub cover_jpeg_base64: String,
    /// Pause after creation and after the cover upload.
    pub settle_delay: Duration,
}

impl PlaylistReconciler {
    pub fn new(cover_jpeg_base64: String) -> Self {
        Self {
            name: config::DEFAULT_PLAYLIST_NAME.to_string(),
            description: config::DEFAULT_PLAYLIST_DESCRIPTION.to_string(),
            cover_jpeg_base64,
            settle_delay: Duration::from_secs(2),
        }
    }

    pub async fn reconcile<C>(
        &self,
        catalog: &C,
        user_id: &str,
        existing: Option<&str>,
        tracks: &BTreeSet<String>,
    ) -> Result<ReconcileOutcome>
    where
        C: CatalogClient + ?Sized,
    {
        let uris: Vec<String> = tracks.iter().cloned().collect();

        match existing {
            None => {
                let playlist_id = catalog
                    .create_playlist(user_id, &self.name, &self.description)
                    .await?;
                tracing::info!(user_id, playlist_id = %playlist_id, "created playlist");

                sleep(self.settle_delay).await;
                self.upload_cover(catalog, &playlist_id).await?;
                sleep(self.settle_delay).await;

                let added = add_tracks(catalog, &playlist_id, &uris).await?;
                Ok(ReconcileOutcome::Created { playlist_id, added })
            }
            Some(playlist_id) => {
                let current = current_track_uris(catalog, playlist_id).await?;
                let removed = current.len();
                for chunk in current.chunks(PLAYLIST_BATCH_LIMIT) {
                    catalog.remove_playlist_tracks(playlist_id, chunk).await?;
                }

                let added = add_tracks(catalog, playlist_id, &uris).await?;
                tracing::info!(playlist_id, removed, added, "replaced playlist content");

                Ok(ReconcileOutcome::Replaced {
                    playlist_id: playlist_id.to_string(),
                    removed,
                    added,
                })
            }
        }
    }

    /// Uploads the cover, retrying a rejected upload exactly once.
    async fn upload_cover<C>(&self, catalog: &C, playlist_id: &str) -> Result<()>
    where
        C: CatalogClient + ?Sized,
    {
        let mut retried = false;
        loop {
            match catalog
                .upload_playlist_image(playlist_id, &self.cover_jpeg_base64)
                .await?
            {
                ImageUpload::Accepted => return Ok(()),
                ImageUpload::Rejected { status, body } if retried => {
                    return Err(Error::ImageUpload {
                        playlist_id: playlist_id.to_string(),
                        status,
                        body,
                    });
                }
                ImageUpload::Rejected { status, .. } => {
                    tracing::warn!(playlist_id, status, "cover upload rejected, retrying once");
                    retried = true;
                }
            }
        }
    }
}

/// Every track uri currently in the playlist, listed 100 at a time.
async fn current_track_uris<C>(catalog: &C, playlist_id: &str) -> Result<Vec<String>>
where
    C: CatalogClient + ?Sized,
{
    let limit = PLAYLIST_BATCH_LIMIT as u32;
    let mut uris = BTreeSet::new();
    let mut offset = 0u32;

    loop {
        let page = catalog.playlist_tracks(playlist_id, limit, offset).await?;
        uris.extend(page.uris);
        if page.item_count < PLAYLIST_BATCH_LIMIT {
            break;
        }
        offset += limit;
    }

    Ok(uris.into_iter().collect())
}

async fn add_tracks<C>(catalog: &C, playlist_id: &str, uris: &[String]) -> Result<usize>
where
    C: CatalogClient + ?Sized,
{
    for chunk in uris.chunks(PLAYLIST_BATCH_LIMIT) {
        catalog.add_playlist_tracks(playlist_id, chunk).await?;
    }
    Ok(uris.len())
}
