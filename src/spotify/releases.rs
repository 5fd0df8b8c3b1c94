//! Release discovery: recency scanning of an artist's catalog and resolution
//! of album releases down to track uris.

use std::collections::BTreeSet;

use futures::{Stream, TryStreamExt};

use crate::{
    error::{Error, Result},
    spotify::CatalogClient,
    types::GetAlbumResponse,
    utils::{ALBUM_BATCH_LIMIT, RecencyWindow, ReleaseAge, ReleaseKinds, id_from_uri},
};

/// Parameters of one artist catalog scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub window: RecencyWindow,
    /// Releases requested per page.
    pub page_size: u32,
    pub include_groups: ReleaseKinds,
}

/// Lazily yields the uris of an artist's releases dated inside the window.
///
/// The catalog lists every release group newest first, so each group is
/// paged separately and abandoned at its first stale release. Releases with
/// a partial or malformed date are skipped without ending the scan.
///
/// Nothing is fetched until the stream is polled, and dropping it stops the
/// scan.
///
/// # Arguments
///
/// * `catalog` - Client acting for the user whose radar is built
/// * `artist_id` - Spotify id of the followed artist
/// * `options` - Window, page size and release groups to scan
///
/// # Returns
///
/// A stream of release uris (`spotify:album:...`) in catalog order, one
/// group after the other.
///
/// # Classification
///
/// - recent: within `window` days of today in either direction, yielded
/// - upcoming: further ahead than the window, skipped
/// - undated: partial or malformed date, skipped
/// - stale: further back than the window, ends the group
///
/// # Errors
///
/// The first failed page request is yielded as an error and ends the stream.
pub fn scan_recent_releases<'a, C>(
    catalog: &'a C,
    artist_id: &'a str,
    options: &'a ScanOptions,
) -> impl Stream<Item = Result<String>> + Send + 'a
where
    C: CatalogClient + ?Sized,
{
    async_stream::try_stream! {
        for group in options.include_groups.kinds() {
            let mut offset = 0u32;

            'pages: loop {
                let page = catalog
                    .artist_releases(artist_id, *group, offset, options.page_size)
                    .await?;
                let fetched = page.items.len() as u32;

                for release in page.items {
                    match options.window.classify(&release.release_date) {
                        ReleaseAge::Recent => yield release.uri,
                        ReleaseAge::Undated => {
                            tracing::trace!(
                                artist_id,
                                release = %release.uri,
                                release_date = %release.release_date,
                                "skipping release without a full date"
                            );
                        }
                        // announced releases sit on top of the newest-first listing
                        ReleaseAge::Upcoming => {
                            tracing::trace!(
                                artist_id,
                                release = %release.uri,
                                release_date = %release.release_date,
                                "skipping upcoming release"
                            );
                        }
                        ReleaseAge::Stale => break 'pages,
                    }
                }

                if fetched == 0 || page.next.is_none() {
                    break;
                }
                offset += fetched;
            }
        }
    }
}

/// Drains [`scan_recent_releases`] into a list.
///
/// Fails as a whole if any page request fails.
pub async fn recent_releases<C>(
    catalog: &C,
    artist_id: &str,
    options: &ScanOptions,
) -> Result<Vec<String>>
where
    C: CatalogClient + ?Sized,
{
    scan_recent_releases(catalog, artist_id, options)
        .try_collect()
        .await
}

/// Track uris a resolved album contributes.
///
/// Singles are often delivered as a container with bonus or instrumental
/// versions; only the first track is wanted. Other albums contribute all
/// tracks.
pub fn album_track_uris(album: &GetAlbumResponse) -> Vec<String> {
    let tracks = album.tracks.items.iter().map(|t| t.uri.clone());
    if album.album_type.eq_ignore_ascii_case("single") {
        tracks.take(1).collect()
    } else {
        tracks.collect()
    }
}

/// Resolves album uris to their track uris.
///
/// Duplicate uris are collapsed first. Lookups go out in batches of at most
/// [`ALBUM_BATCH_LIMIT`] ids; any failed batch aborts the whole resolution.
///
/// # Arguments
///
/// * `catalog` - Client used for the album lookups
/// * `album_uris` - Album uris or bare album ids, duplicates allowed
///
/// # Returns
///
/// Track uris of every resolved album, with [`album_track_uris`] applied.
/// Albums the catalog no longer knows contribute nothing.
///
/// # Errors
///
/// [`Error::BatchResolution`] carrying the zero-based batch index and the
/// underlying failure.
///
/// # Example
///
/// ```ignore
/// let uris = vec!["spotify:album:4aawyAB9vmqN3uQ7FjRGTy".to_string()];
/// let tracks = resolve_albums_to_tracks(&client, uris).await?;
/// ```
pub async fn resolve_albums_to_tracks<C, I>(catalog: &C, album_uris: I) -> Result<Vec<String>>
where
    C: CatalogClient + ?Sized,
    I: IntoIterator<Item = String>,
{
    let ids: Vec<String> = album_uris
        .into_iter()
        .map(|uri| id_from_uri(&uri).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut track_uris = Vec::new();
    for (batch, chunk) in ids.chunks(ALBUM_BATCH_LIMIT).enumerate() {
        let albums = catalog
            .albums(chunk)
            .await
            .map_err(|e| Error::BatchResolution {
                batch,
                source: Box::new(e),
            })?;

        for album in &albums {
            track_uris.extend(album_track_uris(album));
        }
    }

    tracing::debug!(
        albums = ids.len(),
        tracks = track_uris.len(),
        "resolved albums to tracks"
    );
    Ok(track_uris)
}
