use std::collections::BTreeSet;

use chrono::NaiveDate;
use futures::{StreamExt, stream};

use crate::{
    error::{Error, Result},
    spotify::{
        CatalogClient,
        artists::followed_artist_ids,
        releases::{ScanOptions, recent_releases, resolve_albums_to_tracks},
    },
    utils::{RecencyWindow, ReleaseKinds, split_release_uris},
};

/// Turns a user's followed artists into the deduplicated set of new track uris.
///
/// Every stage takes its input by value and hands its output to the next
/// one; nothing is kept between runs.
#[derive(Debug, Clone)]
pub struct ReleaseRadarAggregator {
    pub window_days: u32,
    pub page_size: u32,
    pub include_groups: ReleaseKinds,
    /// Upper bound of artists scanned at the same time.
    pub concurrency: usize,
}

impl Default for ReleaseRadarAggregator {
    fn default() -> Self {
        Self {
            window_days: 7,
            page_size: 5,
            include_groups: ReleaseKinds::default(),
            concurrency: 8,
        }
    }
}

impl ReleaseRadarAggregator {
    /// Resolves the followed artists and runs [`run`](Self::run) on them.
    pub async fn collect<C>(&self, catalog: &C, today: NaiveDate) -> Result<BTreeSet<String>>
    where
        C: CatalogClient + ?Sized,
    {
        let artist_ids = followed_artist_ids(catalog).await?;
        self.run(catalog, &artist_ids, today).await
    }

    /// Scans every artist, splits the results, resolves albums and returns the
    /// union of track uris.
    ///
    /// A failing artist is logged and skipped. The run only fails when every
    /// artist failed, or when album resolution fails.
    pub async fn run<C>(
        &self,
        catalog: &C,
        artist_ids: &BTreeSet<String>,
        today: NaiveDate,
    ) -> Result<BTreeSet<String>>
    where
        C: CatalogClient + ?Sized,
    {
        let options = ScanOptions {
            window: RecencyWindow::new(today, self.window_days),
            page_size: self.page_size,
            include_groups: self.include_groups.clone(),
        };
        let options = &options;

        let outcomes: Vec<(String, Result<Vec<String>>)> =
            stream::iter(artist_ids.iter().cloned())
                .map(|artist_id| async move {
                    let releases = recent_releases(catalog, &artist_id, options).await;
                    (artist_id, releases)
                })
                .buffer_unordered(self.concurrency.max(1))
                .collect()
                .await;

        let mut release_uris = Vec::new();
        let mut failed = 0usize;
        for (artist_id, outcome) in outcomes {
            match outcome {
                Ok(uris) => release_uris.extend(uris),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(artist_id = %artist_id, error = %e, "skipping artist");
                }
            }
        }

        if !artist_ids.is_empty() && failed == artist_ids.len() {
            return Err(Error::AllArtistsFailed { artists: failed });
        }

        let (mut track_uris, album_uris) = split_release_uris(release_uris);
        tracing::info!(
            artists = artist_ids.len(),
            failed_artists = failed,
            direct_tracks = track_uris.len(),
            albums = album_uris.len(),
            "scanned followed artists"
        );

        let resolved = resolve_albums_to_tracks(catalog, album_uris).await?;
        track_uris.extend(resolved);

        Ok(track_uris)
    }
}
