mod common;

use std::{collections::BTreeSet, time::Duration};

use chrono::NaiveDate;
use common::{FakeCatalog, album_with_tracks, release};
use release_radar::{
    Error,
    radar::{PlaylistReconciler, ReleaseRadarAggregator, playlist::load_cover_image},
    types::{ImageUpload, ReconcileOutcome},
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

fn reconciler() -> PlaylistReconciler {
    PlaylistReconciler {
        settle_delay: Duration::ZERO,
        ..PlaylistReconciler::new("Y292ZXI=".to_string())
    }
}

fn uris(prefix: &str, ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| format!("{}{}", prefix, id)).collect()
}

#[tokio::test]
async fn test_end_to_end_new_release_reaches_new_playlist() {
    let catalog = FakeCatalog::new()
        .follow_pages(vec![vec!["A1", "A2"]])
        .with_releases("A1", vec![release("rel1", "2024-05-14", "album")])
        .with_releases("A2", vec![release("rel2", "2024-05-07", "album")])
        .album(album_with_tracks("rel1", "album", 2))
        .album(album_with_tracks("rel2", "album", 4));

    let tracks = ReleaseRadarAggregator::default()
        .collect(&catalog, today())
        .await
        .unwrap();

    assert_eq!(tracks, uris("spotify:track:", &["rel1_1", "rel1_2"]));

    let outcome = reconciler()
        .reconcile(&catalog, "user1", None, &tracks)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Created {
            playlist_id: "playlist1".to_string(),
            added: 2
        }
    );
    catalog.with(|s| {
        assert_eq!(
            s.created,
            vec![("user1".to_string(), "Weekly Release Radar".to_string())]
        );
        assert_eq!(s.image_calls, 1);
        assert_eq!(s.add_calls.len(), 1);
        assert_eq!(s.add_calls[0].1.len(), 2);
    });
}

#[tokio::test]
async fn test_aggregator_deduplicates_across_artists() {
    // both artists list the same collaboration
    let catalog = FakeCatalog::new()
        .with_releases("A1", vec![release("collab", "2024-05-16", "album")])
        .with_releases(
            "A2",
            vec![
                release("collab", "2024-05-16", "album"),
                release("solo", "2024-05-15", "single"),
            ],
        )
        .album(album_with_tracks("collab", "album", 3))
        .album(album_with_tracks("solo", "single", 3));

    let artists: BTreeSet<String> = ["A1", "A2"].iter().map(|s| s.to_string()).collect();
    let tracks = ReleaseRadarAggregator::default()
        .run(&catalog, &artists, today())
        .await
        .unwrap();

    assert_eq!(
        tracks,
        uris(
            "spotify:track:",
            &["collab_1", "collab_2", "collab_3", "solo_1"]
        )
    );
    assert_eq!(catalog.with(|s| s.album_calls.len()), 1);
}

#[tokio::test]
async fn test_aggregator_skips_failing_artist() {
    let catalog = FakeCatalog::new()
        .with_releases("A1", vec![release("rel1", "2024-05-14", "album")])
        .failing_artist("A2")
        .album(album_with_tracks("rel1", "album", 1));

    let artists: BTreeSet<String> = ["A1", "A2"].iter().map(|s| s.to_string()).collect();
    let tracks = ReleaseRadarAggregator::default()
        .run(&catalog, &artists, today())
        .await
        .unwrap();

    assert_eq!(tracks, uris("spotify:track:", &["rel1_1"]));
}

#[tokio::test]
async fn test_aggregator_fails_when_every_artist_fails() {
    let catalog = FakeCatalog::new().failing_artist("A1").failing_artist("A2");

    let artists: BTreeSet<String> = ["A1", "A2"].iter().map(|s| s.to_string()).collect();
    let err = ReleaseRadarAggregator::default()
        .run(&catalog, &artists, today())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AllArtistsFailed { artists: 2 }));
}

#[tokio::test]
async fn test_aggregator_without_artists_is_empty() {
    let catalog = FakeCatalog::new();
    let tracks = ReleaseRadarAggregator::default()
        .run(&catalog, &BTreeSet::new(), today())
        .await
        .unwrap();

    assert!(tracks.is_empty());
}

#[tokio::test]
async fn test_aggregator_fails_when_album_resolution_fails() {
    let catalog = FakeCatalog::new()
        .with_releases("A1", vec![release("rel1", "2024-05-14", "album")]);
    catalog.with(|s| s.fail_album_lookup = true);

    let artists: BTreeSet<String> = ["A1".to_string()].into_iter().collect();
    let err = ReleaseRadarAggregator::default()
        .run(&catalog, &artists, today())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BatchResolution { .. }));
}

#[tokio::test]
async fn test_aggregator_bounded_concurrency_scans_every_artist() {
    let mut catalog = FakeCatalog::new();
    let mut artists = BTreeSet::new();
    for n in 0..25 {
        let artist = format!("artist{}", n);
        let id = format!("rel{}", n);
        catalog = catalog
            .with_releases(&artist, vec![release(&id, "2024-05-16", "album")])
            .album(album_with_tracks(&id, "album", 1));
        artists.insert(artist);
    }

    let aggregator = ReleaseRadarAggregator {
        concurrency: 3,
        ..ReleaseRadarAggregator::default()
    };
    let tracks = aggregator.run(&catalog, &artists, today()).await.unwrap();

    assert_eq!(tracks.len(), 25);
    assert_eq!(catalog.with(|s| s.album_calls.len()), 2);
}

#[tokio::test]
async fn test_reconcile_retries_rejected_cover_once() {
    let catalog = FakeCatalog::new();
    catalog.with(|s| {
        s.image_responses.push_back(ImageUpload::Rejected {
            status: 500,
            body: "busy".to_string(),
        })
    });

    let tracks = uris("spotify:track:", &["t1"]);
    let outcome = reconciler()
        .reconcile(&catalog, "user1", None, &tracks)
        .await
        .unwrap();

    assert_eq!(outcome.playlist_id(), "playlist1");
    assert_eq!(catalog.with(|s| s.image_calls), 2);
    assert_eq!(catalog.playlist_content("playlist1"), vec!["spotify:track:t1".to_string()]);
}

#[tokio::test]
async fn test_reconcile_fails_after_second_cover_rejection() {
    let catalog = FakeCatalog::new();
    catalog.with(|s| {
        for _ in 0..2 {
            s.image_responses.push_back(ImageUpload::Rejected {
                status: 400,
                body: "bad image".to_string(),
            });
        }
    });

    let err = reconciler()
        .reconcile(&catalog, "user1", None, &uris("spotify:track:", &["t1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ImageUpload { status: 400, .. }));
    catalog.with(|s| {
        assert_eq!(s.image_calls, 2);
        assert!(s.add_calls.is_empty());
    });
}

#[tokio::test]
async fn test_reconcile_replaces_existing_content_idempotently() {
    let old: Vec<String> = (0..150).map(|n| format!("spotify:track:old{}", n)).collect();
    let catalog = FakeCatalog::new().playlist("radar", old);
    let tracks = uris("spotify:track:", &["n1", "n2", "n3"]);
    let expected: Vec<String> = tracks.iter().cloned().collect();

    let first = reconciler()
        .reconcile(&catalog, "user1", Some("radar"), &tracks)
        .await
        .unwrap();
    assert_eq!(
        first,
        ReconcileOutcome::Replaced {
            playlist_id: "radar".to_string(),
            removed: 150,
            added: 3
        }
    );
    assert_eq!(catalog.playlist_content("radar"), expected);

    let second = reconciler()
        .reconcile(&catalog, "user1", Some("radar"), &tracks)
        .await
        .unwrap();
    assert_eq!(catalog.playlist_content("radar"), expected);
    assert!(matches!(second, ReconcileOutcome::Replaced { removed: 3, added: 3, .. }));

    catalog.with(|s| {
        let removal_sizes: Vec<usize> = s.remove_calls.iter().map(|c| c.1.len()).collect();
        assert_eq!(removal_sizes, vec![100, 50, 3]);
        assert!(s.created.is_empty());
        assert_eq!(s.image_calls, 0);
    });
}

#[tokio::test]
async fn test_reconcile_with_empty_set_still_clears_playlist() {
    let catalog = FakeCatalog::new().playlist("radar", vec!["spotify:track:old".to_string()]);

    let outcome = reconciler()
        .reconcile(&catalog, "user1", Some("radar"), &BTreeSet::new())
        .await
        .unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Replaced { removed: 1, added: 0, .. }));
    assert!(catalog.playlist_content("radar").is_empty());
    catalog.with(|s| {
        assert_eq!(s.remove_calls.len(), 1);
        assert!(s.add_calls.is_empty());
    });
}

#[tokio::test]
async fn test_reconcile_inserts_in_batches_of_100() {
    let catalog = FakeCatalog::new();
    let tracks: BTreeSet<String> = (0..230).map(|n| format!("spotify:track:t{:03}", n)).collect();

    let outcome = reconciler()
        .reconcile(&catalog, "user1", None, &tracks)
        .await
        .unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { added: 230, .. }));
    let sizes: Vec<usize> = catalog.with(|s| s.add_calls.iter().map(|c| c.1.len()).collect());
    assert_eq!(sizes, vec![100, 100, 30]);
}

#[tokio::test]
async fn test_bundled_cover_is_base64_jpeg() {
    let cover = load_cover_image(None).await.unwrap();
    // base64 of the JPEG SOI marker FF D8 FF
    assert!(cover.starts_with("/9j/"));
}

#[tokio::test]
async fn test_cover_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.jpg");
    std::fs::write(&path, b"cover").unwrap();

    assert_eq!(load_cover_image(Some(&path)).await.unwrap(), "Y292ZXI=");
    assert!(load_cover_image(Some(&dir.path().join("missing.jpg"))).await.is_err());
}
