#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use release_radar::{
    Error, Result,
    management::UserStore,
    spotify::{CatalogClient, CatalogFactory, auth::CredentialStore},
    types::{
        Album, AlbumArtist, AlbumResponse, FollowedArtistsPage, GetAlbumResponse, ImageUpload,
        PageCursor, PlaylistTracksPage, Track, Tracks, UserRecord,
    },
    utils::{ALBUM_BATCH_LIMIT, PLAYLIST_BATCH_LIMIT, ReleaseKind},
};

pub fn release(id: &str, release_date: &str, album_type: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Release {}", id),
        uri: format!("spotify:album:{}", id),
        release_date: release_date.to_string(),
        release_date_precision: "day".to_string(),
        album_type: album_type.to_string(),
        artists: vec![AlbumArtist {
            id: format!("{}_artist", id),
            name: "Artist".to_string(),
        }],
    }
}

/// Album lookup result with `tracks` tracks named `spotify:track:<id>_<n>`.
pub fn album_with_tracks(id: &str, album_type: &str, tracks: usize) -> GetAlbumResponse {
    GetAlbumResponse {
        id: id.to_string(),
        name: format!("Release {}", id),
        album_type: album_type.to_string(),
        release_date: "2024-05-01".to_string(),
        tracks: Tracks {
            items: (1..=tracks)
                .map(|n| Track {
                    id: Some(format!("{}_{}", id, n)),
                    name: format!("Track {}", n),
                    uri: format!("spotify:track:{}_{}", id, n),
                })
                .collect(),
        },
    }
}

pub fn user(n: usize) -> UserRecord {
    UserRecord {
        user_id: format!("user{}", n),
        email: format!("user{}@example.com", n),
        refresh_token: format!("refresh-{}", n),
        active: true,
        release_radar_id: None,
        updated_at: None,
    }
}

fn upstream_error(status: u16, url: &str) -> Error {
    Error::UpstreamRequest {
        status,
        url: url.to_string(),
        body: String::new(),
    }
}

#[derive(Debug, Default)]
pub struct CatalogState {
    /// Followed artist ids, one entry per page.
    pub followed_pages: Vec<Vec<String>>,
    pub followed_calls: usize,
    /// Releases per artist, newest first, all groups mixed.
    pub releases: HashMap<String, Vec<Album>>,
    pub failing_artists: HashSet<String>,
    pub release_calls: Vec<(String, ReleaseKind, u32)>,
    pub albums: HashMap<String, GetAlbumResponse>,
    pub album_calls: Vec<Vec<String>>,
    pub fail_album_lookup: bool,
    pub playlists: HashMap<String, Vec<String>>,
    pub created: Vec<(String, String)>,
    /// Scripted image responses; accepted once exhausted.
    pub image_responses: VecDeque<ImageUpload>,
    pub image_calls: usize,
    pub add_calls: Vec<(String, Vec<String>)>,
    pub remove_calls: Vec<(String, Vec<String>)>,
    pub opened_tokens: Vec<String>,
    next_playlist: usize,
}

/// In-memory catalog. Clones share their state.
#[derive(Debug, Clone, Default)]
pub struct FakeCatalog {
    pub state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut CatalogState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn follow_pages(self, pages: Vec<Vec<&str>>) -> Self {
        self.with(|s| {
            s.followed_pages = pages
                .into_iter()
                .map(|p| p.into_iter().map(String::from).collect())
                .collect()
        });
        self
    }

    pub fn with_releases(self, artist_id: &str, releases: Vec<Album>) -> Self {
        self.with(|s| s.releases.insert(artist_id.to_string(), releases));
        self
    }

    pub fn failing_artist(self, artist_id: &str) -> Self {
        self.with(|s| s.failing_artists.insert(artist_id.to_string()));
        self
    }

    pub fn album(self, album: GetAlbumResponse) -> Self {
        self.with(|s| s.albums.insert(album.id.clone(), album));
        self
    }

    pub fn playlist(self, playlist_id: &str, uris: Vec<String>) -> Self {
        self.with(|s| s.playlists.insert(playlist_id.to_string(), uris));
        self
    }

    pub fn playlist_content(&self, playlist_id: &str) -> Vec<String> {
        self.with(|s| s.playlists.get(playlist_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn followed_artists(&self, cursor: Option<&PageCursor>) -> Result<FollowedArtistsPage> {
        self.with(|s| {
            s.followed_calls += 1;
            let index = match cursor {
                None => 0,
                Some(PageCursor::After(after)) | Some(PageCursor::Next(after)) => after
                    .trim_start_matches("cursor-")
                    .parse::<usize>()
                    .map_err(|_| upstream_error(400, "/me/following"))?,
            };

            let artist_ids = s.followed_pages.get(index).cloned().unwrap_or_default();
            let next = (index + 1 < s.followed_pages.len())
                .then(|| PageCursor::After(format!("cursor-{}", index + 1)));

            Ok(FollowedArtistsPage { artist_ids, next })
        })
    }

    async fn artist_releases(
        &self,
        artist_id: &str,
        group: ReleaseKind,
        offset: u32,
        limit: u32,
    ) -> Result<AlbumResponse> {
        self.with(|s| {
            s.release_calls.push((artist_id.to_string(), group, offset));
            if s.failing_artists.contains(artist_id) {
                return Err(upstream_error(500, &format!("/artists/{}/albums", artist_id)));
            }

            let of_group: Vec<Album> = s
                .releases
                .get(artist_id)
                .map(|all| {
                    all.iter()
                        .filter(|r| r.album_type == group.as_str())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            let start = (offset as usize).min(of_group.len());
            let end = (start + limit as usize).min(of_group.len());
            let items = of_group[start..end].to_vec();
            let next = (end < of_group.len()).then(|| "next".to_string());

            Ok(AlbumResponse {
                items,
                next,
                total: Some(of_group.len() as u64),
            })
        })
    }

    async fn albums(&self, ids: &[String]) -> Result<Vec<GetAlbumResponse>> {
        self.with(|s| {
            if ids.len() > ALBUM_BATCH_LIMIT {
                return Err(Error::BatchTooLarge {
                    kind: "album lookup",
                    size: ids.len(),
                    limit: ALBUM_BATCH_LIMIT,
                });
            }
            s.album_calls.push(ids.to_vec());
            if s.fail_album_lookup {
                return Err(upstream_error(502, "/albums"));
            }
            Ok(ids.iter().filter_map(|id| s.albums.get(id).cloned()).collect())
        })
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        _description: &str,
    ) -> Result<String> {
        self.with(|s| {
            s.next_playlist += 1;
            let id = format!("playlist{}", s.next_playlist);
            s.created.push((user_id.to_string(), name.to_string()));
            s.playlists.insert(id.clone(), Vec::new());
            Ok(id)
        })
    }

    async fn upload_playlist_image(
        &self,
        _playlist_id: &str,
        _jpeg_base64: &str,
    ) -> Result<ImageUpload> {
        self.with(|s| {
            s.image_calls += 1;
            Ok(s.image_responses.pop_front().unwrap_or(ImageUpload::Accepted))
        })
    }

    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.with(|s| {
            assert!(uris.len() <= PLAYLIST_BATCH_LIMIT, "insert batch too large");
            s.add_calls.push((playlist_id.to_string(), uris.to_vec()));
            s.playlists
                .entry(playlist_id.to_string())
                .or_default()
                .extend(uris.iter().cloned());
            Ok(())
        })
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PlaylistTracksPage> {
        self.with(|s| {
            let content = s
                .playlists
                .get(playlist_id)
                .ok_or_else(|| upstream_error(404, &format!("/playlists/{}/tracks", playlist_id)))?;
            let start = (offset as usize).min(content.len());
            let end = (start + limit as usize).min(content.len());
            let uris = content[start..end].to_vec();
            Ok(PlaylistTracksPage {
                item_count: uris.len(),
                uris,
            })
        })
    }

    async fn remove_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.with(|s| {
            assert!(uris.len() <= PLAYLIST_BATCH_LIMIT, "removal batch too large");
            s.remove_calls.push((playlist_id.to_string(), uris.to_vec()));
            if let Some(content) = s.playlists.get_mut(playlist_id) {
                content.retain(|uri| !uris.contains(uri));
            }
            Ok(())
        })
    }
}

impl CatalogFactory for FakeCatalog {
    type Client = FakeCatalog;

    fn open(&self, access_token: String) -> FakeCatalog {
        self.with(|s| s.opened_tokens.push(access_token));
        self.clone()
    }
}

/// Hands out `access-<refresh token>` unless the refresh token is marked failing.
#[derive(Debug, Clone, Default)]
pub struct FakeCredentials {
    pub failing: HashSet<String>,
}

impl FakeCredentials {
    pub fn failing(refresh_tokens: &[&str]) -> Self {
        Self {
            failing: refresh_tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CredentialStore for FakeCredentials {
    async fn access_token(&self, refresh_token: &str) -> Result<String> {
        if self.failing.contains(refresh_token) {
            return Err(Error::CredentialExchange {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        Ok(format!("access-{}", refresh_token))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    pub users: Arc<Mutex<Vec<UserRecord>>>,
    pub fail_listing: bool,
    pub fail_save: bool,
    /// Stored right after the next listing, as an edit racing the job would be.
    pub edit_after_listing: Arc<Mutex<Option<UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            ..Default::default()
        }
    }

    pub fn snapshot(&self, email: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        if self.fail_listing {
            return Err(Error::UserStore("table unavailable".to_string()));
        }
        let listed = self.users.lock().unwrap().clone();
        if let Some(edit) = self.edit_after_listing.lock().unwrap().take() {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.email == edit.email) {
                Some(existing) => *existing = edit,
                None => users.push(edit),
            }
        }
        Ok(listed)
    }

    async fn get(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.snapshot(email))
    }

    async fn save(&self, user: &UserRecord) -> Result<()> {
        if self.fail_save {
            return Err(Error::UserStore("write rejected".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.email == user.email) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }
        Ok(())
    }

    async fn record_run(
        &self,
        email: &str,
        playlist_id: Option<&str>,
        updated_at: &str,
    ) -> Result<()> {
        if self.fail_save {
            return Err(Error::UserStore("write rejected".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| Error::UserStore(format!("user {} no longer exists", email)))?;
        if let Some(id) = playlist_id {
            user.release_radar_id = Some(id.to_string());
        }
        user.updated_at = Some(updated_at.to_string());
        Ok(())
    }
}
