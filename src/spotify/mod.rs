//! # Spotify Integration Module
//!
//! Everything the Release Radar pipeline needs from the Spotify Web API, behind
//! the [`CatalogClient`] trait so the pipeline stages can run against any
//! implementation.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline (radar::aggregate, radar::playlist, radar::job)
//!          ↓
//! Resolution stages
//!     ├── artists   followed artists, cursor pagination
//!     └── releases  recency scan per artist, album -> track resolution
//!          ↓
//! CatalogClient (trait) ── SpotifyClient (reqwest)
//!          ↓
//! RateLimitedFetcher (429 / Retry-After handling)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /me/following` - followed artists, cursor paginated
//! - `GET /artists/{id}/albums` - an artist's releases, newest first per group
//! - `GET /albums` - up to 20 albums with their track listings
//! - `POST /users/{user_id}/playlists` - create a playlist
//! - `PUT /playlists/{id}/images` - upload a base64 JPEG cover
//! - `GET|POST|DELETE /playlists/{id}/tracks` - list, add and remove up to 100 tracks
//! - `POST /api/token` - refresh token exchange (see [`auth`])
//!
//! ## Connection Scope
//!
//! A [`CatalogFactory`] opens one client per user run. The HTTP implementation
//! builds a fresh connection pool for that client, so the pool lives exactly
//! as long as the user's run and is dropped on every exit path.

pub mod artists;
pub mod auth;
mod client;
mod fetch;
pub mod releases;

pub use client::{SpotifyClient, SpotifyClientFactory};
pub use fetch::{ApiRequest, Body, RateLimitPolicy, RateLimitedFetcher};

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{
        AlbumResponse, FollowedArtistsPage, GetAlbumResponse, ImageUpload, PageCursor,
        PlaylistTracksPage,
    },
    utils::ReleaseKind,
};

/// Catalog and playlist operations used by the pipeline.
///
/// Batch limits are part of the contract: `albums` takes at most
/// [`ALBUM_BATCH_LIMIT`](crate::utils::ALBUM_BATCH_LIMIT) ids, the playlist
/// add/remove calls at most
/// [`PLAYLIST_BATCH_LIMIT`](crate::utils::PLAYLIST_BATCH_LIMIT) uris.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// One page of the current user's followed artists.
    async fn followed_artists(&self, cursor: Option<&PageCursor>) -> Result<FollowedArtistsPage>;

    /// One page of an artist's releases of a single group, newest first.
    async fn artist_releases(
        &self,
        artist_id: &str,
        group: ReleaseKind,
        offset: u32,
        limit: u32,
    ) -> Result<AlbumResponse>;

    async fn albums(&self, ids: &[String]) -> Result<Vec<GetAlbumResponse>>;

    /// Creates a public playlist and returns its id.
    async fn create_playlist(&self, user_id: &str, name: &str, description: &str)
    -> Result<String>;

    async fn upload_playlist_image(&self, playlist_id: &str, jpeg_base64: &str)
    -> Result<ImageUpload>;

    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PlaylistTracksPage>;

    async fn remove_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}

/// Opens a [`CatalogClient`] bound to one user's access token.
pub trait CatalogFactory: Send + Sync {
    type Client: CatalogClient;

    fn open(&self, access_token: String) -> Self::Client;
}
