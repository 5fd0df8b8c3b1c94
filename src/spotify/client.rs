use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};

use crate::{
    error::{Error, Result},
    spotify::{
        CatalogClient, CatalogFactory,
        fetch::{ApiRequest, RateLimitPolicy, RateLimitedFetcher},
    },
    types::{
        AddTrackToPlaylistRequest, AlbumResponse, CreatePlaylistRequest, CreatePlaylistResponse,
        FollowedArtistsPage, FollowedArtistsResponse, GetAlbumResponse, GetSeveralAlbumsResponse,
        ImageUpload, PageCursor, PlaylistTracksPage, PlaylistTracksResponse,
        RemoveTracksFromPlaylistRequest, TrackReference,
    },
    utils::{ALBUM_BATCH_LIMIT, PLAYLIST_BATCH_LIMIT, ReleaseKind},
};

const FOLLOWED_ARTISTS_PAGE_SIZE: u32 = 50;

/// [`CatalogClient`] backed by the Spotify Web API.
///
/// Every call goes through a [`RateLimitedFetcher`], so 429 responses are
/// retried transparently and any other non-success status surfaces as
/// [`Error::UpstreamRequest`]. Batch limits of the API are checked before a
/// request is sent.
///
/// # Example
///
/// ```ignore
/// let client = SpotifyClient::new(
///     "https://api.spotify.com/v1",
///     access_token,
///     RateLimitPolicy::default(),
/// );
/// let page = client
///     .artist_releases("4NHQUGzhtTLFvgF5SZesLK", ReleaseKind::Single, 0, 5)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    fetcher: RateLimitedFetcher,
    api_url: String,
}

impl SpotifyClient {
    /// Creates a client with a fresh connection pool.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base url of the Web API, a trailing slash is ignored
    /// * `access_token` - Bearer token of the user the client acts for
    /// * `policy` - Retry ceiling and maximum backoff for rate-limited calls
    pub fn new(api_url: &str, access_token: String, policy: RateLimitPolicy) -> Self {
        Self::with_client(Client::new(), api_url, access_token, policy)
    }

    /// Same as [`SpotifyClient::new`] but reuses an existing `reqwest` client.
    pub fn with_client(
        client: Client,
        api_url: &str,
        access_token: String,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            fetcher: RateLimitedFetcher::new(client, access_token, policy),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

fn ensure_batch(kind: &'static str, size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(Error::BatchTooLarge { kind, size, limit });
    }
    Ok(())
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    /// Fetches one page of the artists the user follows.
    ///
    /// # Arguments
    ///
    /// * `cursor` - `None` for the first page. `After` resumes from a cursor
    ///   value; `Next` requests the url the previous page handed out verbatim.
    ///
    /// # API Endpoint
    ///
    /// `GET /me/following?type=artist&limit=50[&after=...]`
    async fn followed_artists(&self, cursor: Option<&PageCursor>) -> Result<FollowedArtistsPage> {
        let request = match cursor {
            Some(PageCursor::Next(next_url)) => ApiRequest::get(next_url.clone()),
            Some(PageCursor::After(after)) => ApiRequest::get(self.url("/me/following"))
                .query("type", "artist")
                .query("limit", FOLLOWED_ARTISTS_PAGE_SIZE)
                .query("after", after),
            None => ApiRequest::get(self.url("/me/following"))
                .query("type", "artist")
                .query("limit", FOLLOWED_ARTISTS_PAGE_SIZE),
        };

        let res = self
            .fetcher
            .fetch_json::<FollowedArtistsResponse>(&request)
            .await?;
        Ok(res.into())
    }

    /// Fetches one page of an artist's releases of a single group.
    ///
    /// # Arguments
    ///
    /// * `artist_id` - Spotify id of the artist
    /// * `group` - Release group sent as `include_groups`
    /// * `offset` - Index of the first release to return
    /// * `limit` - Page size
    ///
    /// # Returns
    ///
    /// The page as returned by the API, newest release first. `next` is set
    /// while more releases follow.
    ///
    /// # API Endpoint
    ///
    /// `GET /artists/{id}/albums`
    async fn artist_releases(
        &self,
        artist_id: &str,
        group: ReleaseKind,
        offset: u32,
        limit: u32,
    ) -> Result<AlbumResponse> {
        let url = self.url(&format!("/artists/{}/albums", artist_id));
        let request = ApiRequest::get(url)
            .query("include_groups", group.as_str())
            .query("limit", limit)
            .query("offset", offset);

        self.fetcher.fetch_json::<AlbumResponse>(&request).await
    }

    /// Looks up full albums, tracks included.
    ///
    /// # Arguments
    ///
    /// * `ids` - At most [`ALBUM_BATCH_LIMIT`] album ids
    ///
    /// # Returns
    ///
    /// The albums the API knows about. Unknown ids come back as `null` and are
    /// dropped. An empty `ids` returns an empty list without a request.
    ///
    /// # Errors
    ///
    /// [`Error::BatchTooLarge`] when `ids` exceeds the limit, before anything
    /// is sent.
    async fn albums(&self, ids: &[String]) -> Result<Vec<GetAlbumResponse>> {
        ensure_batch("album lookup", ids.len(), ALBUM_BATCH_LIMIT)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = ApiRequest::get(self.url("/albums")).query("ids", ids.join(","));
        let res = self
            .fetcher
            .fetch_json::<GetSeveralAlbumsResponse>(&request)
            .await?;

        Ok(res.albums.into_iter().flatten().collect())
    }

    /// Creates a public, non-collaborative playlist and returns its id.
    ///
    /// # API Endpoint
    ///
    /// `POST /users/{user_id}/playlists`
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: true,
            collaborative: false,
        };
        let url = self.url(&format!("/users/{}/playlists", user_id));
        let request = ApiRequest::new(Method::POST, url).json(&body)?;

        let res = self
            .fetcher
            .fetch_json::<CreatePlaylistResponse>(&request)
            .await?;
        Ok(res.id)
    }

    /// Uploads a base64 JPEG as the playlist cover.
    ///
    /// Line breaks are stripped from the payload first. The API answers
    /// `202 Accepted` on success; any other status is reported as
    /// [`ImageUpload::Rejected`] rather than an error so the caller can
    /// decide whether to retry.
    async fn upload_playlist_image(
        &self,
        playlist_id: &str,
        jpeg_base64: &str,
    ) -> Result<ImageUpload> {
        let url = self.url(&format!("/playlists/{}/images", playlist_id));
        let request = ApiRequest::new(Method::PUT, url).jpeg(jpeg_base64.replace('\n', ""));

        let response = self.fetcher.send(&request).await?;
        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(ImageUpload::Accepted);
        }

        Ok(ImageUpload::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    /// Appends at most [`PLAYLIST_BATCH_LIMIT`] track uris to a playlist.
    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        ensure_batch("playlist insert", uris.len(), PLAYLIST_BATCH_LIMIT)?;
        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));
        let request = ApiRequest::new(Method::POST, url).json(&body)?;

        self.fetcher.fetch(&request).await?;
        Ok(())
    }

    /// Fetches one page of track uris currently in the playlist.
    ///
    /// Only `items(track(uri)),next` is requested to keep responses small.
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PlaylistTracksPage> {
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));
        let request = ApiRequest::get(url)
            .query("fields", "items(track(uri)),next")
            .query("limit", limit)
            .query("offset", offset);

        let res = self
            .fetcher
            .fetch_json::<PlaylistTracksResponse>(&request)
            .await?;
        Ok(res.into())
    }

    /// Removes every occurrence of at most [`PLAYLIST_BATCH_LIMIT`] track uris.
    ///
    /// # API Endpoint
    ///
    /// `DELETE /playlists/{id}/tracks` with a `{"tracks": [{"uri": ...}]}` body
    async fn remove_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        ensure_batch("playlist removal", uris.len(), PLAYLIST_BATCH_LIMIT)?;
        let body = RemoveTracksFromPlaylistRequest {
            tracks: uris
                .iter()
                .map(|uri| TrackReference { uri: uri.clone() })
                .collect(),
        };
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));
        let request = ApiRequest::new(Method::DELETE, url).json(&body)?;

        self.fetcher.fetch(&request).await?;
        Ok(())
    }
}

/// Opens a [`SpotifyClient`] with its own connection pool per user run.
#[derive(Debug, Clone)]
pub struct SpotifyClientFactory {
    api_url: String,
    policy: RateLimitPolicy,
}

impl SpotifyClientFactory {
    pub fn new(api_url: impl Into<String>, policy: RateLimitPolicy) -> Self {
        Self {
            api_url: api_url.into(),
            policy,
        }
    }
}

impl CatalogFactory for SpotifyClientFactory {
    type Client = SpotifyClient;

    fn open(&self, access_token: String) -> SpotifyClient {
        SpotifyClient::new(&self.api_url, access_token, self.policy)
    }
}
