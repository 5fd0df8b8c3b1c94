use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: ArtistsContainer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistsContainer {
    pub items: Vec<Artist>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
}

/// Where the next page of a cursor-paginated listing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Opaque `after` value to send back as a query parameter.
    After(String),
    /// Fully qualified URL of the next page.
    Next(String),
}

#[derive(Debug, Clone, Default)]
pub struct FollowedArtistsPage {
    pub artist_ids: Vec<String>,
    pub next: Option<PageCursor>,
}

impl From<FollowedArtistsResponse> for FollowedArtistsPage {
    fn from(res: FollowedArtistsResponse) -> Self {
        let container = res.artists;
        // `cursors.after` wins; `next` is only consulted when no cursor is given
        let next = match container.cursors.and_then(|c| c.after) {
            Some(after) => Some(PageCursor::After(after)),
            None => container.next.map(PageCursor::Next),
        };

        Self {
            artist_ids: container.items.into_iter().map(|a| a.id).collect(),
            next,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlbumResponse {
    pub items: Vec<Album>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// A release as listed in an artist's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub release_date_precision: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub artists: Vec<AlbumArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumArtist {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSeveralAlbumsResponse {
    /// Unknown ids come back as `null` entries.
    pub albums: Vec<Option<GetAlbumResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAlbumResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub release_date: String,
    pub tracks: Tracks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tracks {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksFromPlaylistRequest {
    pub tracks: Vec<TrackReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackReference {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// `null` for tracks that are no longer available.
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub uri: String,
}

/// One page of a playlist listing. `item_count` includes unavailable entries.
#[derive(Debug, Clone, Default)]
pub struct PlaylistTracksPage {
    pub uris: Vec<String>,
    pub item_count: usize,
}

impl From<PlaylistTracksResponse> for PlaylistTracksPage {
    fn from(res: PlaylistTracksResponse) -> Self {
        let item_count = res.items.len();
        Self {
            uris: res
                .items
                .into_iter()
                .filter_map(|item| item.track.map(|t| t.uri))
                .collect(),
            item_count,
        }
    }
}

/// Result of a cover image upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpload {
    Accepted,
    Rejected { status: u16, body: String },
}

/// A registered user as persisted in the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub refresh_token: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub release_radar_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Tabled)]
pub struct UserTableRow {
    pub email: String,
    pub user_id: String,
    pub active: bool,
    pub release_radar_id: String,
    pub updated_at: String,
}

impl From<&UserRecord> for UserTableRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            email: user.email.clone(),
            user_id: user.user_id.clone(),
            active: user.active,
            release_radar_id: user.release_radar_id.clone().unwrap_or_default(),
            updated_at: user.updated_at.clone().unwrap_or_default(),
        }
    }
}

/// What happened to a user's playlist during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created { playlist_id: String, added: usize },
    Replaced {
        playlist_id: String,
        removed: usize,
        added: usize,
    },
}

impl ReconcileOutcome {
    pub fn playlist_id(&self) -> &str {
        match self {
            ReconcileOutcome::Created { playlist_id, .. }
            | ReconcileOutcome::Replaced { playlist_id, .. } => playlist_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFailure {
    pub email: String,
    pub error: String,
}

/// Outcome of one scheduled job run across all opted-in users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<UserFailure>,
}
