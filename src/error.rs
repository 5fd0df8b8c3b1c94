//! Error taxonomy for the Release Radar pipeline.
//!
//! Every component returns [`Result`]. Errors bubble up to the per-user task
//! boundary in [`crate::radar::ChronJob`], where they are logged with the
//! user's email and recorded as a failure entry of the job summary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The refresh token could not be exchanged for an access token.
    #[error("refresh token exchange failed with status {status}: {body}")]
    CredentialExchange { status: u16, body: String },

    /// Any non-success, non-429 response from the catalog API.
    #[error("upstream request to {url} failed with status {status}: {body}")]
    UpstreamRequest {
        status: u16,
        url: String,
        body: String,
    },

    /// A single call kept receiving 429 beyond the configured retry ceiling.
    #[error("still rate limited after {attempts} attempts on {url}")]
    RateLimitExhausted { url: String, attempts: u32 },

    #[error("cover image upload for playlist {playlist_id} failed with status {status}: {body}")]
    ImageUpload {
        playlist_id: String,
        status: u16,
        body: String,
    },

    #[error("album batch {batch} could not be resolved: {source}")]
    BatchResolution {
        batch: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("{kind} batch of {size} exceeds the upstream limit of {limit}")]
    BatchTooLarge {
        kind: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("release lookup failed for all {artists} followed artists")]
    AllArtistsFailed { artists: usize },

    #[error("user run timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("user store: {0}")]
    UserStore(String),

    #[error("scheduler: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status carried by the error, if it came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::CredentialExchange { status, .. }
            | Error::UpstreamRequest { status, .. }
            | Error::ImageUpload { status, .. } => Some(*status),
            Error::BatchResolution { source, .. } => source.status(),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
