//! Configuration management for the Release Radar job.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{Error, Result},
    spotify::RateLimitPolicy,
    utils::{self, ReleaseKinds},
};

pub const APP_DIR: &str = "release-radar";

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_PLAYLIST_NAME: &str = "Weekly Release Radar";
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str =
    "All your followed artists newest songs - refreshed every week";
/// Every Friday at noon (sec min hour day-of-month month day-of-week).
pub const DEFAULT_SCHEDULE: &str = "0 0 12 * * Fri";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";

/// Platform local data directory of the application, e.g. `~/.local/share/release-radar`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from `<data dir>/.env`.
///
/// A missing file is fine since every value can also come from the process
/// environment. A file that exists but cannot be parsed is an error.
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))
}

/// Typed runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub users_file: PathBuf,
    pub window_days: u32,
    pub include_groups: ReleaseKinds,
    pub page_size: u32,
    pub artist_concurrency: usize,
    pub user_concurrency: usize,
    /// `None` disables the per-user timeout.
    pub user_timeout: Option<Duration>,
    /// Pause between playlist creation steps while upstream catches up.
    pub settle_delay: Duration,
    pub rate_limit: RateLimitPolicy,
    pub playlist_name: String,
    pub playlist_description: String,
    pub cover_image: Option<PathBuf>,
    pub schedule: String,
    pub server_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
        };

        let include_groups = match get("RELEASE_RADAR_INCLUDE_GROUPS") {
            Some(raw) => utils::parse_release_kinds(&raw)
                .map_err(|e| Error::Config(format!("RELEASE_RADAR_INCLUDE_GROUPS: {}", e)))?,
            None => ReleaseKinds::default(),
        };

        let page_size: u32 = parse_or(&get, "RELEASE_RADAR_PAGE_SIZE", 5)?;
        if !(1..=50).contains(&page_size) {
            return Err(Error::Config(format!(
                "RELEASE_RADAR_PAGE_SIZE must be between 1 and 50, got {}",
                page_size
            )));
        }

        let artist_concurrency: usize = parse_or(&get, "RELEASE_RADAR_ARTIST_CONCURRENCY", 8)?;
        let user_concurrency: usize = parse_or(&get, "RELEASE_RADAR_USER_CONCURRENCY", 4)?;
        if artist_concurrency == 0 || user_concurrency == 0 {
            return Err(Error::Config("concurrency limits must be at least 1".to_string()));
        }

        let timeout_secs: u64 = parse_or(&get, "RELEASE_RADAR_USER_TIMEOUT_SECS", 900)?;

        Ok(Settings {
            api_url: get("SPOTIFY_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            users_file: get("RELEASE_RADAR_USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join("users.json")),
            window_days: parse_or(&get, "RELEASE_RADAR_WINDOW_DAYS", 7)?,
            include_groups,
            page_size,
            artist_concurrency,
            user_concurrency,
            user_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            settle_delay: Duration::from_secs(parse_or(
                &get,
                "RELEASE_RADAR_SETTLE_DELAY_SECS",
                2,
            )?),
            rate_limit: RateLimitPolicy {
                max_retries: parse_or(&get, "RELEASE_RADAR_RATE_LIMIT_MAX_RETRIES", 30)?,
                max_backoff: Duration::from_secs(parse_or(
                    &get,
                    "RELEASE_RADAR_RATE_LIMIT_MAX_BACKOFF_SECS",
                    120,
                )?),
            },
            playlist_name: get("RELEASE_RADAR_PLAYLIST_NAME")
                .unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string()),
            playlist_description: get("RELEASE_RADAR_PLAYLIST_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_PLAYLIST_DESCRIPTION.to_string()),
            cover_image: get("RELEASE_RADAR_COVER_IMAGE").map(PathBuf::from),
            schedule: get("RELEASE_RADAR_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
            server_addr: get("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{}: cannot parse '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
