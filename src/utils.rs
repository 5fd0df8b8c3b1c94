use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};

pub const TRACK_URI_PREFIX: &str = "spotify:track:";
pub const ALBUM_URI_PREFIX: &str = "spotify:album:";

/// Upper bound of ids accepted by the several-albums endpoint.
pub const ALBUM_BATCH_LIMIT: usize = 20;
/// Upper bound of uris accepted by the playlist add/remove endpoints.
pub const PLAYLIST_BATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl ReleaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseKind::Album => "album",
            ReleaseKind::Single => "single",
            ReleaseKind::AppearsOn => "appears_on",
            ReleaseKind::Compilation => "compilation",
        }
    }
}

impl FromStr for ReleaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "album" => Ok(ReleaseKind::Album),
            "single" => Ok(ReleaseKind::Single),
            "appears_on" => Ok(ReleaseKind::AppearsOn),
            "compilation" => Ok(ReleaseKind::Compilation),
            other => Err(format!("unknown release type '{}'", other)),
        }
    }
}

/// The `include_groups` filter sent with artist release lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseKinds(Vec<ReleaseKind>);

impl ReleaseKinds {
    pub fn kinds(&self) -> &[ReleaseKind] {
        &self.0
    }
}

impl Default for ReleaseKinds {
    fn default() -> Self {
        ReleaseKinds(vec![ReleaseKind::Album, ReleaseKind::Single])
    }
}

impl fmt::Display for ReleaseKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}", joined)
    }
}

/// Parses a comma separated list such as `album,single`. `all` selects every kind.
pub fn parse_release_kinds(s: &str) -> Result<ReleaseKinds, String> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(ReleaseKinds(vec![
            ReleaseKind::Album,
            ReleaseKind::Single,
            ReleaseKind::AppearsOn,
            ReleaseKind::Compilation,
        ]));
    }

    let mut kinds: Vec<ReleaseKind> = Vec::new();
    for part in s.split(',').filter(|p| !p.trim().is_empty()) {
        let kind = part.parse::<ReleaseKind>()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        return Err("at least one release type is required".to_string());
    }

    Ok(ReleaseKinds(kinds))
}

/// Where a release date sits relative to the recency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAge {
    Recent,
    /// Dated further ahead than the window reaches.
    Upcoming,
    /// Older than the window.
    Stale,
    /// Partial (`2024`, `2024-05`) or malformed date.
    Undated,
}

/// Trailing window of days, inclusive on both ends, in which a release counts as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    today: NaiveDate,
    days: i64,
}

impl RecencyWindow {
    pub fn new(today: NaiveDate, days: u32) -> Self {
        Self {
            today,
            days: i64::from(days),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn classify(&self, release_date: &str) -> ReleaseAge {
        if release_date.len() < 8 {
            return ReleaseAge::Undated;
        }

        let Ok(date) = NaiveDate::parse_from_str(release_date, "%Y-%m-%d") else {
            return ReleaseAge::Undated;
        };

        let age = (self.today - date).num_days();
        if age.abs() <= self.days {
            ReleaseAge::Recent
        } else if age < 0 {
            ReleaseAge::Upcoming
        } else {
            ReleaseAge::Stale
        }
    }

    pub fn contains(&self, release_date: &str) -> bool {
        self.classify(release_date) == ReleaseAge::Recent
    }
}

/// Splits release uris into track uris and album uris. Anything else is dropped.
pub fn split_release_uris<I>(uris: I) -> (BTreeSet<String>, BTreeSet<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut tracks = BTreeSet::new();
    let mut albums = BTreeSet::new();

    for uri in uris {
        if uri.starts_with(TRACK_URI_PREFIX) {
            tracks.insert(uri);
        } else if uri.starts_with(ALBUM_URI_PREFIX) {
            albums.insert(uri);
        }
    }

    (tracks, albums)
}

/// `spotify:album:abc` -> `abc`. Bare ids are returned unchanged.
pub fn id_from_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Timestamp format stored in `updatedAt`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
