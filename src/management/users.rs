use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    types::UserRecord,
};

/// Persistent store of registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// Users that opted in to the Release Radar.
    async fn list_active_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.active)
            .collect())
    }

    async fn get(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Inserts the record, or replaces the one with the same email.
    async fn save(&self, user: &UserRecord) -> Result<()>;

    /// Stamps a finished run onto the stored record of `email`.
    ///
    /// Only `updatedAt` and, when given, `releaseRadarId` change. Every other
    /// field keeps whatever the store holds now, so edits made while the run
    /// was in flight survive.
    async fn record_run(
        &self,
        email: &str,
        playlist_id: Option<&str>,
        updated_at: &str,
    ) -> Result<()>;
}

/// Applies a finished run to `users`. Fails if `email` is no longer stored.
fn apply_run(
    users: &mut [UserRecord],
    email: &str,
    playlist_id: Option<&str>,
    updated_at: &str,
) -> Result<()> {
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

/// Users kept as a JSON array in a single file.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash mid-write never leaves a truncated store behind. A missing file
/// reads as an empty store.
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<UserRecord>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            Error::UserStore(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    async fn persist(&self, users: &[UserRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(users)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, email: &str) -> Result<Option<UserRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|u| u.email == email))
    }

    async fn save(&self, user: &UserRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;

        match users.iter_mut().find(|u| u.email == user.email) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }

        self.persist(&users).await
    }

    async fn record_run(
        &self,
        email: &str,
        playlist_id: Option<&str>,
        updated_at: &str,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;
        apply_run(&mut users, email, playlist_id, updated_at)?;
        self.persist(&users).await
    }
}
