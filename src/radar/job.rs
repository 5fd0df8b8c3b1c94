use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::{StreamExt, stream};
use tokio::time::timeout;

use crate::{
    config::Settings,
    error::{Error, Result},
    management::{FileUserStore, UserStore},
    radar::{PlaylistReconciler, ReleaseRadarAggregator, playlist::load_cover_image},
    spotify::{
        CatalogFactory, SpotifyClientFactory,
        auth::{CredentialStore, SpotifyAccounts},
    },
    types::{JobSummary, ReconcileOutcome, UserFailure, UserRecord},
    utils::format_timestamp,
};

/// Runs the Release Radar pipeline for every opted-in user.
///
/// Users are processed concurrently and independently. A failing user ends
/// up in [`JobSummary::failed`]; only failing to list the users fails the job.
pub struct ChronJob<U, K, F> {
    users: U,
    credentials: K,
    catalogs: F,
    pub aggregator: ReleaseRadarAggregator,
    pub reconciler: PlaylistReconciler,
    pub user_concurrency: usize,
    /// Upper bound of one user's whole run. `None` waits indefinitely.
    pub user_timeout: Option<Duration>,
}

impl ChronJob<FileUserStore, SpotifyAccounts, SpotifyClientFactory> {
    /// Wires the job against the Spotify API and the JSON user store.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let cover = load_cover_image(settings.cover_image.as_deref()).await?;

        let mut job = ChronJob::new(
            FileUserStore::new(&settings.users_file),
            SpotifyAccounts::new(
                &settings.token_url,
                &settings.client_id,
                &settings.client_secret,
            ),
            SpotifyClientFactory::new(&settings.api_url, settings.rate_limit),
            PlaylistReconciler {
                name: settings.playlist_name.clone(),
                description: settings.playlist_description.clone(),
                cover_jpeg_base64: cover,
                settle_delay: settings.settle_delay,
            },
        );

        job.aggregator = ReleaseRadarAggregator {
            window_days: settings.window_days,
            page_size: settings.page_size,
            include_groups: settings.include_groups.clone(),
            concurrency: settings.artist_concurrency,
        };
        job.user_concurrency = settings.user_concurrency;
        job.user_timeout = settings.user_timeout;

        Ok(job)
    }
}

impl<U, K, F> ChronJob<U, K, F>
where
    U: UserStore,
    K: CredentialStore,
    F: CatalogFactory,
{
    pub fn new(users: U, credentials: K, catalogs: F, reconciler: PlaylistReconciler) -> Self {
        Self {
            users,
            credentials,
            catalogs,
            aggregator: ReleaseRadarAggregator::default(),
            reconciler,
            user_concurrency: 4,
            user_timeout: None,
        }
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    pub async fn run(&self) -> Result<JobSummary> {
        self.run_on(Utc::now().date_naive()).await
    }

    /// Runs the job as if it were `today`.
    pub async fn run_on(&self, today: NaiveDate) -> Result<JobSummary> {
        let users = self.users.list_active_users().await?;
        tracing::info!(users = users.len(), %today, "starting release radar run");

        let outcomes: Vec<(String, Result<ReconcileOutcome>)> = stream::iter(users)
            .map(|user| async move {
                let outcome = self.run_user(&user, today).await;
                (user.email, outcome)
            })
            .buffer_unordered(self.user_concurrency.max(1))
            .collect()
            .await;

        let mut summary = JobSummary::default();
        for (email, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    tracing::info!(
                        email = %email,
                        playlist_id = outcome.playlist_id(),
                        "release radar updated"
                    );
                    summary.succeeded.push(email);
                }
                Err(e) => {
                    tracing::error!(email = %email, error = %e, "release radar failed");
                    summary.failed.push(UserFailure {
                        email,
                        error: e.to_string(),
                    });
                }
            }
        }

        summary.succeeded.sort();
        summary.failed.sort_by(|a, b| a.email.cmp(&b.email));
        tracing::info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "release radar run finished"
        );

        Ok(summary)
    }

    async fn run_user(&self, user: &UserRecord, today: NaiveDate) -> Result<ReconcileOutcome> {
        match self.user_timeout {
            Some(limit) => timeout(limit, self.process_user(user, today))
                .await
                .map_err(|_| Error::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => self.process_user(user, today).await,
        }
    }

    /// Token exchange, aggregation and reconciliation for one user.
    ///
    /// The catalog client opened here owns the user's connection pool and is
    /// dropped on return, whatever the outcome.
    async fn process_user(&self, user: &UserRecord, today: NaiveDate) -> Result<ReconcileOutcome> {
        let access_token = self.credentials.access_token(&user.refresh_token).await?;
        let catalog = self.catalogs.open(access_token);

        let tracks = self.aggregator.collect(&catalog, today).await?;
        tracing::info!(email = %user.email, tracks = tracks.len(), "aggregated new releases");

        let outcome = self
            .reconciler
            .reconcile(
                &catalog,
                &user.user_id,
                user.release_radar_id.as_deref(),
                &tracks,
            )
            .await?;

        let playlist_id = match &outcome {
            ReconcileOutcome::Created { playlist_id, .. } => Some(playlist_id.as_str()),
            ReconcileOutcome::Replaced { .. } => None,
        };
        let updated_at = format_timestamp(Utc::now());

        if let Err(e) = self
            .users
            .record_run(&user.email, playlist_id, &updated_at)
            .await
        {
            if let Some(playlist_id) = playlist_id {
                // next run will create another one
                tracing::error!(
                    email = %user.email,
                    playlist_id = %playlist_id,
                    "created playlist but could not store its id"
                );
            }
            return Err(e);
        }

        Ok(outcome)
    }
}
