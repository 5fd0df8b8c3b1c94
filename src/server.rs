use std::{net::SocketAddr, str::FromStr, sync::Arc};

use async_trait::async_trait;
use axum::{
    Extension, Router,
    routing::{get, post},
};
use tokio::sync::Mutex;

use crate::{
    api,
    error::{Error, Result},
    management::UserStore,
    radar::ChronJob,
    spotify::{CatalogFactory, auth::CredentialStore},
    types::JobSummary,
};

/// Something that can execute one full Release Radar run.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self) -> Result<JobSummary>;
}

#[async_trait]
impl<U, K, F> JobRunner for ChronJob<U, K, F>
where
    U: UserStore,
    K: CredentialStore,
    F: CatalogFactory,
{
    async fn run_job(&self) -> Result<JobSummary> {
        self.run().await
    }
}

/// Shared state of the HTTP trigger.
#[derive(Clone)]
pub struct AppState {
    pub job: Arc<dyn JobRunner>,
    /// Held for the duration of a run; a second trigger is turned away.
    pub running: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(job: Arc<dyn JobRunner>) -> Self {
        Self {
            job,
            running: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/release-radar",
            post(api::release_radar).layer(Extension(state)),
        )
}

pub async fn start_api_server(addr: &str, state: AppState) -> Result<()> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("invalid server address '{}': {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
