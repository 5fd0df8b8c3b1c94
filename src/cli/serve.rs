use std::sync::Arc;

use crate::{
    config::Settings,
    error, info,
    radar::ChronJob,
    server::{AppState, start_api_server},
};

/// Serves the HTTP trigger until the process is stopped.
pub async fn serve(settings: &Settings) {
    let job = match ChronJob::from_settings(settings).await {
        Ok(job) => job,
        Err(e) => error!("Cannot set up release radar job. Err: {}", e),
    };

    info!("Listening on http://{}", settings.server_addr);
    let state = AppState::new(Arc::new(job));
    if let Err(e) = start_api_server(&settings.server_addr, state).await {
        error!("Server stopped. Err: {}", e);
    }
}
