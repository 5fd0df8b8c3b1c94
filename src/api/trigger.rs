use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::server::AppState;

/// Runs the Release Radar job and answers with its summary.
///
/// Only one run at a time: while one is in progress further requests get
/// `409 Conflict`.
pub async fn release_radar(Extension(state): Extension<AppState>) -> Response {
    let Ok(_running) = state.running.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a release radar run is already in progress" })),
        )
            .into_response();
    };

    match state.job.run_job().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "release radar run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
