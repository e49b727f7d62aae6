//! HTTP surface: trigger endpoint, session status, liveness.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{info, warn};

use strategypipe_core::{SessionRunConfig, spawn_session};
use strategypipe_shared::{GPT_MODULE, PipelineConfig, TriggerRequest, session_dir_name};
use strategypipe_store::ArtifactStore;
use strategypipe_storage::Storage;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub storage: Arc<Storage>,
    pub store: Arc<dyn ArtifactStore>,
    pub pipeline: PipelineConfig,
}

/// Build the service router.
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/start_it_strategy", post(start_it_strategy))
        .route("/sessions/{id}", get(get_session))
        .with_state(state)
}

async fn liveness() -> &'static str {
    "IT Strategy API is live"
}

/// Accept a trigger, register the session, and kick off the pipeline in
/// the background. Responds as soon as the session is registered.
async fn start_it_strategy(
    State(state): State<AppState>,
    Json(request): Json<TriggerRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        warn!(error = %e, "rejecting trigger request");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing required fields"})),
        )
            .into_response();
    }

    let session_dir = state
        .pipeline
        .base_dir
        .join(session_dir_name(&request.session_id));
    if let Err(e) = std::fs::create_dir_all(&session_dir) {
        warn!(path = %session_dir.display(), error = %e, "failed to create session directory");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to create session workspace"})),
        )
            .into_response();
    }

    if let Err(e) = state
        .storage
        .insert_session(&request.session_id, &request.email, GPT_MODULE)
        .await
    {
        warn!(session_id = %request.session_id, error = %e, "failed to register session");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to register session"})),
        )
            .into_response();
    }

    info!(
        session_id = %request.session_id,
        files = request.files.len(),
        "session accepted"
    );

    let config = SessionRunConfig {
        session_id: request.session_id,
        email: request.email,
        files: request.files,
        session_dir,
        pipeline: state.pipeline.clone(),
    };
    spawn_session(config, Arc::clone(&state.store), Arc::clone(&state.storage));

    (
        StatusCode::OK,
        Json(json!({"message": "IT Strategy generation started"})),
    )
        .into_response()
}

/// Report the status record of a session.
async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.storage.get_session(&id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Unknown session"})),
        )
            .into_response(),
        Err(e) => {
            warn!(session_id = %id, error = %e, "session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Session lookup failed"})),
            )
                .into_response()
        }
    }
}
