//! Axum route handlers for the ingest endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use super::DocumentStore;
use crate::note::{required, NoteRecord};

/// Path of the add-note handler.
pub const ADD_NOTE_PATH: &str = "/api/addNote";

/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/api/health";

const MISSING_FIELDS_MESSAGE: &str = "Title and content are required.";
const SAVED_MESSAGE: &str = "Note saved";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Where new notes are inserted.
    pub store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Body of `POST /api/addNote`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddNoteRequest {
    /// Note title.
    #[serde(default)]
    pub title: Option<String>,
    /// Note content.
    #[serde(default)]
    pub content: Option<String>,
}

/// Success body of `POST /api/addNote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNoteResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// The stored record.
    pub item: NoteRecord,
}

/// Build the endpoint router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ADD_NOTE_PATH, post(add_note))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// POST /api/addNote
async fn add_note(
    State(state): State<AppState>,
    payload: Result<Json<AddNoteRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!("Rejected add-note body: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE).into_response();
        }
    };

    let title = req.title.unwrap_or_default();
    let content = req.content.unwrap_or_default();
    if let Err(err) = required("title", &title).and_then(|_| required("content", &content)) {
        debug!("Rejected add-note request: {}", err);
        return (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE).into_response();
    }

    let item = NoteRecord::new(title, content);
    match state.store.create_item(&item).await {
        Ok(()) => {
            info!("Stored note {} ('{}')", item.id, item.title);
            (
                StatusCode::OK,
                Json(AddNoteResponse {
                    message: SAVED_MESSAGE.to_string(),
                    item,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to store note {}: {}", item.id, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save note: {err}"),
            )
                .into_response()
        }
    }
}

// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
