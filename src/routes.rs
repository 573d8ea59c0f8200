use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    host::Clipboard,
    models::{DraftPatch, ErrorDetail},
    session::{Session, Snapshot},
    workflow::WorkflowError,
};

#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub clipboard: Arc<dyn Clipboard>,
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkflowError::Draft(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::GenerationUnavailable | WorkflowError::NotGenerated => StatusCode::CONFLICT,
        };
        (status, Json(ErrorDetail { detail: self.to_string() })).into_response()
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn get_session(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.session.snapshot())
}

pub async fn edit_draft(
    State(state): State<AppState>,
    Json(patch): Json<DraftPatch>,
) -> Result<Json<Snapshot>, WorkflowError> {
    state.session.edit(patch)?;
    Ok(Json(state.session.snapshot()))
}

pub async fn submit(State(state): State<AppState>) -> Result<Json<Snapshot>, WorkflowError> {
    state.session.submit().await?;
    Ok(Json(state.session.snapshot()))
}

pub async fn generate(State(state): State<AppState>) -> Result<Json<Snapshot>, WorkflowError> {
    state.session.generate().await?;
    Ok(Json(state.session.snapshot()))
}

pub async fn back(State(state): State<AppState>) -> Result<Json<Snapshot>, WorkflowError> {
    state.session.back()?;
    Ok(Json(state.session.snapshot()))
}

pub async fn reset(State(state): State<AppState>) -> Json<Snapshot> {
    state.session.reset();
    Json(state.session.snapshot())
}

pub async fn download(State(state): State<AppState>) -> Result<Response, WorkflowError> {
    let file = state.session.download()?;
    tracing::info!("📦 Serving manifest download {}", file.file_name);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.content_type));
    match HeaderValue::from_str(&file.content_disposition()) {
        Ok(disposition) => {
            headers.insert(header::CONTENT_DISPOSITION, disposition);
        }
        Err(e) => tracing::warn!("⚠️ Serving {} without a file name: {}", file.file_name, e),
    }
    Ok((StatusCode::OK, headers, file.contents).into_response())
}

pub async fn copy(State(state): State<AppState>) -> Result<StatusCode, WorkflowError> {
    state.session.copy_to_clipboard(state.clipboard.as_ref())?;
    Ok(StatusCode::NO_CONTENT)
}
