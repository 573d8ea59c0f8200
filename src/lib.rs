//! Infrastructure request portal.
//!
//! A user drafts a workload request, has it checked by an external decision
//! service and, once it passes, asks the same service for a deployment
//! manifest to download.

pub mod config;
pub mod fences;
pub mod host;
pub mod models;
pub mod routes;
pub mod session;
pub mod upstream;
pub mod workflow;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::routes::{
    back, copy, download, edit_draft, generate, get_session, health, reset, submit, AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session", get(get_session))
        .route("/session/draft", patch(edit_draft))
        .route("/session/submit", post(submit))
        .route("/session/generate", post(generate))
        .route("/session/back", post(back))
        .route("/session/reset", post(reset))
        .route("/session/download", get(download))
        .route("/session/copy", post(copy))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
