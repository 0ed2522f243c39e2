pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::document::handlers as documents;
use crate::interview::handlers as interview;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Document intake
        .route(
            "/api/v1/documents",
            post(documents::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Session
        .route(
            "/api/v1/session",
            get(session::handle_get_session).patch(session::handle_update_session),
        )
        // Interview triggers
        .route(
            "/api/v1/interview/questions",
            post(interview::handle_generate_questions),
        )
        .route(
            "/api/v1/interview/skills",
            post(interview::handle_generate_skills),
        )
        .route(
            "/api/v1/interview/ai-meeting",
            post(interview::handle_ai_meeting),
        )
        .with_state(state)
}
