use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::{ApiJson, AppError};
use crate::interview::models::{BestEffort, MAX_QUESTIONS};
use crate::session::SessionState;
use crate::state::AppState;

/// Any subset of the session's input fields. Absent fields are left as is.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default, alias = "resumeText")]
    pub document_text: Option<String>,
    #[serde(default, alias = "jobRole")]
    pub role: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    /// Replaces the stored question set, e.g. after the client edits it.
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub is_loading: Option<bool>,
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.snapshot())
}

/// PATCH /api/v1/session
pub async fn handle_update_session(
    State(state): State<AppState>,
    ApiJson(update): ApiJson<SessionUpdate>,
) -> Result<Json<SessionState>, AppError> {
    if let Some(text) = update.document_text {
        state.session.set_document_text(text);
    }
    if let Some(role) = update.role {
        state.session.set_role(role);
    }
    if let Some(jd) = update.job_description {
        state.session.set_job_description(jd);
    }
    if let Some(mut questions) = update.questions {
        questions.retain(|q| !q.trim().is_empty());
        questions.truncate(MAX_QUESTIONS);
        state.session.set_questions(BestEffort::new(questions));
    }
    if let Some(loading) = update.is_loading {
        state.session.set_is_loading(loading);
    }
    Ok(Json(state.session.snapshot()))
}
