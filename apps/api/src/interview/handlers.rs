//! Axum route handlers for the interview triggers.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::{ApiJson, AppError};
use crate::interview::models::{GenerationPayload, SkillView};
use crate::meeting::ScheduledCall;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub skills: Vec<SkillView>,
}

#[derive(Debug, Serialize)]
pub struct AiMeetingResponse {
    pub questions: Vec<String>,
    pub meeting: ScheduledCall,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interview/questions
///
/// Manual "generate" trigger. Body fields override the session; missing
/// fields are read from it, so `{}` generates from the session alone.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerationPayload>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let request = state.pipeline.resolve_request(payload);

    let questions = state.pipeline.generate_questions(request).await?;

    Ok(Json(QuestionsResponse {
        questions: questions.into_vec(),
    }))
}

/// POST /api/v1/interview/skills
pub async fn handle_generate_skills(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerationPayload>,
) -> Result<Json<SkillsResponse>, AppError> {
    let request = state.pipeline.resolve_request(payload);

    let skills = state.pipeline.generate_skill_assessment(request).await?;

    Ok(Json(SkillsResponse {
        skills: skills.items().iter().map(SkillView::from).collect(),
    }))
}

/// POST /api/v1/interview/ai-meeting
///
/// "Start AI meeting" shortcut: generates questions from the session, then
/// opens an instant call. No call is created if generation fails.
pub async fn handle_ai_meeting(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerationPayload>,
) -> Result<Json<AiMeetingResponse>, AppError> {
    let request = state.pipeline.resolve_request(payload);
    let description = format!("AI interview: {}", request.role.trim());

    let questions = state.pipeline.generate_questions(request).await?;
    let meeting = state.calls.create_instant_call(&description).await?;
    info!(
        "Started AI meeting {} with {} question(s)",
        meeting.id,
        questions.len()
    );

    Ok(Json(AiMeetingResponse {
        questions: questions.into_vec(),
        meeting,
    }))
}
