//! Request and artifact types shared by the interview pipeline.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Upper bound on the number of questions kept from a model reply.
pub const MAX_QUESTIONS: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Wire body of the generation triggers. Every field is optional; missing
/// fields are filled from the session before validation.
///
/// Accepts both `documentText`/`role` and the web client's `resumeText`/`jobRole`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    #[serde(default, alias = "resumeText")]
    pub document_text: Option<String>,
    #[serde(default, alias = "jobRole")]
    pub role: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// Fully-resolved pipeline input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    pub document_text: String,
    pub role: String,
    /// Optional in the API; empty string when not supplied.
    pub job_description: String,
}

impl GenerationRequest {
    pub fn new(
        document_text: impl Into<String>,
        role: impl Into<String>,
        job_description: Option<String>,
    ) -> Self {
        Self {
            document_text: document_text.into(),
            role: role.into(),
            job_description: job_description.unwrap_or_default(),
        }
    }

    /// A request is valid only when both the document text and the role are
    /// non-blank. Checked before any network call.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.document_text.trim().is_empty() {
            missing.push("document text");
        }
        if self.role.trim().is_empty() {
            missing.push("role");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Resume text and job role are required (missing: {})",
                missing.join(", ")
            )))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Artifacts
// ────────────────────────────────────────────────────────────────────────────

/// Items recovered from untrusted model output.
///
/// Nothing here is verified: a short or empty sequence means the reply did
/// not follow the requested format, not that the candidate has nothing to
/// ask about. Callers decide whether sparse results deserve a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BestEffort<T>(Vec<T>);

impl<T> BestEffort<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for BestEffort<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

/// Ordered interview questions, most relevant first. At most `MAX_QUESTIONS`.
/// Duplicates are possible.
pub type QuestionSet = BestEffort<String>;

/// Ordered skill ratings, most relevant to the role first.
pub type SkillAssessment = BestEffort<SkillRating>;

/// One skill with a proficiency percentage. The constructor refuses values
/// above 100, so every instance is a valid percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillRating {
    skill: String,
    proficiency: u8,
}

impl SkillRating {
    pub fn new(skill: impl Into<String>, proficiency: u8) -> Option<Self> {
        let skill = skill.into();
        if proficiency > 100 || skill.trim().is_empty() {
            return None;
        }
        Some(Self { skill, proficiency })
    }

    pub fn skill(&self) -> &str {
        &self.skill
    }

    pub fn proficiency(&self) -> u8 {
        self.proficiency
    }
}

/// Wire form of a rating: `{ "skill": "Rust", "proficiency": "85%" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillView {
    pub skill: String,
    pub proficiency: String,
}

impl From<&SkillRating> for SkillView {
    fn from(rating: &SkillRating) -> Self {
        Self {
            skill: rating.skill().to_string(),
            proficiency: format!("{}%", rating.proficiency()),
        }
    }
}
