//! Interview pipeline: sequences validation → prompt → model call → parse →
//! session update for each artifact.
//!
//! Per run:
//!   Idle → ValidatingRequest → (Validation error)
//!        → Invoking          → (Generation error)
//!        → ParsingResponse   → UpdatingState → Idle
//!
//! Stages run strictly in order. Failures leave the stored artifacts as
//! they were; `is_loading` is released on every path by `LoadingGuard`.
//! Runs are neither coalesced nor locked against each other; the newest
//! run of an artifact kind owns the final state (see `session::Ticket`).

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::models::{
    GenerationPayload, GenerationRequest, QuestionSet, SkillAssessment,
};
use crate::interview::parser::{parse_questions, parse_skills};
use crate::interview::prompts::{build_question_prompt, build_skill_prompt};
use crate::llm_client::{SamplingConfig, TextGenerator};
use crate::session::{Artifact, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingRequest,
    Invoking,
    ParsingResponse,
    UpdatingState,
}

#[derive(Clone)]
pub struct InterviewPipeline {
    llm: Arc<dyn TextGenerator>,
    session: SessionStore,
}

impl InterviewPipeline {
    pub fn new(llm: Arc<dyn TextGenerator>, session: SessionStore) -> Self {
        Self { llm, session }
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Fills the fields a trigger left out from the session. Nothing is
    /// written here; a run stores its inputs only once they pass validation,
    /// so a rejected request never clobbers an earlier upload.
    pub fn resolve_request(&self, payload: GenerationPayload) -> GenerationRequest {
        let GenerationPayload {
            document_text,
            role,
            job_description,
        } = payload;

        GenerationRequest::new(
            document_text.unwrap_or_else(|| self.session.document_text()),
            role.unwrap_or_else(|| self.session.role()),
            Some(job_description.unwrap_or_else(|| self.session.job_description())),
        )
    }

    fn remember_inputs(&self, request: &GenerationRequest) {
        self.session.set_document_text(request.document_text.as_str());
        self.session.set_role(request.role.as_str());
        self.session.set_job_description(request.job_description.as_str());
    }

    /// Generates up to 10 interview questions and stores them in the session.
    pub async fn generate_questions(
        &self,
        request: GenerationRequest,
    ) -> Result<QuestionSet, AppError> {
        self.enter(Stage::ValidatingRequest, Artifact::Questions);
        request.validate()?;
        self.remember_inputs(&request);

        let _loading = self.session.begin_loading();
        let ticket = self.session.issue_ticket(Artifact::Questions);

        let prompt = build_question_prompt(&request);
        self.enter(Stage::Invoking, Artifact::Questions);
        let raw = self
            .llm
            .generate(&prompt, &SamplingConfig::questions())
            .await
            .map_err(|e| AppError::Generation(format!("Question generation failed: {e}")))?;

        self.enter(Stage::ParsingResponse, Artifact::Questions);
        let questions = parse_questions(&raw);
        if questions.is_empty() {
            warn!(
                "Model reply contained no numbered questions ({} chars)",
                raw.len()
            );
        }

        self.enter(Stage::UpdatingState, Artifact::Questions);
        if !self.session.commit_questions(&ticket, questions.clone()) {
            warn!("Discarding stale question result; a newer run has started");
        }

        info!(
            "Generated {} question(s) for role '{}'",
            questions.len(),
            request.role
        );
        Ok(questions)
    }

    /// Rates the resume's skills and stores the assessment in the session.
    pub async fn generate_skill_assessment(
        &self,
        request: GenerationRequest,
    ) -> Result<SkillAssessment, AppError> {
        self.enter(Stage::ValidatingRequest, Artifact::Skills);
        request.validate()?;
        self.remember_inputs(&request);

        let _loading = self.session.begin_loading();
        let ticket = self.session.issue_ticket(Artifact::Skills);

        let prompt = build_skill_prompt(&request);
        self.enter(Stage::Invoking, Artifact::Skills);
        let raw = self
            .llm
            .generate(&prompt, &SamplingConfig::skills())
            .await
            .map_err(|e| AppError::Generation(format!("Skill assessment failed: {e}")))?;

        self.enter(Stage::ParsingResponse, Artifact::Skills);
        let skills = parse_skills(&raw);
        if skills.is_empty() {
            warn!("Model reply contained no parseable skills ({} chars)", raw.len());
        }

        self.enter(Stage::UpdatingState, Artifact::Skills);
        if !self.session.commit_skills(&ticket, skills.clone()) {
            warn!("Discarding stale skill result; a newer run has started");
        }

        info!(
            "Assessed {} skill(s) for role '{}'",
            skills.len(),
            request.role
        );
        Ok(skills)
    }

    fn enter(&self, stage: Stage, artifact: Artifact) {
        tracing::debug!(?artifact, ?stage, "pipeline stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::interview::models::{BestEffort, SkillRating};
    use crate::llm_client::LlmError;

    /// Returns a canned reply (or failure) and counts calls.
    struct SpyGenerator {
        reply: Result<String, u16>,
        calls: AtomicUsize,
        last_temperature: std::sync::Mutex<Option<f32>>,
    }

    impl SpyGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_temperature: std::sync::Mutex::new(None),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last_temperature: std::sync::Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for SpyGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            sampling: &SamplingConfig,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_temperature.lock().unwrap() = Some(sampling.temperature);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "quota exceeded".to_string(),
                }),
            }
        }
    }

    fn pipeline(llm: Arc<dyn TextGenerator>) -> InterviewPipeline {
        InterviewPipeline::new(llm, SessionStore::new())
    }

    fn scenario_request() -> GenerationRequest {
        GenerationRequest::new(
            "Built React dashboards. 3 years Node.js.",
            "Full Stack Developer",
            None,
        )
    }

    #[tokio::test]
    async fn test_questions_end_to_end() {
        let spy = SpyGenerator::replying(
            "1. Describe your React dashboard architecture.\n2. How did you use Node.js in production?\nSome trailing commentary.",
        );
        let pipeline = pipeline(spy.clone());

        let questions = pipeline
            .generate_questions(scenario_request())
            .await
            .unwrap();

        let expected = vec![
            "Describe your React dashboard architecture.".to_string(),
            "How did you use Node.js in production?".to_string(),
        ];
        assert_eq!(questions.items(), expected.as_slice());
        assert_eq!(pipeline.session().questions().items(), expected.as_slice());
        assert!(!pipeline.session().is_loading());
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_skills_end_to_end() {
        let spy = SpyGenerator::replying(
            r#"{"skills":[{"skill":"JavaScript","proficiency":"92%"}]}"#,
        );
        let pipeline = pipeline(spy.clone());

        let skills = pipeline
            .generate_skill_assessment(scenario_request())
            .await
            .unwrap();

        assert_eq!(
            skills.items(),
            &[SkillRating::new("JavaScript", 92).unwrap()]
        );
        assert_eq!(pipeline.session().skills(), skills);
        assert_eq!(
            *spy.last_temperature.lock().unwrap(),
            Some(SamplingConfig::skills().temperature)
        );
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_the_model() {
        let spy = SpyGenerator::replying("1. unused");
        let pipeline = pipeline(spy.clone());

        let empty_document = GenerationRequest::new("", "Backend Developer", None);
        let empty_role = GenerationRequest::new("resume", "   ", None);

        for request in [empty_document.clone(), empty_role.clone()] {
            let err = pipeline.generate_questions(request).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        for request in [empty_document, empty_role] {
            let err = pipeline.generate_skill_assessment(request).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(spy.calls(), 0);
        assert!(!pipeline.session().is_loading());
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_previous_questions() {
        let spy = SpyGenerator::failing(429);
        let pipeline = pipeline(spy.clone());
        let previous: QuestionSet = BestEffort::new(vec!["Earlier question".to_string()]);
        pipeline.session().set_questions(previous.clone());

        let err = pipeline
            .generate_questions(scenario_request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
        assert_eq!(pipeline.session().questions(), previous);
        assert!(!pipeline.session().is_loading());
        assert_eq!(spy.calls(), 1, "no retry after a failed call");
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_previous_skills() {
        let spy = SpyGenerator::failing(503);
        let pipeline = pipeline(spy.clone());
        let previous: SkillAssessment =
            BestEffort::new(vec![SkillRating::new("Rust", 81).unwrap()]);
        let earlier = pipeline.session().issue_ticket(Artifact::Skills);
        assert!(pipeline.session().commit_skills(&earlier, previous.clone()));

        let err = pipeline
            .generate_skill_assessment(scenario_request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
        assert_eq!(pipeline.session().skills(), previous);
        assert!(!pipeline.session().is_loading());
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_an_empty_success() {
        let pipeline = pipeline(SpyGenerator::replying("I cannot help with that."));
        let questions = pipeline
            .generate_questions(scenario_request())
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[test]
    fn test_resolve_request_falls_back_to_session() {
        let pipeline = pipeline(SpyGenerator::replying(""));
        pipeline.session().set_document_text("uploaded resume");
        pipeline.session().set_role("Frontend Developer");

        let request = pipeline.resolve_request(GenerationPayload {
            document_text: None,
            role: None,
            job_description: Some("React".to_string()),
        });

        assert_eq!(request.document_text, "uploaded resume");
        assert_eq!(request.role, "Frontend Developer");
        assert_eq!(request.job_description, "React");
        // Resolving alone does not touch the session.
        assert_eq!(pipeline.session().job_description(), "");
    }

    #[test]
    fn test_resolve_request_keeps_explicit_blank() {
        let pipeline = pipeline(SpyGenerator::replying(""));
        pipeline.session().set_document_text("uploaded resume");

        let request = pipeline.resolve_request(GenerationPayload {
            document_text: Some(String::new()),
            role: Some("Backend Developer".to_string()),
            job_description: None,
        });

        assert_eq!(request.document_text, "");
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    async fn test_rejected_request_leaves_session_inputs_alone() {
        let spy = SpyGenerator::replying("1. unused");
        let pipeline = pipeline(spy.clone());
        pipeline.session().set_document_text("uploaded resume");
        pipeline.session().set_role("Frontend Developer");

        let request = pipeline.resolve_request(GenerationPayload {
            document_text: Some("replacement resume".to_string()),
            role: Some("  ".to_string()),
            job_description: None,
        });
        let err = pipeline.generate_questions(request).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(pipeline.session().document_text(), "uploaded resume");
        assert_eq!(pipeline.session().role(), "Frontend Developer");
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_accepted_request_is_stored_in_session() {
        let pipeline = pipeline(SpyGenerator::replying("1. Q"));
        let request = pipeline.resolve_request(GenerationPayload {
            document_text: Some("fresh resume".to_string()),
            role: Some("SRE".to_string()),
            job_description: Some("On-call".to_string()),
        });

        pipeline.generate_questions(request).await.unwrap();

        let state = pipeline.session().snapshot();
        assert_eq!(state.document_text, "fresh resume");
        assert_eq!(state.role, "SRE");
        assert_eq!(state.job_description, "On-call");
    }

    /// Blocks every call until released, then replies with a fixed text.
    struct GatedGenerator {
        gate: Notify,
        reply: String,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _sampling: &SamplingConfig,
        ) -> Result<String, LlmError> {
            self.gate.notified().await;
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_stale_run_does_not_overwrite_newer_result() {
        let session = SessionStore::new();
        let slow = Arc::new(GatedGenerator {
            gate: Notify::new(),
            reply: "1. Stale question".to_string(),
        });
        let slow_pipeline = InterviewPipeline::new(slow.clone(), session.clone());
        let fast_pipeline =
            InterviewPipeline::new(SpyGenerator::replying("1. Fresh question"), session.clone());

        let slow_run = tokio::spawn({
            let pipeline = slow_pipeline.clone();
            async move { pipeline.generate_questions(scenario_request()).await }
        });

        // Let the slow run take its ticket and park on the gate.
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        fast_pipeline
            .generate_questions(scenario_request())
            .await
            .unwrap();
        assert!(session.is_loading(), "slow run is still in flight");

        slow.gate.notify_one();
        let stale = slow_run.await.unwrap().unwrap();

        assert_eq!(stale.items(), &["Stale question".to_string()]);
        assert_eq!(session.questions().items(), &["Fresh question".to_string()]);
        assert!(!session.is_loading());
    }
}
