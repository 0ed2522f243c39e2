//! Session state: the one shared mutable scope behind every trigger surface.
//!
//! Fields are written through named setters with last-write-wins semantics.
//! Nothing serializes callers: a generation started before a new upload
//! will read whatever `document_text` is current when it resolves its
//! request. This race is known and left to the client, which uploads
//! before it triggers generation.
//!
//! Stale artifact writes are the exception. Each pipeline run takes a
//! `Ticket`; a commit is applied only if no newer run of the same artifact
//! kind has started since, so a slow early reply never overwrites the
//! result of a later one.

pub mod handlers;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::interview::models::{QuestionSet, SkillAssessment};

/// Snapshot of the session, as returned by `GET /api/v1/session`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub document_text: String,
    pub role: String,
    pub job_description: String,
    /// Advisory busy flag. Clients check it before triggering; the
    /// pipeline itself does not enforce it.
    pub is_loading: bool,
    pub questions: QuestionSet,
    pub skills: SkillAssessment,
    pub questions_generated_at: Option<DateTime<Utc>>,
    pub skills_generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Questions,
    Skills,
}

/// Issued to one pipeline run; identifies it as the newest run of its kind
/// until another ticket of the same kind is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    artifact: Artifact,
    seq: u64,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    in_flight: usize,
    latest_questions: u64,
    latest_skills: u64,
}

impl SessionInner {
    fn latest_mut(&mut self, artifact: Artifact) -> &mut u64 {
        match artifact {
            Artifact::Questions => &mut self.latest_questions,
            Artifact::Skills => &mut self.latest_skills,
        }
    }
}

/// Cheaply clonable handle to the session. All clones share one state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionInner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the plain-data state
    // half-written in a way that matters, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().state.clone()
    }

    pub fn document_text(&self) -> String {
        self.read().state.document_text.clone()
    }

    pub fn set_document_text(&self, text: impl Into<String>) {
        self.write().state.document_text = text.into();
    }

    pub fn role(&self) -> String {
        self.read().state.role.clone()
    }

    pub fn set_role(&self, role: impl Into<String>) {
        self.write().state.role = role.into();
    }

    pub fn job_description(&self) -> String {
        self.read().state.job_description.clone()
    }

    pub fn set_job_description(&self, description: impl Into<String>) {
        self.write().state.job_description = description.into();
    }

    #[allow(dead_code)] // read by clients through `snapshot`
    pub fn is_loading(&self) -> bool {
        self.read().state.is_loading
    }

    /// Explicit override. Pipeline runs drive the flag through `LoadingGuard`.
    pub fn set_is_loading(&self, loading: bool) {
        self.write().state.is_loading = loading;
    }

    #[allow(dead_code)]
    pub fn questions(&self) -> QuestionSet {
        self.read().state.questions.clone()
    }

    /// Replaces the whole question set. Counts as the newest question write,
    /// so runs already in flight can no longer commit over it.
    pub fn set_questions(&self, questions: QuestionSet) {
        let mut inner = self.write();
        inner.latest_questions += 1;
        inner.state.questions = questions;
        inner.state.questions_generated_at = Some(Utc::now());
    }

    #[allow(dead_code)]
    pub fn skills(&self) -> SkillAssessment {
        self.read().state.skills.clone()
    }

    /// Marks the session busy until the returned guard is dropped.
    pub fn begin_loading(&self) -> LoadingGuard {
        let mut inner = self.write();
        inner.in_flight += 1;
        inner.state.is_loading = true;
        LoadingGuard {
            store: self.clone(),
        }
    }

    pub fn issue_ticket(&self, artifact: Artifact) -> Ticket {
        let mut inner = self.write();
        let latest = inner.latest_mut(artifact);
        *latest += 1;
        Ticket {
            artifact,
            seq: *latest,
        }
    }

    /// Stores `questions` if `ticket` is still the newest question run.
    /// Returns whether the write happened.
    pub fn commit_questions(&self, ticket: &Ticket, questions: QuestionSet) -> bool {
        let mut inner = self.write();
        if ticket.artifact != Artifact::Questions || inner.latest_questions != ticket.seq {
            return false;
        }
        inner.state.questions = questions;
        inner.state.questions_generated_at = Some(Utc::now());
        true
    }

    /// Stores `skills` if `ticket` is still the newest skill run.
    /// Returns whether the write happened.
    pub fn commit_skills(&self, ticket: &Ticket, skills: SkillAssessment) -> bool {
        let mut inner = self.write();
        if ticket.artifact != Artifact::Skills || inner.latest_skills != ticket.seq {
            return false;
        }
        inner.state.skills = skills;
        inner.state.skills_generated_at = Some(Utc::now());
        true
    }
}

/// Holds the session busy. Dropping it clears `is_loading` once no other
/// run is in flight, on every exit path including errors and panics.
#[derive(Debug)]
pub struct LoadingGuard {
    store: SessionStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut inner = self.store.write();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.state.is_loading = inner.in_flight > 0;
    }
}
