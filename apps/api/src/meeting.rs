//! Video-call creation boundary.
//!
//! The call platform lives outside this service. Handlers only see
//! `CallProvider`; swap the implementation in `AppState` to bind a real SDK.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCall {
    pub id: Uuid,
    /// Client-side route that joins the call.
    pub join_path: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
}

#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn create_instant_call(&self, description: &str) -> Result<ScheduledCall, AppError>;
}

/// Mints call ids locally and starts the call immediately.
pub struct InstantCallProvider;

#[async_trait]
impl CallProvider for InstantCallProvider {
    async fn create_instant_call(&self, description: &str) -> Result<ScheduledCall, AppError> {
        let id = Uuid::new_v4();
        let description = if description.trim().is_empty() {
            "Instant Meeting".to_string()
        } else {
            description.trim().to_string()
        };
        Ok(ScheduledCall {
            id,
            join_path: format!("/meeting/{id}"),
            description,
            starts_at: Utc::now(),
        })
    }
}
