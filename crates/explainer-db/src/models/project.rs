//! Video project entity model and DTOs.

use explainer_models::{ContextStyle, DialogueScript, ProjectStatus};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::{DbId, Timestamp};

/// A row from the `video_projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoProject {
    pub id: DbId,
    pub title: String,
    pub topic: String,
    pub context_style: ContextStyle,
    pub document_id: Option<String>,
    pub questioner_id: DbId,
    pub explainer_id: DbId,
    pub background_id: Option<DbId>,
    pub background_music_id: Option<DbId>,
    pub target_duration_seconds: i64,
    /// Generated dialogue, absent until generation finishes.
    #[serde(rename = "script")]
    pub script_json: Option<Json<DialogueScript>>,
    pub takeaway: Option<String>,
    pub voiceover_path: Option<String>,
    pub output_path: Option<String>,
    pub duration_seconds: Option<f64>,
    pub status: ProjectStatus,
    pub error_message: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub reviewed_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VideoProject {
    pub fn script(&self) -> Option<&DialogueScript> {
        self.script_json.as_ref().map(|json| &json.0)
    }
}

/// DTO for creating a new project. New projects always start in DRAFT.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideoProject {
    pub title: String,
    pub topic: String,
    pub context_style: ContextStyle,
    pub document_id: Option<String>,
    pub questioner_id: DbId,
    pub explainer_id: DbId,
    pub background_id: Option<DbId>,
    pub background_music_id: Option<DbId>,
    pub target_duration_seconds: i64,
}

/// Listing filter with pagination.
#[derive(Debug, Clone, Copy)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl ProjectFilter {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp limit to `1..=100` and offset to non-negative.
    pub fn new(status: Option<ProjectStatus>, limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            status,
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}
