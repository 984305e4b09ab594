//! Repository for the `video_projects` table.
//!
//! Every status change is a compare-and-set: the `UPDATE` only matches while
//! the row is still in one of the allowed predecessor states, so two racing
//! writers cannot both move the same project.

use chrono::Utc;
use explainer_models::{DialogueScript, ProjectStatus};
use sqlx::types::Json;

use crate::models::{CreateVideoProject, DbId, ProjectFilter, VideoProject};
use crate::DbPool;

const COLUMNS: &str = "id, title, topic, context_style, document_id, questioner_id, explainer_id, \
     background_id, background_music_id, target_duration_seconds, script_json, takeaway, \
     voiceover_path, output_path, duration_seconds, status, error_message, reviewed_at, \
     reviewed_by, created_at, updated_at";

/// Numbered placeholders `?first, ?first+1, ...` for an `IN` list.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// CRUD and lifecycle transitions for video projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new DRAFT project with no script yet.
    pub async fn create(
        pool: &DbPool,
        input: &CreateVideoProject,
    ) -> Result<VideoProject, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_projects
                (title, topic, context_style, document_id, questioner_id, explainer_id,
                 background_id, background_music_id, target_duration_seconds, status,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(&input.title)
            .bind(&input.topic)
            .bind(input.context_style)
            .bind(&input.document_id)
            .bind(input.questioner_id)
            .bind(input.explainer_id)
            .bind(input.background_id)
            .bind(input.background_music_id)
            .bind(input.target_duration_seconds)
            .bind(ProjectStatus::Draft)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<VideoProject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_projects WHERE id = ?1");
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects newest first.
    pub async fn list(
        pool: &DbPool,
        filter: &ProjectFilter,
    ) -> Result<Vec<VideoProject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_projects
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(filter.status)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// All projects currently in any of `statuses`.
    pub async fn list_by_status(
        pool: &DbPool,
        statuses: &[ProjectStatus],
    ) -> Result<Vec<VideoProject>, sqlx::Error> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM video_projects WHERE status IN ({}) ORDER BY id ASC",
            placeholders(1, statuses.len())
        );
        let mut q = sqlx::query_as::<_, VideoProject>(&query);
        for status in statuses {
            q = q.bind(*status);
        }
        q.fetch_all(pool).await
    }

    /// Store a generated or edited script while the project is in DRAFT.
    ///
    /// Returns `None` if the project is missing or no longer a draft.
    pub async fn update_script(
        pool: &DbPool,
        id: DbId,
        script: &DialogueScript,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        let query = format!(
            "UPDATE video_projects SET
                script_json = ?2,
                takeaway = ?3,
                updated_at = ?4
             WHERE id = ?1 AND status = ?5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(id)
            .bind(Json(script))
            .bind(&script.takeaway)
            .bind(Utc::now())
            .bind(ProjectStatus::Draft)
            .fetch_optional(pool)
            .await
    }

    /// Move a project to `to` if it is currently in one of `from`.
    ///
    /// `error_message` replaces the stored message (pass `None` to clear it).
    /// Returns `None` when the project is missing or in another state.
    pub async fn transition(
        pool: &DbPool,
        id: DbId,
        from: &[ProjectStatus],
        to: ProjectStatus,
        error_message: Option<&str>,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        if from.is_empty() {
            return Ok(None);
        }
        let query = format!(
            "UPDATE video_projects SET
                status = ?1,
                error_message = ?2,
                updated_at = ?3
             WHERE id = ?4 AND status IN ({})
             RETURNING {COLUMNS}",
            placeholders(5, from.len())
        );
        let mut q = sqlx::query_as::<_, VideoProject>(&query)
            .bind(to)
            .bind(error_message)
            .bind(Utc::now())
            .bind(id);
        for status in from {
            q = q.bind(*status);
        }
        q.fetch_optional(pool).await
    }

    /// DRAFT to APPROVED, recording the reviewer.
    pub async fn approve(
        pool: &DbPool,
        id: DbId,
        reviewed_by: Option<&str>,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        let query = format!(
            "UPDATE video_projects SET
                status = ?2,
                error_message = NULL,
                reviewed_at = ?3,
                reviewed_by = ?4,
                updated_at = ?3
             WHERE id = ?1 AND status = ?5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(id)
            .bind(ProjectStatus::Approved)
            .bind(Utc::now())
            .bind(reviewed_by)
            .bind(ProjectStatus::Draft)
            .fetch_optional(pool)
            .await
    }

    /// APPROVED to AUDIO_READY with the combined voiceover path.
    pub async fn set_voiceover(
        pool: &DbPool,
        id: DbId,
        voiceover_path: &str,
        duration_seconds: f64,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        let query = format!(
            "UPDATE video_projects SET
                status = ?2,
                voiceover_path = ?3,
                duration_seconds = ?4,
                error_message = NULL,
                updated_at = ?5
             WHERE id = ?1 AND status = ?6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(id)
            .bind(ProjectStatus::AudioReady)
            .bind(voiceover_path)
            .bind(duration_seconds)
            .bind(Utc::now())
            .bind(ProjectStatus::Approved)
            .fetch_optional(pool)
            .await
    }

    /// RENDERING to COMPLETED with the output file and its duration.
    pub async fn set_output(
        pool: &DbPool,
        id: DbId,
        output_path: &str,
        duration_seconds: f64,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        let query = format!(
            "UPDATE video_projects SET
                status = ?2,
                output_path = ?3,
                duration_seconds = ?4,
                error_message = NULL,
                updated_at = ?5
             WHERE id = ?1 AND status = ?6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoProject>(&query)
            .bind(id)
            .bind(ProjectStatus::Completed)
            .bind(output_path)
            .bind(duration_seconds)
            .bind(Utc::now())
            .bind(ProjectStatus::Rendering)
            .fetch_optional(pool)
            .await
    }

    /// Move any non-terminal project to FAILED with a message.
    pub async fn mark_failed(
        pool: &DbPool,
        id: DbId,
        message: &str,
    ) -> Result<Option<VideoProject>, sqlx::Error> {
        Self::transition(
            pool,
            id,
            &ProjectStatus::predecessors(ProjectStatus::Failed),
            ProjectStatus::Failed,
            Some(message),
        )
        .await
    }

    /// Delete a project and, by cascade, its scenes.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM video_projects WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(5, 3), "?5, ?6, ?7");
        assert_eq!(placeholders(1, 1), "?1");
    }
}
