//! Repository for the `video_scenes` table.

use explainer_models::{AudioSegment, DialogueLine};

use crate::models::{DbId, VideoScene};
use crate::DbPool;

const COLUMNS: &str = "id, project_id, scene_number, speaker_role, speaker_name, line, pose, \
     voiceover_path, start_time, duration_seconds";

/// Scene rows mirror the script's lines, one per `scene_number`.
pub struct SceneRepo;

impl SceneRepo {
    /// Replace all scenes of a project with rows for `lines`, atomically.
    pub async fn replace_for_project(
        pool: &DbPool,
        project_id: DbId,
        lines: &[DialogueLine],
    ) -> Result<Vec<VideoScene>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM video_scenes WHERE project_id = ?1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO video_scenes (project_id, scene_number, speaker_role, speaker_name, line, pose)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {COLUMNS}"
        );
        let mut scenes = Vec::with_capacity(lines.len());
        for line in lines {
            let scene = sqlx::query_as::<_, VideoScene>(&query)
                .bind(project_id)
                .bind(i64::from(line.scene_number))
                .bind(line.speaker_role)
                .bind(&line.speaker_name)
                .bind(&line.text)
                .bind(&line.pose)
                .fetch_one(&mut *tx)
                .await?;
            scenes.push(scene);
        }

        tx.commit().await?;
        Ok(scenes)
    }

    /// Scenes of a project in script order.
    pub async fn list_for_project(
        pool: &DbPool,
        project_id: DbId,
    ) -> Result<Vec<VideoScene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_scenes WHERE project_id = ?1 ORDER BY scene_number ASC"
        );
        sqlx::query_as::<_, VideoScene>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Record the measured clip for each scene. Segments without a matching
    /// scene are skipped; returns how many rows were updated.
    pub async fn update_audio(
        pool: &DbPool,
        project_id: DbId,
        segments: &[AudioSegment],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut updated = 0;
        for segment in segments {
            let result = sqlx::query(
                "UPDATE video_scenes SET
                    voiceover_path = ?3,
                    start_time = ?4,
                    duration_seconds = ?5
                 WHERE project_id = ?1 AND scene_number = ?2",
            )
            .bind(project_id)
            .bind(i64::from(segment.scene_number))
            .bind(segment.file_path.to_string_lossy().into_owned())
            .bind(segment.start_time)
            .bind(segment.duration_seconds)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;
        Ok(updated)
    }
}
