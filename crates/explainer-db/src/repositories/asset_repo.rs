//! Repository for the `background_assets` and `music_assets` tables.

use chrono::Utc;
use explainer_models::ContextStyle;

use crate::models::{BackgroundAsset, CreateBackgroundAsset, CreateMusicAsset, DbId, MusicAsset};
use crate::DbPool;

const BACKGROUND_COLUMNS: &str = "id, name, context_style, file_path, file_size_bytes, created_at";

const MUSIC_COLUMNS: &str =
    "id, name, context_style, file_path, file_size_bytes, duration_seconds, created_at";

/// CRUD for shared backgrounds and music.
pub struct AssetRepo;

impl AssetRepo {
    pub async fn create_background(
        pool: &DbPool,
        input: &CreateBackgroundAsset,
    ) -> Result<BackgroundAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO background_assets (name, context_style, file_path, file_size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {BACKGROUND_COLUMNS}"
        );
        sqlx::query_as::<_, BackgroundAsset>(&query)
            .bind(&input.name)
            .bind(input.context_style)
            .bind(&input.file_path)
            .bind(input.file_size_bytes)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_background(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<BackgroundAsset>, sqlx::Error> {
        let query = format!("SELECT {BACKGROUND_COLUMNS} FROM background_assets WHERE id = ?1");
        sqlx::query_as::<_, BackgroundAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List backgrounds, newest first. A style filter also keeps
    /// style-agnostic rows.
    pub async fn list_backgrounds(
        pool: &DbPool,
        style: Option<ContextStyle>,
    ) -> Result<Vec<BackgroundAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {BACKGROUND_COLUMNS} FROM background_assets
             WHERE ?1 IS NULL OR context_style = ?1 OR context_style IS NULL
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, BackgroundAsset>(&query)
            .bind(style)
            .fetch_all(pool)
            .await
    }

    /// Pick a background for a style: an exact style match first, then any.
    pub async fn pick_background(
        pool: &DbPool,
        style: ContextStyle,
    ) -> Result<Option<BackgroundAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {BACKGROUND_COLUMNS} FROM background_assets
             ORDER BY CASE WHEN context_style = ?1 THEN 0 ELSE 1 END, id ASC
             LIMIT 1"
        );
        sqlx::query_as::<_, BackgroundAsset>(&query)
            .bind(style)
            .fetch_optional(pool)
            .await
    }

    /// Delete a background, returning it so the caller can remove the file.
    pub async fn delete_background(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<BackgroundAsset>, sqlx::Error> {
        let query =
            format!("DELETE FROM background_assets WHERE id = ?1 RETURNING {BACKGROUND_COLUMNS}");
        sqlx::query_as::<_, BackgroundAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_music(
        pool: &DbPool,
        input: &CreateMusicAsset,
    ) -> Result<MusicAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO music_assets
                (name, context_style, file_path, file_size_bytes, duration_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {MUSIC_COLUMNS}"
        );
        sqlx::query_as::<_, MusicAsset>(&query)
            .bind(&input.name)
            .bind(input.context_style)
            .bind(&input.file_path)
            .bind(input.file_size_bytes)
            .bind(input.duration_seconds)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_music(pool: &DbPool, id: DbId) -> Result<Option<MusicAsset>, sqlx::Error> {
        let query = format!("SELECT {MUSIC_COLUMNS} FROM music_assets WHERE id = ?1");
        sqlx::query_as::<_, MusicAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_music(
        pool: &DbPool,
        style: Option<ContextStyle>,
    ) -> Result<Vec<MusicAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {MUSIC_COLUMNS} FROM music_assets
             WHERE ?1 IS NULL OR context_style = ?1 OR context_style IS NULL
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, MusicAsset>(&query)
            .bind(style)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_music(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<MusicAsset>, sqlx::Error> {
        let query = format!("DELETE FROM music_assets WHERE id = ?1 RETURNING {MUSIC_COLUMNS}");
        sqlx::query_as::<_, MusicAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
