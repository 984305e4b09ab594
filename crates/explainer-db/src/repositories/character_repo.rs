//! Repository for the `characters` and `character_assets` tables.

use chrono::Utc;
use explainer_models::CharacterRole;

use crate::models::{
    Character, CharacterAsset, CreateCharacter, CreateCharacterAsset, DbId, UpdateCharacter,
};
use crate::DbPool;

const COLUMNS: &str = "id, name, role, is_active, created_at, updated_at";

const ASSET_COLUMNS: &str = "id, character_id, pose, file_path, file_size_bytes, created_at";

/// CRUD for characters and their pose images.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new active character, returning the created row.
    pub async fn create(pool: &DbPool, input: &CreateCharacter) -> Result<Character, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO characters (name, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(&input.name)
            .bind(input.role)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = ?1");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List characters ordered by name, optionally narrowed to one role.
    pub async fn list(
        pool: &DbPool,
        role: Option<CharacterRole>,
        active_only: bool,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters
             WHERE (?1 IS NULL OR role = ?1) AND (?2 = 0 OR is_active = 1)
             ORDER BY name ASC, id ASC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(role)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    /// Update a character. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &DbPool,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                name = COALESCE(?2, name),
                role = COALESCE(?3, role),
                is_active = COALESCE(?4, is_active),
                updated_at = ?5
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.role)
            .bind(input.is_active)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Delete a character and, by cascade, its pose rows.
    ///
    /// Fails with a foreign key violation while any project references it.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM characters WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a pose image, replacing any earlier upload for the same pose.
    pub async fn upsert_asset(
        pool: &DbPool,
        input: &CreateCharacterAsset,
    ) -> Result<CharacterAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO character_assets (character_id, pose, file_path, file_size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (character_id, pose) DO UPDATE SET
                file_path = excluded.file_path,
                file_size_bytes = excluded.file_size_bytes,
                created_at = excluded.created_at
             RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, CharacterAsset>(&query)
            .bind(input.character_id)
            .bind(&input.pose)
            .bind(&input.file_path)
            .bind(input.file_size_bytes)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn list_assets(
        pool: &DbPool,
        character_id: DbId,
    ) -> Result<Vec<CharacterAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM character_assets
             WHERE character_id = ?1
             ORDER BY pose ASC"
        );
        sqlx::query_as::<_, CharacterAsset>(&query)
            .bind(character_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_asset(
        pool: &DbPool,
        character_id: DbId,
        asset_id: DbId,
    ) -> Result<Option<CharacterAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM character_assets WHERE id = ?1 AND character_id = ?2"
        );
        sqlx::query_as::<_, CharacterAsset>(&query)
            .bind(asset_id)
            .bind(character_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a pose row, returning it so the caller can remove the file.
    pub async fn delete_asset(
        pool: &DbPool,
        character_id: DbId,
        asset_id: DbId,
    ) -> Result<Option<CharacterAsset>, sqlx::Error> {
        let query = format!(
            "DELETE FROM character_assets WHERE id = ?1 AND character_id = ?2
             RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, CharacterAsset>(&query)
            .bind(asset_id)
            .bind(character_id)
            .fetch_optional(pool)
            .await
    }
}
