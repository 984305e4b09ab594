//! Character entity model and DTOs.

use explainer_models::CharacterRole;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{DbId, Timestamp};

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub name: String,
    pub role: CharacterRole,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacter {
    pub name: String,
    pub role: CharacterRole,
}

/// DTO for updating an existing character. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub role: Option<CharacterRole>,
    pub is_active: Option<bool>,
}

/// A pose image row from the `character_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CharacterAsset {
    pub id: DbId,
    pub character_id: DbId,
    pub pose: String,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub created_at: Timestamp,
}

/// DTO for recording an uploaded pose image.
#[derive(Debug, Clone)]
pub struct CreateCharacterAsset {
    pub character_id: DbId,
    pub pose: String,
    pub file_path: String,
    pub file_size_bytes: i64,
}
