//! Background and music asset models.

use explainer_models::ContextStyle;
use serde::Serialize;
use sqlx::FromRow;

use super::{DbId, Timestamp};

/// A row from the `background_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackgroundAsset {
    pub id: DbId,
    pub name: String,
    /// `None` means usable with any style.
    pub context_style: Option<ContextStyle>,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateBackgroundAsset {
    pub name: String,
    pub context_style: Option<ContextStyle>,
    pub file_path: String,
    pub file_size_bytes: i64,
}

/// A row from the `music_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MusicAsset {
    pub id: DbId,
    pub name: String,
    pub context_style: Option<ContextStyle>,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub duration_seconds: Option<f64>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMusicAsset {
    pub name: String,
    pub context_style: Option<ContextStyle>,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub duration_seconds: Option<f64>,
}
