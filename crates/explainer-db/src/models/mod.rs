//! Row structs and DTOs, one module per table group.

pub mod asset;
pub mod character;
pub mod project;
pub mod scene;

pub use asset::{BackgroundAsset, CreateBackgroundAsset, CreateMusicAsset, MusicAsset};
pub use character::{
    Character, CharacterAsset, CreateCharacter, CreateCharacterAsset, UpdateCharacter,
};
pub use project::{CreateVideoProject, ProjectFilter, VideoProject};
pub use scene::VideoScene;

/// Primary key type for every table.
pub type DbId = i64;

/// Timestamp type stored in TEXT columns.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
