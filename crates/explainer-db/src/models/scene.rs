//! Per-line scene rows.

use std::path::PathBuf;

use explainer_models::{AudioSegment, CharacterRole};
use serde::Serialize;
use sqlx::FromRow;

use super::DbId;

/// A row from the `video_scenes` table. One per dialogue line.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoScene {
    pub id: DbId,
    pub project_id: DbId,
    pub scene_number: i64,
    pub speaker_role: CharacterRole,
    pub speaker_name: String,
    pub line: String,
    pub pose: String,
    pub voiceover_path: Option<String>,
    pub start_time: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl VideoScene {
    /// The measured clip for this scene, if audio has been produced.
    pub fn audio_segment(&self) -> Option<AudioSegment> {
        Some(AudioSegment {
            scene_number: u32::try_from(self.scene_number).ok()?,
            speaker_role: self.speaker_role,
            file_path: PathBuf::from(self.voiceover_path.as_ref()?),
            duration_seconds: self.duration_seconds?,
            start_time: self.start_time?,
        })
    }
}
