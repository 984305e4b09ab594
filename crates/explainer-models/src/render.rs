//! Render styles and results.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How characters are drawn on top of the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    /// Captions only, no character images
    TextOnly,
    /// Swap between an idle and a talking pose while a role speaks
    #[default]
    PoseSwitch,
    /// Single pose with idle bobbing and livelier motion while speaking
    Animated,
    /// Mouth open/closed poses toggled rapidly while speaking
    LipSync,
}

impl RenderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStyle::TextOnly => "text_only",
            RenderStyle::PoseSwitch => "pose_switch",
            RenderStyle::Animated => "animated",
            RenderStyle::LipSync => "lip_sync",
        }
    }

    /// Whether this style draws character images at all.
    pub fn uses_characters(&self) -> bool {
        !matches!(self, RenderStyle::TextOnly)
    }
}

impl std::fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RenderStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "text_only" | "text" => Ok(RenderStyle::TextOnly),
            "pose_switch" | "ffmpeg" => Ok(RenderStyle::PoseSwitch),
            "animated" => Ok(RenderStyle::Animated),
            "lip_sync" | "lipsync" => Ok(RenderStyle::LipSync),
            other => Err(ModelError::unknown("render style", other)),
        }
    }
}

/// Result of a finished render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub output_path: PathBuf,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
    pub rendered_at: DateTime<Utc>,
}
