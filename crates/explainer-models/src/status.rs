//! Project workflow status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Workflow status of a video project.
///
/// The main line is `Draft -> Approved -> AudioReady -> Rendering -> Completed`.
/// `Failed` is reachable from every non-terminal status, and a project can be
/// sent back to `Draft` for review until rendering starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Script generated (or being generated), awaiting review
    #[default]
    Draft,
    /// Script approved, voiceover pending
    Approved,
    /// Voiceover synthesized, ready to render
    AudioReady,
    /// Compositor running
    Rendering,
    /// Video rendered
    Completed,
    /// A background step failed; see the project's error message
    Failed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::Draft,
        ProjectStatus::Approved,
        ProjectStatus::AudioReady,
        ProjectStatus::Rendering,
        ProjectStatus::Completed,
        ProjectStatus::Failed,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Approved => "approved",
            ProjectStatus::AudioReady => "audio_ready",
            ProjectStatus::Rendering => "rendering",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Failed)
    }

    /// Whether the script may still be edited or regenerated.
    pub fn script_editable(&self) -> bool {
        matches!(self, ProjectStatus::Draft | ProjectStatus::Failed)
    }

    /// Check whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        match (*self, next) {
            (Draft, Approved)
            | (Approved, AudioReady)
            | (AudioReady, Rendering)
            | (Rendering, Completed) => true,
            (Draft | Approved | AudioReady | Failed, Draft) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    /// All statuses from which `next` can be reached in one step.
    pub fn predecessors(next: ProjectStatus) -> Vec<ProjectStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ModelError::unknown("project status", normalized))
    }
}
