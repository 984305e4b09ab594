//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An external service has no credentials configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// The project is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    /// Another background task already owns the project.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Script generation failed: {0}")]
    ScriptGeneration(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Media error: {0}")]
    Media(#[from] explainer_media::MediaError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn script_generation(msg: impl Into<String>) -> Self {
        Self::ScriptGeneration(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// Failed tasks are not retried automatically; this only tells the user
    /// whether trying again (regenerate, re-approve, re-render) is worth it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Http(_)
                | PipelineError::ScriptGeneration(_)
                | PipelineError::Synthesis(_)
                | PipelineError::Media(explainer_media::MediaError::Timeout(_))
        )
    }

    /// Message stored on a failed project. FFmpeg failures carry their
    /// stderr so the cause is visible without server logs.
    pub fn project_message(&self) -> String {
        match self {
            PipelineError::Media(media) => media.diagnostic(),
            other => other.to_string(),
        }
    }
}
