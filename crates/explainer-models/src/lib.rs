//! Shared data models for the explainer video backend.
//!
//! This crate provides Serde-serializable types for:
//! - Dialogue roles, context styles and project workflow status
//! - Dialogue scripts and their lines
//! - Timing windows and synthesized audio segments
//! - Render results, render styles and output encoding

pub mod encoding;
pub mod error;
pub mod render;
pub mod role;
pub mod script;
pub mod status;
pub mod timing;

// Re-export common types
pub use encoding::{Canvas, OutputEncoding};
pub use error::{ModelError, ModelResult};
pub use render::{RenderResult, RenderStyle};
pub use role::{CharacterRole, ContextStyle};
pub use script::{DialogueLine, DialogueScript, DEFAULT_POSE, DEFAULT_TARGET_DURATION_SECS};
pub use status::ProjectStatus;
pub use timing::{AudioSegment, TimingWindow, VoiceoverResult};
