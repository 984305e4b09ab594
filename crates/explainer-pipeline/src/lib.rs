//! Explainer video pipeline.
//!
//! Turns a topic into a finished vertical video in three background steps,
//! each gated by a human-visible project status:
//! - script generation (Claude) leaves the project in DRAFT for review
//! - voiceover synthesis (ElevenLabs) moves APPROVED to AUDIO_READY
//! - rendering (FFmpeg) moves RENDERING to COMPLETED

pub mod assets;
pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod script_generator;
pub mod voiceover;

pub use assets::AssetStore;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use locks::{ProjectLockGuard, ProjectLocks};
pub use logging::JobLogger;
pub use pipeline::{JobHandle, VideoPipeline};
pub use script_generator::{ClaudeScriptGenerator, ScriptGenerator, ScriptRequest, TopicSuggestion};
pub use voiceover::{ElevenLabsClient, SpeechSynthesizer, Voice, VoiceSettings, VoiceoverService};
