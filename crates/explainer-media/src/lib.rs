//! FFmpeg wrapper and filter-graph builder for explainer videos.
//!
//! This crate provides:
//! - Dialogue timing (proportional or measured per line)
//! - Caption escaping and word wrap
//! - A filter-graph builder with pluggable character overlay strategies
//! - Command assembly with a single input index counter
//! - Process execution with captured stderr, and duration probing

pub mod assets;
pub mod command;
pub mod concat;
pub mod error;
pub mod graph;
pub mod input;
pub mod probe;
pub mod progress;
pub mod render;
pub mod styles;
pub mod text;
pub mod timing;
pub mod tools;

pub use assets::{CharacterAssetSet, PoseSet};
pub use command::{FfmpegCommand, FfmpegRunner};
pub use concat::concat_audio;
pub use error::{MediaError, MediaResult};
pub use graph::{CaptionStyle, FilterGraph, SpeakingCondition};
pub use input::{InputIndex, InputPlan};
pub use probe::probe_duration;
pub use progress::FfmpegProgress;
pub use render::{RenderRequest, Renderer};
pub use styles::{create_overlay, CharacterOverlay};
pub use timing::{compute_windows, TimingMode};
pub use tools::MediaTools;
