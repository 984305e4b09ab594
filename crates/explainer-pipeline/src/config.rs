//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use explainer_models::{Canvas, RenderStyle};
use tracing::warn;

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_QUESTIONER_VOICE: &str = "JBFqnCBsd6RMkjVDRZzb";
pub const DEFAULT_EXPLAINER_VOICE: &str = "EXAVITQu4vr4xnSDxMaL";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Claude API key; script generation is disabled without it
    pub claude_api_key: Option<String>,
    pub claude_model: String,
    pub claude_base_url: String,
    /// ElevenLabs API key; voiceover is disabled without it
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_model: String,
    pub elevenlabs_base_url: String,
    /// Default voice for the questioner role
    pub questioner_voice: String,
    /// Default voice for the explainer role
    pub explainer_voice: String,
    /// Root of uploaded characters, backgrounds and music
    pub assets_dir: PathBuf,
    /// Root of generated voiceovers and videos
    pub projects_dir: PathBuf,
    pub canvas: Canvas,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub render_style: RenderStyle,
    /// Kill a render that runs longer than this
    pub render_timeout_secs: Option<u64>,
    /// Font used for captions; FFmpeg's default when unset
    pub font_file: Option<String>,
    /// Timeout for calls to Claude and ElevenLabs
    pub http_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            claude_api_key: None,
            claude_model: DEFAULT_CLAUDE_MODEL.to_string(),
            claude_base_url: DEFAULT_CLAUDE_BASE_URL.to_string(),
            elevenlabs_api_key: None,
            elevenlabs_model: DEFAULT_ELEVENLABS_MODEL.to_string(),
            elevenlabs_base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            questioner_voice: DEFAULT_QUESTIONER_VOICE.to_string(),
            explainer_voice: DEFAULT_EXPLAINER_VOICE.to_string(),
            assets_dir: PathBuf::from("data/assets"),
            projects_dir: PathBuf::from("data/projects"),
            canvas: Canvas::default(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            render_style: RenderStyle::default(),
            render_timeout_secs: None,
            font_file: None,
            http_timeout: Duration::from_secs(120),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let canvas = Canvas {
            width: std::env::var("VIDEO_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.canvas.width),
            height: std::env::var("VIDEO_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.canvas.height),
            fps: std::env::var("VIDEO_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.canvas.fps),
        };

        let render_style = match std::env::var("VIDEO_RENDER_STYLE") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Unknown VIDEO_RENDER_STYLE '{}', using {}", raw, defaults.render_style);
                defaults.render_style
            }),
            Err(_) => defaults.render_style,
        };

        Self {
            claude_api_key: non_empty_var("CLAUDE_API_KEY"),
            claude_model: std::env::var("CLAUDE_MODEL").unwrap_or(defaults.claude_model),
            claude_base_url: std::env::var("CLAUDE_BASE_URL").unwrap_or(defaults.claude_base_url),
            elevenlabs_api_key: non_empty_var("ELEVENLABS_API_KEY"),
            elevenlabs_model: std::env::var("ELEVENLABS_MODEL").unwrap_or(defaults.elevenlabs_model),
            elevenlabs_base_url: std::env::var("ELEVENLABS_BASE_URL")
                .unwrap_or(defaults.elevenlabs_base_url),
            questioner_voice: std::env::var("ELEVENLABS_QUESTIONER_VOICE")
                .unwrap_or(defaults.questioner_voice),
            explainer_voice: std::env::var("ELEVENLABS_EXPLAINER_VOICE")
                .unwrap_or(defaults.explainer_voice),
            assets_dir: std::env::var("VIDEO_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            projects_dir: std::env::var("VIDEO_PROJECTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_dir),
            canvas,
            ffmpeg_path: std::env::var("VIDEO_FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("VIDEO_FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            render_style,
            render_timeout_secs: std::env::var("VIDEO_RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            font_file: non_empty_var("VIDEO_FONT_FILE"),
            http_timeout: Duration::from_secs(
                std::env::var("PIPELINE_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    pub fn voiceovers_dir(&self, project_id: i64) -> PathBuf {
        self.projects_dir.join("voiceovers").join(project_id.to_string())
    }

    pub fn video_path(&self, project_id: i64) -> PathBuf {
        self.projects_dir
            .join("videos")
            .join(format!("project_{project_id}.mp4"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
