//! Compositing a dialogue video.
//!
//! One FFmpeg pass draws the background, characters and captions and muxes
//! the voiceover (optionally mixed with music) into the output file.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use explainer_models::{
    AudioSegment, Canvas, DialogueScript, OutputEncoding, RenderResult, RenderStyle,
};
use tracing::info;

use crate::assets::CharacterAssetSet;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraph, AUDIO_SINK, VIDEO_SINK};
use crate::input::InputPlan;
use crate::probe::probe_duration;
use crate::styles::{create_overlay, overlay_characters, CharacterOverlay, EndCondition};
use crate::timing::compute_windows;
use crate::tools::MediaTools;

/// Volume applied to background music under the voiceover.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.15;

/// Everything needed to render one project.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub script: DialogueScript,
    pub background: PathBuf,
    pub voiceover: PathBuf,
    pub music: Option<PathBuf>,
    pub characters: CharacterAssetSet,
    /// Per-line audio, when the voiceover step produced it
    pub segments: Option<Vec<AudioSegment>>,
    pub output: PathBuf,
}

/// Renderer configured with one overlay strategy.
pub struct Renderer {
    tools: MediaTools,
    canvas: Canvas,
    encoding: OutputEncoding,
    overlay: Box<dyn CharacterOverlay>,
    font_file: Option<String>,
    music_volume: f64,
    timeout_secs: Option<u64>,
}

impl Renderer {
    pub fn new(tools: MediaTools, style: RenderStyle) -> Self {
        Self {
            tools,
            canvas: Canvas::default(),
            encoding: OutputEncoding::default(),
            overlay: create_overlay(style),
            font_file: None,
            music_volume: DEFAULT_MUSIC_VOLUME,
            timeout_secs: None,
        }
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_font_file(mut self, font_file: Option<String>) -> Self {
        self.font_file = font_file;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn style(&self) -> RenderStyle {
        self.overlay.style()
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn tools(&self) -> &MediaTools {
        &self.tools
    }

    /// Build the full FFmpeg command for a request.
    ///
    /// Inputs are declared in this order: background, voiceover, the pose
    /// images the overlay strategy uses, then music.
    pub fn assemble(&self, request: &RenderRequest, total_duration: f64) -> MediaResult<FfmpegCommand> {
        let (windows, mode) = compute_windows(
            &request.script.lines,
            total_duration,
            request.segments.as_deref(),
        )?;

        let mut plan = InputPlan::new();
        let background = plan.looped_image(&request.background);
        let voiceover = plan.media(&request.voiceover);

        let mut graph = FilterGraph::with_background(background, self.canvas);
        if self.overlay.style().uses_characters() {
            overlay_characters(
                self.overlay.as_ref(),
                &request.characters,
                &windows,
                self.canvas,
                &mut plan,
                &mut graph,
            );
        }

        let captions = self
            .overlay
            .caption_style()
            .with_font_file(self.font_file.clone());
        graph.captions(&request.script.lines, &windows, &captions, self.canvas);

        let audio_map = match &request.music {
            Some(music) => {
                let music = plan.media(music);
                graph.mix_music(voiceover, music, self.music_volume);
                format!("[{AUDIO_SINK}]")
            }
            None => voiceover.audio_map(),
        };

        info!(
            style = %self.overlay.style(),
            timing = ?mode,
            inputs = plan.len(),
            lines = windows.len(),
            "Assembled render command"
        );

        let cmd = FfmpegCommand::new(plan, &request.output)
            .filter_complex(graph.finish())
            .map(format!("[{VIDEO_SINK}]"))
            .map(audio_map)
            .encoding(&self.encoding)
            .frame_rate(self.canvas.fps);

        Ok(match self.overlay.end_condition() {
            EndCondition::Shortest => cmd.shortest(),
            EndCondition::DurationCap => cmd.duration(total_duration),
        })
    }

    /// Render a request and describe the produced file.
    ///
    /// `on_progress` receives the completed percentage of the narration.
    pub async fn render<F>(&self, request: &RenderRequest, on_progress: F) -> MediaResult<RenderResult>
    where
        F: Fn(f64) + Send + 'static,
    {
        let started = Instant::now();
        for path in [&request.background, &request.voiceover]
            .into_iter()
            .chain(request.music.as_ref())
        {
            if !path.is_file() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
        }
        if let Some(parent) = request.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let total = probe_duration(&self.tools.ffprobe, &request.voiceover).await?;
        let cmd = self.assemble(request, total)?;

        let total_ms = (total * 1000.0) as i64;
        FfmpegRunner::new(&self.tools.ffmpeg)
            .with_timeout(self.timeout_secs)
            .run_with_progress(&cmd, move |progress| {
                on_progress(progress.percentage(total_ms))
            })
            .await?;

        let file_size_bytes = tokio::fs::metadata(&request.output).await?.len();
        let duration_seconds = probe_duration(&self.tools.ffprobe, &request.output).await?;

        let elapsed = started.elapsed().as_secs_f64();
        metrics::histogram!("explainer_render_duration_seconds", "style" => self.overlay.style().as_str())
            .record(elapsed);
        info!(
            output = %request.output.display(),
            duration_seconds,
            file_size_bytes,
            elapsed_secs = elapsed,
            "Render complete"
        );

        Ok(RenderResult {
            output_path: request.output.clone(),
            duration_seconds,
            width: self.canvas.width,
            height: self.canvas.height,
            file_size_bytes,
            rendered_at: Utc::now(),
        })
    }
}
