//! Filter-graph construction.
//!
//! A [`FilterGraph`] is a flat list of `;`-separated stages that threads one
//! "current" video stream from the background through every overlay and
//! caption, then relabels it to a fixed sink pad the command maps.

mod caption;
mod speaking;

pub use caption::{fmt_time, Backdrop, CaptionStyle};
pub use speaking::SpeakingCondition;

use explainer_models::{Canvas, DialogueLine, TimingWindow};

use crate::input::InputIndex;

/// Sink pad the final video stage writes to.
pub const VIDEO_SINK: &str = "outv";
/// Sink pad for mixed audio, when music is present.
pub const AUDIO_SINK: &str = "outa";

/// Label of the scaled and padded background.
const BACKGROUND_LABEL: &str = "bg";

/// Builder for a `-filter_complex` graph.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    stages: Vec<String>,
    current: String,
    next_label: usize,
}

impl FilterGraph {
    /// Start a graph with the background scaled to fit and padded to the canvas.
    pub fn with_background(background: InputIndex, canvas: Canvas) -> Self {
        let (w, h) = (canvas.width, canvas.height);
        let stage = format!(
            "{}scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2[{BACKGROUND_LABEL}]",
            background.video()
        );
        Self {
            stages: vec![stage],
            current: BACKGROUND_LABEL.to_string(),
            next_label: 0,
        }
    }

    /// Label of the stream the next stage consumes.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// Scale a pose image to `height` with alpha kept. Returns its label.
    pub fn prepare_image(&mut self, input: InputIndex, height: u32, name: &str) -> String {
        let label = format!("img_{name}");
        self.stages.push(format!(
            "{}scale=-1:{height}:flags=lanczos,format=rgba[{label}]",
            input.video()
        ));
        label
    }

    /// Overlay a prepared image on the current stream.
    ///
    /// `x` and `y` are overlay expressions, evaluated per frame. When `enable`
    /// is given the overlay is only drawn while it is non-zero.
    pub fn overlay(&mut self, image: &str, x: &str, y: &str, enable: Option<&str>) {
        let out = self.fresh_label("ov");
        let enable = enable
            .map(|e| format!(":enable='{e}'"))
            .unwrap_or_default();
        self.stages.push(format!(
            "[{}][{image}]overlay=x='{x}':y='{y}':format=auto{enable}[{out}]",
            self.current
        ));
        self.current = out;
    }

    /// Apply a comma-separated filter chain to the current stream.
    pub fn apply(&mut self, chain: &str) {
        let out = self.fresh_label("v");
        self.stages.push(format!("[{}]{chain}[{out}]", self.current));
        self.current = out;
    }

    /// Add one caption stage per line.
    pub fn captions(
        &mut self,
        lines: &[DialogueLine],
        windows: &[TimingWindow],
        style: &CaptionStyle,
        canvas: Canvas,
    ) {
        for (line, window) in lines.iter().zip(windows) {
            let chain = style.chain(line, window, canvas);
            self.apply(&chain);
        }
    }

    /// Mix background music under the voiceover into [`AUDIO_SINK`].
    pub fn mix_music(&mut self, voiceover: InputIndex, music: InputIndex, volume: f64) {
        self.stages.push(format!(
            "{}volume={volume:.2}[music];{}[music]amix=inputs=2:duration=first:dropout_transition=0[{AUDIO_SINK}]",
            music.audio(),
            voiceover.audio()
        ));
    }

    /// Relabel the current stream to [`VIDEO_SINK`] and render the graph text.
    pub fn finish(mut self) -> String {
        self.stages
            .push(format!("[{}]null[{VIDEO_SINK}]", self.current));
        self.stages.join(";")
    }
}
