use explainer_models::{Canvas, DialogueLine, TimingWindow};

use crate::text::{escape_drawtext, escape_filter_path, wrap_caption};

/// Format seconds for use inside filter expressions.
pub fn fmt_time(seconds: f64) -> String {
    format!("{seconds:.3}")
}

/// Solid box drawn behind the caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub height: u32,
    /// FFmpeg color, e.g. `black@0.6`
    pub color: String,
}

/// How captions look for one overlay strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub wrap_width: usize,
    pub name_font_size: u32,
    pub body_font_size: u32,
    pub name_color: String,
    pub body_color: String,
    /// Distance of the speaker label from the bottom edge
    pub name_offset: u32,
    /// Distance of the body text from the bottom edge
    pub body_offset: u32,
    pub line_spacing: u32,
    pub fade_in_secs: f64,
    pub backdrop: Option<Backdrop>,
    pub font_file: Option<String>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            wrap_width: 40,
            name_font_size: 32,
            body_font_size: 36,
            name_color: "yellow".to_string(),
            body_color: "white".to_string(),
            name_offset: 280,
            body_offset: 220,
            line_spacing: 8,
            fade_in_secs: 0.3,
            backdrop: None,
            font_file: None,
        }
    }
}

impl CaptionStyle {
    pub fn with_font_file(mut self, font_file: Option<String>) -> Self {
        self.font_file = font_file;
        self
    }

    /// Filter chain drawing one line's caption during its window.
    pub fn chain(&self, line: &DialogueLine, window: &TimingWindow, canvas: Canvas) -> String {
        let (start, end) = (fmt_time(window.start), fmt_time(window.end));
        let enable = format!("enable='between(t,{start},{end})'");
        let alpha = if self.fade_in_secs > 0.0 {
            let fade = fmt_time(self.fade_in_secs);
            format!(":alpha='if(lt(t-{start},{fade}),(t-{start})/{fade},1)'")
        } else {
            String::new()
        };
        let font = self
            .font_file
            .as_deref()
            .map(|path| format!("fontfile='{}':", escape_filter_path(path)))
            .unwrap_or_default();

        let mut filters = Vec::with_capacity(3);
        if let Some(backdrop) = &self.backdrop {
            filters.push(format!(
                "drawbox=x=0:y={}:w={}:h={}:color={}:t=fill:{enable}",
                canvas.height.saturating_sub(backdrop.height),
                canvas.width,
                backdrop.height,
                backdrop.color
            ));
        }
        filters.push(format!(
            "drawtext={font}text='{}':fontsize={}:fontcolor={}:x=(w-text_w)/2:y=h-{}:{enable}{alpha}",
            escape_drawtext(&format!("{}:", line.speaker_name)),
            self.name_font_size,
            self.name_color,
            self.name_offset,
        ));
        filters.push(format!(
            "drawtext={font}text='{}':fontsize={}:fontcolor={}:line_spacing={}:x=(w-text_w)/2:y=h-{}:{enable}{alpha}",
            escape_drawtext(&wrap_caption(&line.text, self.wrap_width)),
            self.body_font_size,
            self.body_color,
            self.line_spacing,
            self.body_offset,
        ));
        filters.join(",")
    }
}
