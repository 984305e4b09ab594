//! Input declarations and stream indices.
//!
//! FFmpeg numbers inputs in declaration order and the filter graph refers to
//! them by that number. [`InputPlan`] is the only place indices are handed
//! out: every `-i` is pushed through it and the returned [`InputIndex`] is what
//! the graph uses, so the two cannot drift apart.

use std::fmt;
use std::path::{Path, PathBuf};

/// Position of an input in the command's `-i` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputIndex(usize);

impl InputIndex {
    pub fn get(self) -> usize {
        self.0
    }

    /// Filter-graph pad for the input's video stream, e.g. `[2:v]`.
    pub fn video(self) -> String {
        format!("[{}:v]", self.0)
    }

    /// Filter-graph pad for the input's audio stream, e.g. `[1:a]`.
    pub fn audio(self) -> String {
        format!("[{}:a]", self.0)
    }

    /// Stream specifier for `-map`, e.g. `1:a`.
    pub fn audio_map(self) -> String {
        format!("{}:a", self.0)
    }
}

impl fmt::Display for InputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of media an input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Still image repeated for the whole output (`-loop 1`)
    LoopedImage,
    /// Audio or video file read as is
    Media,
    /// Concat demuxer list file
    ConcatList,
}

/// One declared input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInput {
    pub kind: InputKind,
    pub path: PathBuf,
}

impl MediaInput {
    fn to_args(&self) -> Vec<String> {
        let mut args = match self.kind {
            InputKind::LoopedImage => vec!["-loop".to_string(), "1".to_string()],
            InputKind::Media => Vec::new(),
            InputKind::ConcatList => vec![
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
            ],
        };
        args.push("-i".to_string());
        args.push(self.path.to_string_lossy().to_string());
        args
    }
}

/// Ordered list of inputs with a single index counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputPlan {
    inputs: Vec<MediaInput>,
}

impl InputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: InputKind, path: &Path) -> InputIndex {
        let index = InputIndex(self.inputs.len());
        self.inputs.push(MediaInput {
            kind,
            path: path.to_path_buf(),
        });
        index
    }

    /// Declare a still image looped for the whole output.
    pub fn looped_image(&mut self, path: impl AsRef<Path>) -> InputIndex {
        self.push(InputKind::LoopedImage, path.as_ref())
    }

    /// Declare an audio or video file.
    pub fn media(&mut self, path: impl AsRef<Path>) -> InputIndex {
        self.push(InputKind::Media, path.as_ref())
    }

    /// Declare a concat demuxer list.
    pub fn concat_list(&mut self, path: impl AsRef<Path>) -> InputIndex {
        self.push(InputKind::ConcatList, path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[MediaInput] {
        &self.inputs
    }

    /// Input arguments in declaration order.
    pub fn to_args(&self) -> Vec<String> {
        self.inputs.iter().flat_map(MediaInput::to_args).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_declaration_order() {
        let mut plan = InputPlan::new();
        let bg = plan.looped_image("bg.png");
        let voice = plan.media("voice.mp3");
        let pose = plan.looped_image("pose.png");
        assert_eq!((bg.get(), voice.get(), pose.get()), (0, 1, 2));
        assert_eq!(pose.video(), "[2:v]");
        assert_eq!(voice.audio_map(), "1:a");
    }

    #[test]
    fn test_args_loop_only_images() {
        let mut plan = InputPlan::new();
        plan.looped_image("bg.png");
        plan.media("voice.mp3");
        assert_eq!(
            plan.to_args(),
            vec!["-loop", "1", "-i", "bg.png", "-i", "voice.mp3"]
        );
    }

    #[test]
    fn test_concat_list_args() {
        let mut plan = InputPlan::new();
        plan.concat_list("list.txt");
        assert_eq!(
            plan.to_args(),
            vec!["-f", "concat", "-safe", "0", "-i", "list.txt"]
        );
    }
}
