//! Timing windows and synthesized audio segments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::role::CharacterRole;

/// Interval during which one dialogue line is heard and shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingWindow {
    pub start: f64,
    pub end: f64,
    pub role: CharacterRole,
}

impl TimingWindow {
    pub fn new(start: f64, end: f64, role: CharacterRole) -> Self {
        Self { start, end, role }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// One synthesized line of the voiceover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub scene_number: u32,
    pub speaker_role: CharacterRole,
    pub file_path: PathBuf,
    pub duration_seconds: f64,
    /// Offset of this segment inside the combined voiceover
    pub start_time: f64,
}

/// Output of the voiceover step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceoverResult {
    pub segments: Vec<AudioSegment>,
    pub combined_audio_path: PathBuf,
    pub total_duration_seconds: f64,
}
