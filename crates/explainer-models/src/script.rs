//! Dialogue scripts.

use serde::{Deserialize, Serialize};

use crate::role::{CharacterRole, ContextStyle};

/// Pose suggested for a line when the generator does not name one.
pub const DEFAULT_POSE: &str = "standing";

/// Target video length when the caller does not specify one.
pub const DEFAULT_TARGET_DURATION_SECS: u32 = 45;

fn default_pose() -> String {
    DEFAULT_POSE.to_string()
}

fn default_target_duration() -> u32 {
    DEFAULT_TARGET_DURATION_SECS
}

/// A single spoken line of the dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker_role: CharacterRole,
    /// Display name shown above the caption
    pub speaker_name: String,
    /// Spoken text
    #[serde(rename = "line")]
    pub text: String,
    #[serde(default = "default_pose")]
    pub pose: String,
    /// 1-based position in the script
    pub scene_number: u32,
}

impl DialogueLine {
    pub fn new(
        speaker_role: CharacterRole,
        speaker_name: impl Into<String>,
        text: impl Into<String>,
        scene_number: u32,
    ) -> Self {
        Self {
            speaker_role,
            speaker_name: speaker_name.into(),
            text: text.into(),
            pose: default_pose(),
            scene_number,
        }
    }

    /// Length of the spoken text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An ordered two-character dialogue about one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueScript {
    pub topic: String,
    pub context_style: ContextStyle,
    pub lines: Vec<DialogueLine>,
    /// Closing line shown or spoken at the end
    pub takeaway: String,
    #[serde(default = "default_target_duration")]
    pub target_duration_seconds: u32,
}

impl DialogueScript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total narrated characters across all lines.
    pub fn total_chars(&self) -> usize {
        self.lines.iter().map(DialogueLine::char_len).sum()
    }

    /// Renumber lines 1..=n in their current order.
    pub fn renumber(&mut self) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.scene_number = i as u32 + 1;
        }
    }

    /// Lines spoken by `role`, in order.
    pub fn lines_for(&self, role: CharacterRole) -> impl Iterator<Item = &DialogueLine> {
        self.lines.iter().filter(move |l| l.speaker_role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_serializes_text_as_line() {
        let line = DialogueLine::new(CharacterRole::Questioner, "Sam", "Why?", 1);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["line"], "Why?");
        assert_eq!(json["pose"], "standing");
        assert_eq!(json["speaker_role"], "questioner");
    }

    #[test]
    fn test_pose_and_duration_defaults() {
        let json = r#"{
            "topic": "Compound interest",
            "context_style": "finance",
            "lines": [{"speaker_role": "explainer", "speaker_name": "Ada", "line": "Money grows.", "scene_number": 1}],
            "takeaway": "Start early."
        }"#;
        let script: DialogueScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.lines[0].pose, DEFAULT_POSE);
        assert_eq!(script.target_duration_seconds, DEFAULT_TARGET_DURATION_SECS);
    }

    #[test]
    fn test_total_chars_counts_unicode_scalars() {
        let script = DialogueScript {
            topic: "t".into(),
            context_style: ContextStyle::Tech,
            lines: vec![
                DialogueLine::new(CharacterRole::Questioner, "Q", "héllo", 1),
                DialogueLine::new(CharacterRole::Explainer, "E", "ok", 2),
            ],
            takeaway: String::new(),
            target_duration_seconds: 30,
        };
        assert_eq!(script.total_chars(), 7);
        assert_eq!(script.lines_for(CharacterRole::Explainer).count(), 1);
    }
}
