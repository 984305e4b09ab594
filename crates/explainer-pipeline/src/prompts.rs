//! Prompt templates for Claude.

use explainer_models::ContextStyle;

/// Rough seconds of speech per dialogue line.
pub const SECONDS_PER_LINE: u32 = 3;

/// Characters of source document included in a script prompt.
pub const SCRIPT_DOCUMENT_CHARS: usize = 2000;

/// Characters of source document included in a topic prompt.
pub const TOPIC_DOCUMENT_CHARS: usize = 5000;

/// Number of lines to ask for at a target duration.
pub fn line_count(target_duration_seconds: u32) -> u32 {
    (target_duration_seconds / SECONDS_PER_LINE).max(2)
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct ScriptPrompt<'a> {
    pub topic: &'a str,
    pub context_style: ContextStyle,
    pub questioner_name: &'a str,
    pub explainer_name: &'a str,
    pub target_duration_seconds: u32,
    pub document_context: Option<&'a str>,
}

impl ScriptPrompt<'_> {
    pub fn render(&self) -> String {
        let (q, e) = (self.questioner_name, self.explainer_name);
        let document = self
            .document_context
            .filter(|d| !d.trim().is_empty())
            .map(|d| {
                format!(
                    "\nSOURCE DOCUMENT:\n{}\n",
                    truncate_chars(d, SCRIPT_DOCUMENT_CHARS)
                )
            })
            .unwrap_or_default();

        format!(
            r#"Write the script for a short vertical educational video: a dialogue between two characters about the topic below.

CHARACTERS:
- {q} (questioner): curious, asks what the viewer is wondering
- {e} (explainer): answers plainly and concisely

TOPIC: {topic}
STYLE: {style} ({tone})
TARGET DURATION: {duration} seconds, about {lines} lines in total
{document}
RULES:
1. {q} opens with a question that hooks the viewer
2. The speakers alternate
3. Keep every line under 20 words
4. Use everyday language
5. Finish with a short takeaway the viewer can remember
6. Give each line a pose: standing, thinking, pointing or excited

Respond with JSON only, in this shape:
{{
  "lines": [
    {{"speaker_role": "questioner", "speaker_name": "{q}", "line": "...", "pose": "thinking"}},
    {{"speaker_role": "explainer", "speaker_name": "{e}", "line": "...", "pose": "pointing"}}
  ],
  "takeaway": "..."
}}"#,
            topic = self.topic,
            style = self.context_style,
            tone = self.context_style.tone(),
            duration = self.target_duration_seconds,
            lines = line_count(self.target_duration_seconds),
        )
    }
}

pub fn topic_prompt(document: &str, max_topics: usize) -> String {
    format!(
        r#"Read the document below and suggest up to {max_topics} distinct topics, each suitable for a 30 to 60 second explainer video.

DOCUMENT:
{document}

For each topic give a specific title, one sentence on what the video covers, and the best fitting style: motivation, finance, tech or educational.

Respond with JSON only, in this shape:
{{
  "topics": [
    {{"title": "...", "description": "...", "context_style": "educational"}}
  ]
}}"#,
        document = truncate_chars(document, TOPIC_DOCUMENT_CHARS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(45), 15);
        assert_eq!(line_count(30), 10);
        assert_eq!(line_count(1), 2);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_script_prompt_includes_names_and_truncated_document() {
        let document = "x".repeat(3000);
        let prompt = ScriptPrompt {
            topic: "Budgeting",
            context_style: ContextStyle::Finance,
            questioner_name: "Thabo",
            explainer_name: "Lerato",
            target_duration_seconds: 45,
            document_context: Some(&document),
        }
        .render();

        assert!(prompt.contains("Thabo (questioner)"));
        assert!(prompt.contains("Lerato (explainer)"));
        assert!(prompt.contains("about 15 lines"));
        assert!(prompt.contains("STYLE: finance"));
        assert!(prompt.contains(&"x".repeat(2000)));
        assert!(!prompt.contains(&"x".repeat(2001)));
    }

    #[test]
    fn test_script_prompt_without_document() {
        let prompt = ScriptPrompt {
            topic: "Budgeting",
            context_style: ContextStyle::Educational,
            questioner_name: "Q",
            explainer_name: "E",
            target_duration_seconds: 30,
            document_context: None,
        }
        .render();
        assert!(!prompt.contains("SOURCE DOCUMENT"));
    }

    #[test]
    fn test_topic_prompt_truncates() {
        let prompt = topic_prompt(&"y".repeat(6000), 5);
        assert!(prompt.contains("up to 5 distinct topics"));
        assert!(!prompt.contains(&"y".repeat(5001)));
    }
}
