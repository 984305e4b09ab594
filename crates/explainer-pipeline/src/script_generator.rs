//! Dialogue script generation with Claude.

use std::time::Duration;

use async_trait::async_trait;
use explainer_models::{CharacterRole, ContextStyle, DialogueLine, DialogueScript, DEFAULT_POSE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::prompts::{topic_prompt, ScriptPrompt};

/// `anthropic-version` header sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const SCRIPT_MAX_TOKENS: u32 = 2000;
const TOPIC_MAX_TOKENS: u32 = 1000;

/// Input for one script generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    pub topic: String,
    pub context_style: ContextStyle,
    pub questioner_name: String,
    pub explainer_name: String,
    pub target_duration_seconds: u32,
    pub document_context: Option<String>,
}

/// A video idea pulled out of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Unrecognised styles are dropped rather than failing the whole reply
    #[serde(default, deserialize_with = "lenient_style")]
    pub context_style: Option<ContextStyle>,
}

fn lenient_style<'de, D>(deserializer: D) -> Result<Option<ContextStyle>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Produces dialogue scripts and topic ideas.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self, request: &ScriptRequest) -> PipelineResult<DialogueScript>;

    async fn extract_topics(
        &self,
        document: &str,
        max_topics: usize,
    ) -> PipelineResult<Vec<TopicSuggestion>>;
}

/// Claude messages API client.
pub struct ClaudeScriptGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    lines: Vec<RawLine>,
    #[serde(default)]
    takeaway: String,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    speaker_role: String,
    speaker_name: String,
    line: String,
    #[serde(default)]
    pose: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTopics {
    #[serde(default)]
    topics: Vec<TopicSuggestion>,
}

impl ClaudeScriptGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: crate::config::DEFAULT_CLAUDE_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Build from config, or `None` when no API key is set.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Option<Self>> {
        let Some(api_key) = config.claude_api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Some(Self {
            api_key,
            model: config.claude_model.clone(),
            base_url: config.claude_base_url.clone(),
            client,
        }))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> PipelineResult<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Send one user message and return the concatenated text blocks.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> PipelineResult<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::script_generation(format!(
                "Claude API returned {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        debug!(chars = text.len(), "Claude response received");
        Ok(text)
    }
}

#[async_trait]
impl ScriptGenerator for ClaudeScriptGenerator {
    async fn generate_script(&self, request: &ScriptRequest) -> PipelineResult<DialogueScript> {
        info!(topic = %request.topic, style = %request.context_style, "Generating script");
        let prompt = ScriptPrompt {
            topic: &request.topic,
            context_style: request.context_style,
            questioner_name: &request.questioner_name,
            explainer_name: &request.explainer_name,
            target_duration_seconds: request.target_duration_seconds,
            document_context: request.document_context.as_deref(),
        }
        .render();

        let text = self.complete(&prompt, SCRIPT_MAX_TOKENS).await?;
        let script = parse_script(&text, request)?;
        info!(lines = script.lines.len(), "Script generated");
        Ok(script)
    }

    async fn extract_topics(
        &self,
        document: &str,
        max_topics: usize,
    ) -> PipelineResult<Vec<TopicSuggestion>> {
        let text = self
            .complete(&topic_prompt(document, max_topics), TOPIC_MAX_TOKENS)
            .await?;
        let mut topics = serde_json::from_str::<RawTopics>(strip_code_fence(&text))?.topics;
        topics.truncate(max_topics);
        Ok(topics)
    }
}

/// Drop a surrounding markdown code fence (its first and last line).
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let body = match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => return "",
    };
    match body.rfind('\n') {
        Some(idx) if body[idx + 1..].trim_start().starts_with("```") => &body[..idx],
        _ => body.trim_end().trim_end_matches('`'),
    }
}

/// Parse Claude's JSON reply into a numbered script.
pub fn parse_script(text: &str, request: &ScriptRequest) -> PipelineResult<DialogueScript> {
    let raw: RawScript = serde_json::from_str(strip_code_fence(text))?;
    if raw.lines.is_empty() {
        return Err(PipelineError::script_generation("Claude returned an empty script"));
    }

    let lines = raw
        .lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let speaker_role: CharacterRole = line.speaker_role.parse().map_err(|_| {
                PipelineError::script_generation(format!(
                    "invalid speaker_role '{}' on line {}",
                    line.speaker_role,
                    i + 1
                ))
            })?;
            Ok(DialogueLine {
                speaker_role,
                speaker_name: line.speaker_name,
                text: line.line,
                pose: line
                    .pose
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_POSE.to_string()),
                scene_number: (i + 1) as u32,
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(DialogueScript {
        topic: request.topic.clone(),
        context_style: request.context_style,
        lines,
        takeaway: raw.takeaway,
        target_duration_seconds: request.target_duration_seconds,
    })
}
