//! Voiceover synthesis with ElevenLabs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use explainer_media::{concat_audio, probe_duration, MediaTools};
use explainer_models::{AudioSegment, CharacterRole, DialogueScript, VoiceoverResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Name of the joined narration inside a project's voiceover directory.
pub const COMBINED_VOICEOVER_FILE: &str = "combined_voiceover.mp3";

const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// A voice available to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

/// Turns text into speech.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id`, returning MP3 bytes.
    async fn synthesize(&self, text: &str, voice_id: &str) -> PipelineResult<Vec<u8>>;

    async fn list_voices(&self) -> PipelineResult<Vec<Voice>>;
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: crate::config::DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Build from config, or `None` when no API key is set.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Option<Self>> {
        let Some(api_key) = config.elevenlabs_api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Some(Self {
            api_key,
            model: config.elevenlabs_model.clone(),
            base_url: config.elevenlabs_base_url.clone(),
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> PipelineResult<Vec<u8>> {
        let response = self
            .client
            .post(self.url(&format!("/v1/text-to-speech/{voice_id}")))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::synthesis(format!(
                "ElevenLabs returned {}: {}",
                status, body
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn list_voices(&self) -> PipelineResult<Vec<Voice>> {
        let response = self
            .client
            .get(self.url("/v1/voices"))
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::synthesis(format!(
                "ElevenLabs returned {}: {}",
                status, body
            )));
        }
        Ok(response.json::<VoicesResponse>().await?.voices)
    }
}

/// Voice used for each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub questioner_voice: String,
    pub explainer_voice: String,
}

impl VoiceSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            questioner_voice: config.questioner_voice.clone(),
            explainer_voice: config.explainer_voice.clone(),
        }
    }

    pub fn voice_for(&self, role: CharacterRole) -> &str {
        match role {
            CharacterRole::Questioner => &self.questioner_voice,
            CharacterRole::Explainer => &self.explainer_voice,
        }
    }
}

/// Voices a whole script into per-line clips plus one joined track.
pub struct VoiceoverService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    tools: MediaTools,
    settings: RwLock<VoiceSettings>,
}

impl VoiceoverService {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        tools: MediaTools,
        settings: VoiceSettings,
    ) -> Self {
        Self {
            synthesizer,
            tools,
            settings: RwLock::new(settings),
        }
    }

    pub async fn settings(&self) -> VoiceSettings {
        self.settings.read().await.clone()
    }

    /// Replace the voice for any role given; `None` keeps the current one.
    pub async fn update_settings(
        &self,
        questioner_voice: Option<String>,
        explainer_voice: Option<String>,
    ) -> VoiceSettings {
        let mut settings = self.settings.write().await;
        if let Some(voice) = questioner_voice.filter(|v| !v.trim().is_empty()) {
            settings.questioner_voice = voice;
        }
        if let Some(voice) = explainer_voice.filter(|v| !v.trim().is_empty()) {
            settings.explainer_voice = voice;
        }
        settings.clone()
    }

    pub async fn list_voices(&self) -> PipelineResult<Vec<Voice>> {
        self.synthesizer.list_voices().await
    }

    /// Voice every line of `script` into `output_dir`.
    ///
    /// Clips are written as `scene_NNN.mp3`, measured with FFprobe and
    /// joined into [`COMBINED_VOICEOVER_FILE`]. Each segment's start time is
    /// the sum of the clips before it.
    pub async fn generate(
        &self,
        script: &DialogueScript,
        output_dir: &Path,
    ) -> PipelineResult<VoiceoverResult> {
        if script.is_empty() {
            return Err(PipelineError::validation("Script has no lines to voice"));
        }
        tokio::fs::create_dir_all(output_dir).await?;

        // Voices are fixed for the whole script even if settings change mid-run
        let voices = self.settings().await;
        let mut segments = Vec::with_capacity(script.lines.len());
        let mut files: Vec<PathBuf> = Vec::with_capacity(script.lines.len());
        let mut current_time = 0.0;

        for line in &script.lines {
            let audio = self
                .synthesizer
                .synthesize(&line.text, voices.voice_for(line.speaker_role))
                .await?;
            if audio.is_empty() {
                return Err(PipelineError::synthesis(format!(
                    "no audio returned for scene {}",
                    line.scene_number
                )));
            }

            let path = output_dir.join(format!("scene_{:03}.mp3", line.scene_number));
            tokio::fs::write(&path, &audio).await?;
            let duration = probe_duration(&self.tools.ffprobe, &path).await?;
            debug!(scene = line.scene_number, duration, "Voiced line");

            segments.push(AudioSegment {
                scene_number: line.scene_number,
                speaker_role: line.speaker_role,
                file_path: path.clone(),
                duration_seconds: duration,
                start_time: current_time,
            });
            files.push(path);
            current_time += duration;
        }

        let combined = output_dir.join(COMBINED_VOICEOVER_FILE);
        concat_audio(&self.tools.ffmpeg, &files, &combined).await?;
        let total_duration_seconds = probe_duration(&self.tools.ffprobe, &combined).await?;
        info!(
            segments = segments.len(),
            total_duration_seconds,
            summed_seconds = current_time,
            "Voiceover ready"
        );

        Ok(VoiceoverResult {
            segments,
            combined_audio_path: combined,
            total_duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use explainer_models::{ContextStyle, DialogueLine};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> VoiceSettings {
        VoiceSettings {
            questioner_voice: "voice-q".into(),
            explainer_voice: "voice-e".into(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/voice-q"))
            .and(query_param("output_format", "mp3_44100_128"))
            .and(header("xi-api-key", "secret"))
            .and(body_json(serde_json::json!({
                "text": "Hello there",
                "model_id": "eleven_multilingual_v2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElevenLabsClient::new("secret", "eleven_multilingual_v2").with_base_url(server.uri());
        let audio = client.synthesize("Hello there", "voice-q").await.unwrap();
        assert_eq!(audio, b"ID3audio");
    }

    #[tokio::test]
    async fn test_list_voices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "voices": [
                    {"voice_id": "a1", "name": "George", "preview_url": "https://x/a1.mp3"},
                    {"voice_id": "b2", "name": "Sarah"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ElevenLabsClient::new("k", "m").with_base_url(server.uri());
        let voices = client.list_voices().await.unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].preview_url, None);
    }

    #[tokio::test]
    async fn test_quota_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("quota_exceeded"))
            .mount(&server)
            .await;

        let client = ElevenLabsClient::new("k", "m").with_base_url(server.uri());
        let err = client.synthesize("Hi", "v").await.unwrap_err();
        assert!(err.to_string().contains("quota_exceeded"));
    }

    #[tokio::test]
    async fn test_update_settings_keeps_unset_roles() {
        let service = VoiceoverService::new(
            Arc::new(MockSpeechSynthesizer::new()),
            MediaTools::default(),
            settings(),
        );
        let updated = service.update_settings(None, Some("new-e".into())).await;
        assert_eq!(updated.questioner_voice, "voice-q");
        assert_eq!(updated.explainer_voice, "new-e");
        assert_eq!(service.settings().await, updated);
    }

    #[tokio::test]
    async fn test_empty_script_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = VoiceoverService::new(
            Arc::new(MockSpeechSynthesizer::new()),
            MediaTools::default(),
            settings(),
        );
        let script = DialogueScript {
            topic: "t".into(),
            context_style: ContextStyle::Tech,
            lines: vec![],
            takeaway: String::new(),
            target_duration_seconds: 30,
        };
        let err = service.generate(&script, dir.path()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_accumulates_start_times() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let ffprobe = bin.join("ffprobe");
        std::fs::write(&ffprobe, "#!/bin/sh\necho 2.5\n").unwrap();
        let ffmpeg = bin.join("ffmpeg");
        std::fs::write(&ffmpeg, "#!/bin/sh\nfor a; do last=$a; done\n: > \"$last\"\n").unwrap();
        for tool in [&ffprobe, &ffmpeg] {
            std::fs::set_permissions(tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_synthesize()
            .withf(|_, voice| voice == "voice-q")
            .times(2)
            .returning(|_, _| Ok(b"ID3q".to_vec()));
        synth
            .expect_synthesize()
            .withf(|_, voice| voice == "voice-e")
            .times(1)
            .returning(|_, _| Ok(b"ID3e".to_vec()));

        let service = VoiceoverService::new(Arc::new(synth), MediaTools::new(&ffmpeg, &ffprobe), settings());
        let script = DialogueScript {
            topic: "t".into(),
            context_style: ContextStyle::Tech,
            lines: vec![
                DialogueLine::new(CharacterRole::Questioner, "Q", "One?", 1),
                DialogueLine::new(CharacterRole::Explainer, "E", "Two.", 2),
                DialogueLine::new(CharacterRole::Questioner, "Q", "Three?", 3),
            ],
            takeaway: String::new(),
            target_duration_seconds: 30,
        };

        let out = dir.path().join("voiceovers/1");
        let result = service.generate(&script, &out).await.unwrap();

        let starts: Vec<f64> = result.segments.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![0.0, 2.5, 5.0]);
        assert!(out.join("scene_001.mp3").exists());
        assert!(out.join("scene_003.mp3").exists());
        assert_eq!(result.combined_audio_path, out.join(COMBINED_VOICEOVER_FILE));
        assert_eq!(result.total_duration_seconds, 2.5);
    }
}
