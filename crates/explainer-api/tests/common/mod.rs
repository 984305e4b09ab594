#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use explainer_api::{create_router, ApiConfig, AppState};
use explainer_db::{
    CharacterRepo, CreateCharacter, CreateVideoProject, DbPool, ProjectRepo, VideoProject,
};
use explainer_media::MediaTools;
use explainer_models::{CharacterRole, ContextStyle, DialogueLine, DialogueScript};
use explainer_pipeline::{
    PipelineConfig, PipelineResult, ScriptGenerator, ScriptRequest, SpeechSynthesizer,
    TopicSuggestion, VideoPipeline, Voice, VoiceSettings, VoiceoverService,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Writes a two-line script using the requested character names.
pub struct FakeGenerator;

#[async_trait]
impl ScriptGenerator for FakeGenerator {
    async fn generate_script(&self, request: &ScriptRequest) -> PipelineResult<DialogueScript> {
        Ok(DialogueScript {
            topic: request.topic.clone(),
            context_style: request.context_style,
            lines: vec![
                DialogueLine::new(
                    CharacterRole::Questioner,
                    &request.questioner_name,
                    "What is compound interest?",
                    1,
                ),
                DialogueLine::new(
                    CharacterRole::Explainer,
                    &request.explainer_name,
                    "Interest that earns interest.",
                    2,
                ),
            ],
            takeaway: "Start saving early.".into(),
            target_duration_seconds: request.target_duration_seconds,
        })
    }

    async fn extract_topics(
        &self,
        _document: &str,
        max_topics: usize,
    ) -> PipelineResult<Vec<TopicSuggestion>> {
        let topics = vec![
            TopicSuggestion {
                title: "Compound interest".into(),
                description: "Why saving early matters".into(),
                context_style: Some(ContextStyle::Finance),
            },
            TopicSuggestion {
                title: "Emergency funds".into(),
                description: "Three months of expenses".into(),
                context_style: None,
            },
        ];
        Ok(topics.into_iter().take(max_topics).collect())
    }
}

pub struct FakeSynth;

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, _text: &str, _voice_id: &str) -> PipelineResult<Vec<u8>> {
        Ok(b"ID3".to_vec())
    }

    async fn list_voices(&self) -> PipelineResult<Vec<Voice>> {
        Ok(vec![Voice {
            voice_id: "voice-1".into(),
            name: "Rachel".into(),
            preview_url: None,
        }])
    }
}

/// Router plus the handles tests need to seed and inspect state.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub pipeline: VideoPipeline,
    pub dir: TempDir,
}

pub struct Services {
    pub script: bool,
    pub voice: bool,
}

impl Services {
    pub const ALL: Services = Services {
        script: true,
        voice: true,
    };
    pub const NONE: Services = Services {
        script: false,
        voice: false,
    };
}

pub async fn test_app(services: Services) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let pool = explainer_db::connect_in_memory().await.unwrap();
    let config = PipelineConfig {
        assets_dir: dir.path().join("assets"),
        projects_dir: dir.path().join("projects"),
        ffmpeg_path: "no-such-ffmpeg".into(),
        ffprobe_path: "no-such-ffprobe".into(),
        ..Default::default()
    };
    let settings = VoiceSettings::from_config(&config);

    let mut pipeline = VideoPipeline::new(pool.clone(), config);
    if services.script {
        pipeline = pipeline.with_script_generator(Arc::new(FakeGenerator));
    }
    if services.voice {
        pipeline = pipeline.with_voiceover(Arc::new(VoiceoverService::new(
            Arc::new(FakeSynth),
            MediaTools::new("no-such-ffmpeg", "no-such-ffprobe"),
            settings,
        )));
    }
    pipeline.assets().ensure_dirs().await.unwrap();

    let state = AppState::from_parts(ApiConfig::default(), pipeline.clone());
    TestApp {
        router: create_router(state, None),
        pool,
        pipeline,
        dir,
    }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send_json(Method::POST, uri, body).await
    }

    /// POST a multipart form: text fields, then one `file` part.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        filename: &str,
        bytes: &[u8],
    ) -> Response<Body> {
        const BOUNDARY: &str = "XEXPLAINERBOUNDARY";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.request(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Two characters and a DRAFT project without a script.
    pub async fn seed_project(&self) -> VideoProject {
        let (questioner, explainer) = self.seed_characters().await;
        ProjectRepo::create(
            &self.pool,
            &CreateVideoProject {
                title: "Saving".into(),
                topic: "compound interest".into(),
                context_style: ContextStyle::Finance,
                document_id: None,
                questioner_id: questioner,
                explainer_id: explainer,
                background_id: None,
                background_music_id: None,
                target_duration_seconds: 30,
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_characters(&self) -> (i64, i64) {
        let q = CharacterRepo::create(
            &self.pool,
            &CreateCharacter {
                name: "Thabo".into(),
                role: CharacterRole::Questioner,
            },
        )
        .await
        .unwrap();
        let e = CharacterRepo::create(
            &self.pool,
            &CreateCharacter {
                name: "Lerato".into(),
                role: CharacterRole::Explainer,
            },
        )
        .await
        .unwrap();
        (q.id, e.id)
    }

    /// Wait until no background task owns the project.
    pub async fn wait_idle(&self, project_id: i64) {
        for _ in 0..200 {
            if !self.pipeline.is_busy(project_id) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("project {project_id} still busy");
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
