//! Project lifecycle orchestration.
//!
//! Each `start_*` / action method runs its checks synchronously (service
//! configured, project exists, status allows it, no task in flight) so the
//! caller gets an immediate error, and only then spawns the slow work.
//! Background failures land on the project as FAILED with a message.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use explainer_db::{
    AssetRepo, CharacterRepo, DbPool, ProjectRepo, SceneRepo, VideoProject, VideoScene,
};
use explainer_media::{CharacterAssetSet, MediaTools, PoseSet, RenderRequest, Renderer};
use explainer_models::{CharacterRole, DialogueScript, ProjectStatus, RenderResult};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use crate::assets::AssetStore;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::locks::{ProjectLockGuard, ProjectLocks};
use crate::logging::JobLogger;
use crate::script_generator::{ClaudeScriptGenerator, ScriptGenerator, ScriptRequest, TopicSuggestion};
use crate::voiceover::{ElevenLabsClient, Voice, VoiceSettings, VoiceoverService};

/// Handle of a spawned background task.
pub type JobHandle = JoinHandle<()>;

/// Message stored on projects whose task died with the previous process.
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by server restart";

const SCRIPT_SERVICE: &str = "Script generation";
const VOICE_SERVICE: &str = "Voiceover generation";

/// Orchestrates script, voiceover and render tasks.
#[derive(Clone)]
pub struct VideoPipeline {
    pool: DbPool,
    config: Arc<PipelineConfig>,
    generator: Option<Arc<dyn ScriptGenerator>>,
    voiceover: Option<Arc<VoiceoverService>>,
    renderer: Arc<Renderer>,
    assets: AssetStore,
    locks: ProjectLocks,
}

impl VideoPipeline {
    /// Pipeline with no external services configured.
    pub fn new(pool: DbPool, config: PipelineConfig) -> Self {
        let tools = MediaTools::new(&config.ffmpeg_path, &config.ffprobe_path);
        let renderer = Renderer::new(tools, config.render_style)
            .with_canvas(config.canvas)
            .with_font_file(config.font_file.clone())
            .with_timeout(config.render_timeout_secs);
        Self {
            pool,
            assets: AssetStore::new(&config.assets_dir),
            config: Arc::new(config),
            generator: None,
            voiceover: None,
            renderer: Arc::new(renderer),
            locks: ProjectLocks::new(),
        }
    }

    /// Build the pipeline and every client the config has credentials for.
    pub fn from_config(pool: DbPool, config: PipelineConfig) -> PipelineResult<Self> {
        let tools = MediaTools::resolve_or_configured(&config.ffmpeg_path, &config.ffprobe_path);
        let generator = ClaudeScriptGenerator::from_config(&config)?;
        let synthesizer = ElevenLabsClient::from_config(&config)?;
        let settings = VoiceSettings::from_config(&config);

        let renderer = Renderer::new(tools.clone(), config.render_style)
            .with_canvas(config.canvas)
            .with_font_file(config.font_file.clone())
            .with_timeout(config.render_timeout_secs);

        let mut pipeline = Self::new(pool, config).with_renderer(renderer);
        if let Some(generator) = generator {
            pipeline = pipeline.with_script_generator(Arc::new(generator));
        } else {
            warn!("CLAUDE_API_KEY not set; script generation disabled");
        }
        if let Some(synthesizer) = synthesizer {
            pipeline = pipeline.with_voiceover(Arc::new(VoiceoverService::new(
                Arc::new(synthesizer),
                tools,
                settings,
            )));
        } else {
            warn!("ELEVENLABS_API_KEY not set; voiceover disabled");
        }
        Ok(pipeline)
    }

    pub fn with_script_generator(mut self, generator: Arc<dyn ScriptGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_voiceover(mut self, voiceover: Arc<VoiceoverService>) -> Self {
        self.voiceover = Some(voiceover);
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn is_script_generation_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn is_voiceover_configured(&self) -> bool {
        self.voiceover.is_some()
    }

    /// Whether a background task currently owns the project.
    pub fn is_busy(&self, project_id: i64) -> bool {
        self.locks.is_locked(project_id)
    }

    fn generator(&self) -> PipelineResult<Arc<dyn ScriptGenerator>> {
        self.generator
            .clone()
            .ok_or(PipelineError::NotConfigured(SCRIPT_SERVICE))
    }

    fn voiceover(&self) -> PipelineResult<Arc<VoiceoverService>> {
        self.voiceover
            .clone()
            .ok_or(PipelineError::NotConfigured(VOICE_SERVICE))
    }

    fn lock(&self, project_id: i64) -> PipelineResult<ProjectLockGuard> {
        self.locks.try_acquire(project_id).ok_or_else(|| {
            PipelineError::conflict(format!(
                "A background task is already running for project {project_id}"
            ))
        })
    }

    async fn load_project(&self, project_id: i64) -> PipelineResult<VideoProject> {
        ProjectRepo::find_by_id(&self.pool, project_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Project not found"))
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Generate the script of a freshly created DRAFT project.
    pub async fn start_script_generation(
        &self,
        project_id: i64,
        document_context: Option<String>,
    ) -> PipelineResult<JobHandle> {
        let generator = self.generator()?;
        let project = self.load_project(project_id).await?;
        if project.status != ProjectStatus::Draft {
            return Err(PipelineError::invalid_state(
                "Scripts can only be generated for DRAFT projects",
            ));
        }
        let guard = self.lock(project_id)?;

        let this = self.clone();
        Ok(self.spawn_job(project_id, "generate_script", guard, async move {
            this.run_script_generation(generator, project_id, document_context)
                .await
        }))
    }

    /// Throw away the script of a DRAFT or FAILED project and write a new one.
    pub async fn start_regeneration(&self, project_id: i64) -> PipelineResult<JobHandle> {
        let generator = self.generator()?;
        let project = self.load_project(project_id).await?;
        if !project.status.script_editable() {
            return Err(PipelineError::invalid_state(
                "Can only regenerate scripts for DRAFT or FAILED projects",
            ));
        }
        let guard = self.lock(project_id)?;

        ProjectRepo::transition(
            &self.pool,
            project_id,
            &[ProjectStatus::Draft, ProjectStatus::Failed],
            ProjectStatus::Draft,
            None,
        )
        .await?
        .ok_or_else(|| PipelineError::invalid_state("Project changed status, try again"))?;

        let this = self.clone();
        Ok(self.spawn_job(project_id, "regenerate_script", guard, async move {
            this.run_script_generation(generator, project_id, None).await
        }))
    }

    /// Approve a DRAFT script and start voicing it.
    pub async fn approve(
        &self,
        project_id: i64,
        reviewed_by: Option<&str>,
    ) -> PipelineResult<(VideoProject, JobHandle)> {
        let voiceover = self.voiceover()?;
        let guard = self.lock(project_id)?;

        let project = ProjectRepo::find_by_id(&self.pool, project_id).await?;
        if project.as_ref().is_some_and(|p| p.status == ProjectStatus::Draft && p.script().is_none()) {
            return Err(PipelineError::invalid_state("Project has no script to approve"));
        }
        let approved = ProjectRepo::approve(&self.pool, project_id, reviewed_by)
            .await?
            .ok_or_else(|| PipelineError::invalid_state("Project not found or not in DRAFT status"))?;

        let this = self.clone();
        let handle = self.spawn_job(project_id, "generate_voiceover", guard, async move {
            this.run_voiceover(voiceover, project_id).await
        });
        Ok((approved, handle))
    }

    /// Send a project back to DRAFT with the reviewer's notes.
    pub async fn reject(&self, project_id: i64, notes: &str) -> PipelineResult<VideoProject> {
        let _guard = self.lock(project_id)?;
        let project = self.load_project(project_id).await?;
        let allowed = ProjectStatus::predecessors(ProjectStatus::Draft);
        if !allowed.contains(&project.status) {
            return Err(PipelineError::invalid_state(format!(
                "Cannot reject a project in {} status",
                project.status
            )));
        }

        ProjectRepo::transition(
            &self.pool,
            project_id,
            &allowed,
            ProjectStatus::Draft,
            Some(&format!("Rejected: {notes}")),
        )
        .await?
        .ok_or_else(|| PipelineError::invalid_state("Project changed status, try again"))
    }

    /// Replace the script of a DRAFT project by hand.
    pub async fn update_script(
        &self,
        project_id: i64,
        mut script: DialogueScript,
    ) -> PipelineResult<VideoProject> {
        if script.is_empty() {
            return Err(PipelineError::validation("Script must have at least one line"));
        }
        let _guard = self.lock(project_id)?;
        let project = self.load_project(project_id).await?;
        if project.status != ProjectStatus::Draft {
            return Err(PipelineError::invalid_state(
                "Script can only be edited while the project is in DRAFT status",
            ));
        }

        script.renumber();
        let updated = ProjectRepo::update_script(&self.pool, project_id, &script)
            .await?
            .ok_or_else(|| PipelineError::invalid_state("Project changed status, try again"))?;
        SceneRepo::replace_for_project(&self.pool, project_id, &script.lines).await?;
        Ok(updated)
    }

    /// Move an AUDIO_READY project to RENDERING and start the render.
    pub async fn start_render(&self, project_id: i64) -> PipelineResult<(VideoProject, JobHandle)> {
        let project = self.load_project(project_id).await?;
        if project.status != ProjectStatus::AudioReady {
            return Err(PipelineError::invalid_state(
                "Project must be in AUDIO_READY status to render",
            ));
        }
        let voiceover = project
            .voiceover_path
            .as_deref()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .ok_or_else(|| PipelineError::invalid_state("Voiceover audio is missing"))?;
        let background = self.resolve_background(&project).await?;
        let guard = self.lock(project_id)?;

        let rendering = ProjectRepo::transition(
            &self.pool,
            project_id,
            &[ProjectStatus::AudioReady],
            ProjectStatus::Rendering,
            None,
        )
        .await?
        .ok_or_else(|| PipelineError::invalid_state("Project must be in AUDIO_READY status to render"))?;

        let this = self.clone();
        let handle = self.spawn_job(project_id, "render", guard, async move {
            this.run_render(project_id, background, voiceover).await.map(|_| ())
        });
        Ok((rendering, handle))
    }

    /// Delete a project with its generated files.
    pub async fn delete_project(&self, project_id: i64) -> PipelineResult<()> {
        let _guard = self.lock(project_id)?;
        if !ProjectRepo::delete(&self.pool, project_id).await? {
            return Err(PipelineError::not_found("Project not found"));
        }

        let voice_dir = self.config.voiceovers_dir(project_id);
        if let Err(e) = tokio::fs::remove_dir_all(&voice_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(project_id, "Failed to remove {}: {}", voice_dir.display(), e);
            }
        }
        let video = self.config.video_path(project_id);
        if let Err(e) = tokio::fs::remove_file(&video).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(project_id, "Failed to remove {}: {}", video.display(), e);
            }
        }
        Ok(())
    }

    pub async fn extract_topics(
        &self,
        document: &str,
        max_topics: usize,
    ) -> PipelineResult<Vec<TopicSuggestion>> {
        if document.trim().is_empty() {
            return Err(PipelineError::validation("Document is empty"));
        }
        self.generator()?.extract_topics(document, max_topics).await
    }

    pub async fn list_voices(&self) -> PipelineResult<Vec<Voice>> {
        self.voiceover()?.list_voices().await
    }

    /// Current voices, falling back to the configured defaults when
    /// voiceover is disabled.
    pub async fn voice_settings(&self) -> VoiceSettings {
        match &self.voiceover {
            Some(service) => service.settings().await,
            None => VoiceSettings::from_config(&self.config),
        }
    }

    pub async fn update_voice_settings(
        &self,
        questioner_voice: Option<String>,
        explainer_voice: Option<String>,
    ) -> PipelineResult<VoiceSettings> {
        Ok(self
            .voiceover()?
            .update_settings(questioner_voice, explainer_voice)
            .await)
    }

    /// Fail projects whose task was lost with the previous process.
    ///
    /// Call once at startup, before accepting requests.
    pub async fn recover_interrupted(&self) -> PipelineResult<usize> {
        let stuck = ProjectRepo::list_by_status(
            &self.pool,
            &[ProjectStatus::Approved, ProjectStatus::Rendering],
        )
        .await?;

        let mut recovered = 0;
        for project in stuck {
            if self.locks.is_locked(project.id) {
                continue;
            }
            if ProjectRepo::mark_failed(&self.pool, project.id, INTERRUPTED_MESSAGE)
                .await?
                .is_some()
            {
                warn!(project_id = project.id, status = %project.status, "Marked interrupted project as failed");
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    // ------------------------------------------------------------------
    // Task bodies
    // ------------------------------------------------------------------

    fn spawn_job<F>(
        &self,
        project_id: i64,
        operation: &'static str,
        guard: ProjectLockGuard,
        task: F,
    ) -> JobHandle
    where
        F: Future<Output = PipelineResult<()>> + Send + 'static,
    {
        let pool = self.pool.clone();
        let logger = JobLogger::new(project_id, operation);
        let span = logger.create_span();

        tokio::spawn(
            async move {
                let _guard = guard;
                let started = Instant::now();
                logger.log_start(operation);

                match task.await {
                    Ok(()) => {
                        metrics::counter!("explainer_jobs_total", "operation" => operation, "outcome" => "success")
                            .increment(1);
                        logger.log_completion(operation, started.elapsed().as_millis());
                    }
                    Err(e) => {
                        metrics::counter!("explainer_jobs_total", "operation" => operation, "outcome" => "failure")
                            .increment(1);
                        logger.log_error(&format!("{} (retryable: {})", e, e.is_retryable()));
                        match ProjectRepo::mark_failed(&pool, project_id, &e.project_message()).await {
                            Ok(Some(_)) => {}
                            Ok(None) => logger.log_warning("project gone or already terminal; not marked failed"),
                            Err(db) => logger.log_error(&format!("could not mark project failed: {db}")),
                        }
                    }
                }
            }
            .instrument(span),
        )
    }

    async fn run_script_generation(
        &self,
        generator: Arc<dyn ScriptGenerator>,
        project_id: i64,
        document_context: Option<String>,
    ) -> PipelineResult<()> {
        let project = self.load_project(project_id).await?;
        let questioner = CharacterRepo::find_by_id(&self.pool, project.questioner_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Questioner character not found"))?;
        let explainer = CharacterRepo::find_by_id(&self.pool, project.explainer_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Explainer character not found"))?;

        let request = ScriptRequest {
            topic: project.topic.clone(),
            context_style: project.context_style,
            questioner_name: questioner.name,
            explainer_name: explainer.name,
            target_duration_seconds: u32::try_from(project.target_duration_seconds).unwrap_or(45),
            document_context,
        };
        let script = generator.generate_script(&request).await?;

        ProjectRepo::update_script(&self.pool, project_id, &script)
            .await?
            .ok_or_else(|| PipelineError::invalid_state("Project left DRAFT during script generation"))?;
        SceneRepo::replace_for_project(&self.pool, project_id, &script.lines).await?;
        info!(project_id, lines = script.lines.len(), "Script stored");
        Ok(())
    }

    async fn run_voiceover(
        &self,
        voiceover: Arc<VoiceoverService>,
        project_id: i64,
    ) -> PipelineResult<()> {
        let project = self.load_project(project_id).await?;
        let script = project
            .script()
            .ok_or_else(|| PipelineError::invalid_state("Project has no script"))?;

        let result = voiceover
            .generate(script, &self.config.voiceovers_dir(project_id))
            .await?;
        SceneRepo::update_audio(&self.pool, project_id, &result.segments).await?;

        ProjectRepo::set_voiceover(
            &self.pool,
            project_id,
            &result.combined_audio_path.to_string_lossy(),
            result.total_duration_seconds,
        )
        .await?
        .ok_or_else(|| PipelineError::invalid_state("Project left APPROVED during voiceover"))?;
        Ok(())
    }

    async fn run_render(
        &self,
        project_id: i64,
        background: PathBuf,
        voiceover: PathBuf,
    ) -> PipelineResult<RenderResult> {
        let project = self.load_project(project_id).await?;
        let script = project
            .script()
            .cloned()
            .ok_or_else(|| PipelineError::invalid_state("Project has no script"))?;

        let request = RenderRequest {
            script,
            background,
            voiceover,
            music: self.resolve_music(&project).await?,
            characters: self.load_characters(&project).await?,
            segments: measured_segments(&SceneRepo::list_for_project(&self.pool, project_id).await?),
            output: self.config.video_path(project_id),
        };

        let progress = JobLogger::new(project_id, "render").progress_reporter();
        let result = self.renderer.render(&request, progress).await?;
        ProjectRepo::set_output(
            &self.pool,
            project_id,
            &result.output_path.to_string_lossy(),
            result.duration_seconds,
        )
        .await?
        .ok_or_else(|| PipelineError::invalid_state("Project left RENDERING during render"))?;
        Ok(result)
    }

    /// Project's own background, else one for its style, else any.
    async fn resolve_background(&self, project: &VideoProject) -> PipelineResult<PathBuf> {
        if let Some(id) = project.background_id {
            match AssetRepo::find_background(&self.pool, id).await? {
                Some(bg) if Path::new(&bg.file_path).is_file() => return Ok(bg.file_path.into()),
                Some(bg) => warn!(project_id = project.id, "Background file missing: {}", bg.file_path),
                None => warn!(project_id = project.id, background_id = id, "Background not found"),
            }
        }
        AssetRepo::pick_background(&self.pool, project.context_style)
            .await?
            .map(|bg| PathBuf::from(bg.file_path))
            .filter(|p| p.is_file())
            .ok_or_else(|| PipelineError::invalid_state("No background image available for rendering"))
    }

    async fn resolve_music(&self, project: &VideoProject) -> PipelineResult<Option<PathBuf>> {
        let Some(id) = project.background_music_id else {
            return Ok(None);
        };
        match AssetRepo::find_music(&self.pool, id).await? {
            Some(music) if Path::new(&music.file_path).is_file() => Ok(Some(music.file_path.into())),
            Some(music) => {
                warn!(project_id = project.id, "Music file missing, rendering without: {}", music.file_path);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn load_characters(&self, project: &VideoProject) -> PipelineResult<CharacterAssetSet> {
        let mut set = CharacterAssetSet::new();
        for (role, character_id) in [
            (CharacterRole::Questioner, project.questioner_id),
            (CharacterRole::Explainer, project.explainer_id),
        ] {
            let mut poses = PoseSet::new();
            for asset in CharacterRepo::list_assets(&self.pool, character_id).await? {
                if let Err(e) = poses.insert(&asset.pose, &asset.file_path) {
                    warn!(project_id = project.id, character_id, pose = %asset.pose, "Skipping pose: {}", e);
                }
            }
            set.set(role, poses);
        }
        Ok(set)
    }
}

/// Segments for every scene, or `None` unless all scenes were measured.
fn measured_segments(scenes: &[VideoScene]) -> Option<Vec<explainer_models::AudioSegment>> {
    if scenes.is_empty() {
        return None;
    }
    scenes.iter().map(VideoScene::audio_segment).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(n: i64, measured: bool) -> VideoScene {
        VideoScene {
            id: n,
            project_id: 1,
            scene_number: n,
            speaker_role: CharacterRole::Questioner,
            speaker_name: "Q".into(),
            line: "Hi".into(),
            pose: "standing".into(),
            voiceover_path: measured.then(|| format!("/v/scene_{n:03}.mp3")),
            start_time: measured.then_some(0.0),
            duration_seconds: measured.then_some(1.0),
        }
    }

    #[test]
    fn test_measured_segments_all_or_nothing() {
        assert!(measured_segments(&[]).is_none());
        assert_eq!(measured_segments(&[scene(1, true), scene(2, true)]).unwrap().len(), 2);
        assert!(measured_segments(&[scene(1, true), scene(2, false)]).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_services() {
        let pool = explainer_db::connect_in_memory().await.unwrap();
        let pipeline = VideoPipeline::new(pool, PipelineConfig::default());
        assert!(matches!(
            pipeline.start_script_generation(1, None).await,
            Err(PipelineError::NotConfigured(_))
        ));
        assert!(matches!(
            pipeline.list_voices().await,
            Err(PipelineError::NotConfigured(_))
        ));
        let settings = pipeline.voice_settings().await;
        assert_eq!(settings.explainer_voice, crate::config::DEFAULT_EXPLAINER_VOICE);
    }
}
