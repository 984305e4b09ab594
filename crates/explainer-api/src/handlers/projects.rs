//! Video project handlers.
//!
//! Slow work (script, voiceover, render) runs in background tasks owned by
//! the pipeline; these handlers return as soon as the task is accepted and
//! clients poll `GET /projects/:id` for the status.

use std::path::PathBuf;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use explainer_db::{
    AssetRepo, CharacterRepo, CreateVideoProject, DbId, DbPool, ProjectFilter, ProjectRepo,
    SceneRepo, VideoProject, VideoScene,
};
use explainer_models::{
    CharacterRole, ContextStyle, DialogueLine, DialogueScript, ProjectStatus, DEFAULT_POSE,
    DEFAULT_TARGET_DURATION_SECS,
};
use explainer_pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
    #[serde(default)]
    pub context_style: ContextStyle,
    pub document_id: Option<String>,
    /// Source text handed to the script writer; not stored
    #[validate(length(max = 100000))]
    pub document_context: Option<String>,
    pub questioner_id: DbId,
    pub explainer_id: DbId,
    pub background_id: Option<DbId>,
    pub background_music_id: Option<DbId>,
    #[validate(range(min = 10, max = 300))]
    pub target_duration_seconds: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ScriptLineInput {
    pub speaker_role: CharacterRole,
    #[validate(length(min = 1, max = 100))]
    pub speaker_name: String,
    #[validate(length(min = 1, max = 1000))]
    pub line: String,
    pub pose: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScriptRequest {
    #[validate(length(min = 1), nested)]
    pub lines: Vec<ScriptLineInput>,
    pub takeaway: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 2000))]
    pub notes: String,
}

async fn find_project(pool: &DbPool, id: DbId) -> ApiResult<VideoProject> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

async fn require_character(
    pool: &DbPool,
    id: DbId,
    role: CharacterRole,
) -> ApiResult<()> {
    let found = CharacterRepo::find_by_id(pool, id).await?.is_some();
    if !found {
        let label = match role {
            CharacterRole::Questioner => "Questioner",
            CharacterRole::Explainer => "Explainer",
        };
        return Err(ApiError::bad_request(format!("{label} character not found")));
    }
    Ok(())
}

/// POST /api/video/projects
///
/// Inserts a DRAFT project and starts writing its script.
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<VideoProject>)> {
    if !state.pipeline.is_script_generation_configured() {
        return Err(PipelineError::NotConfigured("Script generation").into());
    }
    request.validate()?;

    require_character(&state.pool, request.questioner_id, CharacterRole::Questioner).await?;
    require_character(&state.pool, request.explainer_id, CharacterRole::Explainer).await?;
    if let Some(id) = request.background_id {
        if AssetRepo::find_background(&state.pool, id).await?.is_none() {
            return Err(ApiError::bad_request("Background not found"));
        }
    }
    if let Some(id) = request.background_music_id {
        if AssetRepo::find_music(&state.pool, id).await?.is_none() {
            return Err(ApiError::bad_request("Music not found"));
        }
    }

    let project = ProjectRepo::create(
        &state.pool,
        &CreateVideoProject {
            title: request.title.trim().to_string(),
            topic: request.topic.trim().to_string(),
            context_style: request.context_style,
            document_id: request.document_id,
            questioner_id: request.questioner_id,
            explainer_id: request.explainer_id,
            background_id: request.background_id,
            background_music_id: request.background_music_id,
            target_duration_seconds: request
                .target_duration_seconds
                .unwrap_or(i64::from(DEFAULT_TARGET_DURATION_SECS)),
        },
    )
    .await?;
    info!(project_id = project.id, topic = %project.topic, "Created project");

    state
        .pipeline
        .start_script_generation(project.id, request.document_context)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/video/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Vec<VideoProject>>> {
    let filter = ProjectFilter::new(query.status, query.limit, query.offset);
    Ok(Json(ProjectRepo::list(&state.pool, &filter).await?))
}

/// GET /api/video/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<VideoProject>> {
    Ok(Json(find_project(&state.pool, id).await?))
}

/// PATCH /api/video/projects/:id/script
///
/// Replaces the whole script of a DRAFT project. Lines are renumbered in the
/// order given.
pub async fn update_script(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(request): Json<UpdateScriptRequest>,
) -> ApiResult<Json<VideoProject>> {
    request.validate()?;
    let project = find_project(&state.pool, id).await?;

    let takeaway = request
        .takeaway
        .or_else(|| project.takeaway.clone())
        .unwrap_or_default();
    let lines = request
        .lines
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let mut line = DialogueLine::new(
                input.speaker_role,
                input.speaker_name,
                input.line,
                i as u32 + 1,
            );
            line.pose = input
                .pose
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_POSE.to_string());
            line
        })
        .collect();
    let script = DialogueScript {
        topic: project.topic.clone(),
        context_style: project.context_style,
        lines,
        takeaway,
        target_duration_seconds: u32::try_from(project.target_duration_seconds)
            .unwrap_or(DEFAULT_TARGET_DURATION_SECS),
    };

    Ok(Json(state.pipeline.update_script(id, script).await?))
}

/// DELETE /api/video/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    state.pipeline.delete_project(id).await?;
    info!(project_id = id, "Deleted project");
    Ok(Json(StatusResponse::new("deleted")))
}

/// POST /api/video/projects/:id/approve
///
/// Locks the script and starts the voiceover.
pub async fn approve_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ApproveRequest>>,
) -> ApiResult<Json<StatusResponse>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    state
        .pipeline
        .approve(id, request.reviewed_by.as_deref())
        .await?;
    Ok(Json(
        StatusResponse::new("approved").with_message("Voiceover generation started"),
    ))
}

/// POST /api/video/projects/:id/reject
///
/// Back to DRAFT with the reviewer's notes as the error message.
pub async fn reject_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(request): Json<RejectRequest>,
) -> ApiResult<Json<VideoProject>> {
    request.validate()?;
    Ok(Json(state.pipeline.reject(id, request.notes.trim()).await?))
}

/// POST /api/video/projects/:id/regenerate
pub async fn regenerate_script(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    state.pipeline.start_regeneration(id).await?;
    Ok(Json(
        StatusResponse::new("regenerating").with_message("Script generation started"),
    ))
}

/// POST /api/video/projects/:id/render
pub async fn render_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    state.pipeline.start_render(id).await?;
    Ok(Json(
        StatusResponse::new("rendering").with_message("Video rendering started"),
    ))
}

/// GET /api/video/projects/:id/download
pub async fn download_video(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Response> {
    let project = find_project(&state.pool, id).await?;
    let path = existing_file(project.output_path.as_deref())
        .await
        .ok_or_else(|| ApiError::not_found("Video not yet rendered"))?;
    let bytes = tokio::fs::read(&path).await?;
    let disposition = format!("attachment; filename=\"project_{id}.mp4\"");

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/video/projects/:id/preview-audio
pub async fn preview_audio(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Response> {
    let project = find_project(&state.pool, id).await?;
    let path = existing_file(project.voiceover_path.as_deref())
        .await
        .ok_or_else(|| ApiError::not_found("Voiceover not yet generated"))?;
    let bytes = tokio::fs::read(&path).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

/// GET /api/video/projects/:id/scenes
pub async fn list_scenes(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<Vec<VideoScene>>> {
    find_project(&state.pool, id).await?;
    Ok(Json(SceneRepo::list_for_project(&state.pool, id).await?))
}

async fn existing_file(path: Option<&str>) -> Option<PathBuf> {
    let path = PathBuf::from(path?);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Some(path),
        _ => None,
    }
}
