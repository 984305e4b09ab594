//! Topic extraction, voice catalogue and voice settings handlers.

use axum::extract::State;
use axum::Json;
use explainer_pipeline::{TopicSuggestion, Voice, VoiceSettings};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::StatusResponse;
use crate::error::ApiResult;
use crate::state::AppState;

fn default_max_topics() -> usize {
    5
}

#[derive(Debug, Deserialize, Validate)]
pub struct TopicsRequest {
    #[validate(length(min = 1))]
    pub document: String,
    #[serde(default = "default_max_topics")]
    #[validate(range(min = 1, max = 20))]
    pub max_topics: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicSuggestion>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVoiceSettingsRequest {
    #[validate(length(min = 1, max = 64))]
    pub questioner_voice: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub explainer_voice: Option<String>,
}

/// POST /api/video/topics
///
/// Suggest video topics found in a document.
pub async fn extract_topics(
    State(state): State<AppState>,
    Json(request): Json<TopicsRequest>,
) -> ApiResult<Json<TopicsResponse>> {
    request.validate()?;
    let topics = state
        .pipeline
        .extract_topics(&request.document, request.max_topics)
        .await?;
    Ok(Json(TopicsResponse { topics }))
}

/// GET /api/video/voices
pub async fn list_voices(State(state): State<AppState>) -> ApiResult<Json<VoicesResponse>> {
    let voices = state.pipeline.list_voices().await?;
    Ok(Json(VoicesResponse { voices }))
}

/// GET /api/video/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<VoiceSettings> {
    Json(state.pipeline.voice_settings().await)
}

/// POST /api/video/settings
///
/// Voice changes apply to the next voiceover and last until restart.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateVoiceSettingsRequest>,
) -> ApiResult<Json<StatusResponse>> {
    request.validate()?;
    let settings = state
        .pipeline
        .update_voice_settings(request.questioner_voice, request.explainer_voice)
        .await?;
    info!(
        questioner_voice = %settings.questioner_voice,
        explainer_voice = %settings.explainer_voice,
        "Updated voice settings"
    );
    Ok(Json(StatusResponse::new("updated")))
}
