//! Background image and music handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use explainer_db::{
    AssetRepo, BackgroundAsset, CreateBackgroundAsset, CreateMusicAsset, DbId, MusicAsset,
};
use explainer_models::ContextStyle;
use explainer_pipeline::AssetStore;
use serde::Deserialize;
use tracing::{info, warn};

use super::characters::remove_file;
use super::upload::UploadForm;
use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StyleQuery {
    pub context_style: Option<ContextStyle>,
}

/// POST /api/video/backgrounds
///
/// Multipart with `name`, optional `context_style`, and a `file` image.
pub async fn upload_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<BackgroundAsset>)> {
    let form = UploadForm::read(multipart, AssetStore::validate_image_name).await?;
    let name = form.required("name")?.to_string();
    let style = form.parsed::<ContextStyle>("context_style")?;

    let path = state
        .pipeline
        .assets()
        .save_background(style, &name, &form.file.filename, &form.file.bytes)
        .await?;
    let background = AssetRepo::create_background(
        &state.pool,
        &CreateBackgroundAsset {
            name,
            context_style: style,
            file_path: path.to_string_lossy().into_owned(),
            file_size_bytes: form.file.bytes.len() as i64,
        },
    )
    .await?;
    metrics::record_upload("background");
    info!(background_id = background.id, "Stored background");

    Ok((StatusCode::CREATED, Json(background)))
}

/// GET /api/video/backgrounds
pub async fn list_backgrounds(
    State(state): State<AppState>,
    Query(query): Query<StyleQuery>,
) -> ApiResult<Json<Vec<BackgroundAsset>>> {
    Ok(Json(
        AssetRepo::list_backgrounds(&state.pool, query.context_style).await?,
    ))
}

/// DELETE /api/video/backgrounds/:id
///
/// Projects that picked this background fall back to the style default.
pub async fn delete_background(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    let background = AssetRepo::delete_background(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Background not found"))?;
    remove_file(state.pipeline.assets(), &background.file_path).await;
    Ok(Json(StatusResponse::new("deleted")))
}

/// POST /api/video/music
///
/// Same form as backgrounds with an audio `file`. The track length is
/// probed when FFprobe is available.
pub async fn upload_music(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MusicAsset>)> {
    let form = UploadForm::read(multipart, AssetStore::validate_audio_name).await?;
    let name = form.required("name")?.to_string();
    let style = form.parsed::<ContextStyle>("context_style")?;

    let path = state
        .pipeline
        .assets()
        .save_music(style, &name, &form.file.filename, &form.file.bytes)
        .await?;

    let duration_seconds =
        match explainer_media::probe_duration(&state.pipeline.config().ffprobe_path, &path).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                warn!(path = %path.display(), "Could not probe music duration: {}", e);
                None
            }
        };

    let music = AssetRepo::create_music(
        &state.pool,
        &CreateMusicAsset {
            name,
            context_style: style,
            file_path: path.to_string_lossy().into_owned(),
            file_size_bytes: form.file.bytes.len() as i64,
            duration_seconds,
        },
    )
    .await?;
    metrics::record_upload("music");
    info!(music_id = music.id, "Stored music track");

    Ok((StatusCode::CREATED, Json(music)))
}

/// GET /api/video/music
pub async fn list_music(
    State(state): State<AppState>,
    Query(query): Query<StyleQuery>,
) -> ApiResult<Json<Vec<MusicAsset>>> {
    Ok(Json(AssetRepo::list_music(&state.pool, query.context_style).await?))
}

/// DELETE /api/video/music/:id
pub async fn delete_music(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    let music = AssetRepo::delete_music(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Music not found"))?;
    remove_file(state.pipeline.assets(), &music.file_path).await;
    Ok(Json(StatusResponse::new("deleted")))
}
