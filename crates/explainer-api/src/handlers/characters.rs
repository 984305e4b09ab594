//! Character and pose image handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use explainer_db::{
    Character, CharacterAsset, CharacterRepo, CreateCharacter, CreateCharacterAsset, DbId,
    DbPool, UpdateCharacter,
};
use explainer_models::CharacterRole;
use explainer_pipeline::AssetStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::upload::UploadForm;
use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCharacterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub role: CharacterRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCharacterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Option<CharacterRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CharacterListQuery {
    pub role: Option<CharacterRole>,
    #[serde(default)]
    pub active_only: bool,
}

/// A character with its uploaded poses.
#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    #[serde(flatten)]
    pub character: Character,
    pub assets: Vec<CharacterAsset>,
}

async fn with_assets(pool: &DbPool, character: Character) -> ApiResult<CharacterResponse> {
    let assets = CharacterRepo::list_assets(pool, character.id).await?;
    Ok(CharacterResponse { character, assets })
}

async fn find_character(pool: &DbPool, id: DbId) -> ApiResult<Character> {
    CharacterRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Character not found"))
}

/// POST /api/video/characters
pub async fn create_character(
    State(state): State<AppState>,
    Json(request): Json<CreateCharacterRequest>,
) -> ApiResult<(StatusCode, Json<CharacterResponse>)> {
    request.validate()?;
    let character = CharacterRepo::create(
        &state.pool,
        &CreateCharacter {
            name: request.name.trim().to_string(),
            role: request.role,
        },
    )
    .await?;
    info!(character_id = character.id, role = %character.role, "Created character");

    Ok((
        StatusCode::CREATED,
        Json(CharacterResponse {
            character,
            assets: Vec::new(),
        }),
    ))
}

/// GET /api/video/characters
pub async fn list_characters(
    State(state): State<AppState>,
    Query(query): Query<CharacterListQuery>,
) -> ApiResult<Json<Vec<CharacterResponse>>> {
    let characters = CharacterRepo::list(&state.pool, query.role, query.active_only).await?;
    let mut response = Vec::with_capacity(characters.len());
    for character in characters {
        response.push(with_assets(&state.pool, character).await?);
    }
    Ok(Json(response))
}

/// GET /api/video/characters/:id
pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<CharacterResponse>> {
    let character = find_character(&state.pool, id).await?;
    Ok(Json(with_assets(&state.pool, character).await?))
}

/// PATCH /api/video/characters/:id
pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(request): Json<UpdateCharacterRequest>,
) -> ApiResult<Json<CharacterResponse>> {
    request.validate()?;
    let update = UpdateCharacter {
        name: request.name.map(|n| n.trim().to_string()),
        role: request.role,
        is_active: request.is_active,
    };
    let character = CharacterRepo::update(&state.pool, id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Character not found"))?;
    Ok(Json(with_assets(&state.pool, character).await?))
}

/// DELETE /api/video/characters/:id
///
/// Refused with 409 while a project still references the character.
pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<StatusResponse>> {
    let assets = CharacterRepo::list_assets(&state.pool, id).await?;
    let deleted = CharacterRepo::delete(&state.pool, id).await.map_err(|e| {
        if explainer_db::is_foreign_key_violation(&e) {
            ApiError::conflict("Character is used by one or more projects")
        } else {
            e.into()
        }
    })?;
    if !deleted {
        return Err(ApiError::not_found("Character not found"));
    }

    for asset in assets {
        remove_file(state.pipeline.assets(), &asset.file_path).await;
    }
    info!(character_id = id, "Deleted character");
    Ok(Json(StatusResponse::new("deleted")))
}

/// POST /api/video/characters/:id/assets
///
/// Multipart with a `pose` text field and a `file` image. Uploading an
/// existing pose replaces it.
pub async fn upload_character_asset(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CharacterAsset>)> {
    find_character(&state.pool, id).await?;
    let form = UploadForm::read(multipart, AssetStore::validate_image_name).await?;
    let pose = form.required("pose")?.to_lowercase();

    let path = state
        .pipeline
        .assets()
        .save_character_pose(id, &pose, &form.file.filename, &form.file.bytes)
        .await?;
    let asset = CharacterRepo::upsert_asset(
        &state.pool,
        &CreateCharacterAsset {
            character_id: id,
            pose: explainer_pipeline::assets::sanitize_name(&pose),
            file_path: path.to_string_lossy().into_owned(),
            file_size_bytes: form.file.bytes.len() as i64,
        },
    )
    .await?;
    metrics::record_upload("pose");

    Ok((StatusCode::CREATED, Json(asset)))
}

/// DELETE /api/video/characters/:id/assets/:asset_id
pub async fn delete_character_asset(
    State(state): State<AppState>,
    Path((id, asset_id)): Path<(DbId, DbId)>,
) -> ApiResult<Json<StatusResponse>> {
    let asset = CharacterRepo::delete_asset(&state.pool, id, asset_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    remove_file(state.pipeline.assets(), &asset.file_path).await;
    Ok(Json(StatusResponse::new("deleted")))
}

/// Remove a stored file after its row is gone. Failures only warn.
pub(crate) async fn remove_file(store: &AssetStore, path: &str) {
    if let Err(e) = store.delete_file(path).await {
        warn!(path, "Failed to remove asset file: {}", e);
    }
}
