//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::assets::{
    delete_background, delete_music, list_backgrounds, list_music, upload_background,
    upload_music,
};
use crate::handlers::characters::{
    create_character, delete_character, delete_character_asset, get_character, list_characters,
    update_character, upload_character_asset,
};
use crate::handlers::projects::{
    approve_project, create_project, delete_project, download_video, get_project, list_projects,
    list_scenes, preview_audio, reject_project, regenerate_script, render_project, update_script,
};
use crate::handlers::settings::{extract_topics, get_settings, list_voices, update_settings};
use crate::handlers::{api_info, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let character_routes = Router::new()
        .route("/characters", post(create_character).get(list_characters))
        .route(
            "/characters/:id",
            get(get_character)
                .patch(update_character)
                .delete(delete_character),
        )
        .route("/characters/:id/assets", post(upload_character_asset))
        .route(
            "/characters/:id/assets/:asset_id",
            delete(delete_character_asset),
        );

    let asset_routes = Router::new()
        .route("/backgrounds", post(upload_background).get(list_backgrounds))
        .route("/backgrounds/:id", delete(delete_background))
        .route("/music", post(upload_music).get(list_music))
        .route("/music/:id", delete(delete_music));

    let project_routes = Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:id", get(get_project).delete(delete_project))
        .route("/projects/:id/script", patch(update_script))
        .route("/projects/:id/approve", post(approve_project))
        .route("/projects/:id/reject", post(reject_project))
        .route("/projects/:id/regenerate", post(regenerate_script))
        .route("/projects/:id/render", post(render_project))
        .route("/projects/:id/download", get(download_video))
        .route("/projects/:id/preview-audio", get(preview_audio))
        .route("/projects/:id/scenes", get(list_scenes));

    let settings_routes = Router::new()
        .route("/topics", post(extract_topics))
        .route("/voices", get(list_voices))
        .route("/settings", get(get_settings).post(update_settings));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let video_routes = Router::new()
        .merge(character_routes)
        .merge(asset_routes)
        .merge(project_routes)
        .merge(settings_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api", get(api_info));

    let metrics_routes = match metrics_handle {
        Some(handle) => {
            Router::new().route("/metrics", get(move || async move { handle.render() }))
        }
        None => Router::new(),
    };

    // Layers run outermost-last: CORS sees the request first
    Router::new()
        .nest("/api/video", video_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Uploads are bounded by MAX_UPLOAD_MB instead of axum's 2 MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size()))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
