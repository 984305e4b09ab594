//! Application state.

use std::sync::Arc;

use explainer_db::DbPool;
use explainer_pipeline::{PipelineConfig, VideoPipeline};
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub pool: DbPool,
    pub pipeline: VideoPipeline,
}

impl AppState {
    /// Open the database, apply migrations and build the pipeline from the
    /// environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let pool = explainer_db::create_pool(&config.database_url).await?;
        explainer_db::run_migrations(&pool).await?;
        info!("Database ready at {}", config.database_url);

        let pipeline = VideoPipeline::from_config(pool.clone(), PipelineConfig::from_env())?;
        pipeline.assets().ensure_dirs().await?;

        Ok(Self::from_parts(config, pipeline))
    }

    /// State around an already built pipeline.
    pub fn from_parts(config: ApiConfig, pipeline: VideoPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pool: pipeline.pool().clone(),
            pipeline,
        }
    }
}
