mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod extractors;
mod job_descriptions;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::recommendations::{LlmRecommender, Recommender, RuleBasedRecommender};
use crate::analysis::repository::{
    AnalysisRepository, InMemoryAnalysisRepository, PgAnalysisRepository,
};
use crate::config::Config;
use crate::db::create_pool;
use crate::job_descriptions::repository::{
    InMemoryJobDescriptionRepository, JobDescriptionRepository, PgJobDescriptionRepository,
};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    let (repository, job_descriptions) = build_repositories(&config).await?;
    let recommender = build_recommender(&config)?;

    let state = AppState {
        repository,
        job_descriptions,
        recommender,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise bounded in-memory stores.
async fn build_repositories(
    config: &Config,
) -> Result<(
    Arc<dyn AnalysisRepository>,
    Arc<dyn JobDescriptionRepository>,
)> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Ok((
                Arc::new(PgAnalysisRepository::new(pool.clone())),
                Arc::new(PgJobDescriptionRepository::new(pool)),
            ))
        }
        None => {
            warn!(
                "DATABASE_URL not set; keeping at most {} analyses and {} job descriptions per user in memory",
                config.memory_analysis_limit, config.memory_job_description_limit
            );
            Ok((
                Arc::new(InMemoryAnalysisRepository::new(
                    config.memory_analysis_limit,
                )),
                Arc::new(InMemoryJobDescriptionRepository::new(
                    config.memory_job_description_limit,
                )),
            ))
        }
    }
}

/// Rule-based by default; LLM enrichment when ENABLE_LLM_RECOMMENDATIONS=true.
fn build_recommender(config: &Config) -> Result<Arc<dyn Recommender>> {
    if !config.enable_llm_recommendations {
        info!("Using rule-based recommendations");
        return Ok(Arc::new(RuleBasedRecommender));
    }

    let api_key = config
        .anthropic_api_key
        .clone()
        .context("ANTHROPIC_API_KEY is required when LLM recommendations are enabled")?;
    let client = LlmClient::new(api_key, config.llm_timeout)?;
    info!(
        "LLM recommendations enabled (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout.as_secs()
    );
    Ok(Arc::new(LlmRecommender::new(
        Arc::new(client),
        config.llm_timeout,
    )))
}
