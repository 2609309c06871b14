use std::sync::Arc;

use crate::analysis::recommendations::Recommender;
use crate::analysis::repository::AnalysisRepository;
use crate::config::Config;
use crate::job_descriptions::repository::JobDescriptionRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres when `DATABASE_URL` is set, otherwise the bounded in-memory store.
    pub repository: Arc<dyn AnalysisRepository>,
    /// Saved job-description library, on the same backend as `repository`.
    pub job_descriptions: Arc<dyn JobDescriptionRepository>,
    /// Pluggable recommender. Default: RuleBasedRecommender. Swap via ENABLE_LLM_RECOMMENDATIONS.
    pub recommender: Arc<dyn Recommender>,
    pub config: Config,
}
