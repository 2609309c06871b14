pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::analysis::handlers;
use crate::extraction::MAX_UPLOAD_BYTES;
use crate::job_descriptions::handlers as jd_handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries and part headers around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analyses
        .route(
            "/api/v1/analyses",
            post(handlers::handle_create_analysis).get(handlers::handle_list_analyses),
        )
        .route(
            "/api/v1/analyses/stats",
            get(handlers::handle_analysis_stats),
        )
        .route(
            "/api/v1/analyses/compare",
            get(handlers::handle_compare_analyses),
        )
        .route(
            "/api/v1/analyses/export.csv",
            get(handlers::handle_export_analyses),
        )
        .route(
            "/api/v1/analyses/:id",
            get(handlers::handle_get_analysis).delete(handlers::handle_delete_analysis),
        )
        .route(
            "/api/v1/analyses/:id/feedback",
            put(handlers::handle_submit_feedback),
        )
        // Job-description library
        .route(
            "/api/v1/job-descriptions",
            post(jd_handlers::handle_save_job_description)
                .get(jd_handlers::handle_list_job_descriptions),
        )
        .route(
            "/api/v1/job-descriptions/search",
            get(jd_handlers::handle_search_job_descriptions),
        )
        .route(
            "/api/v1/job-descriptions/:id",
            get(jd_handlers::handle_get_job_description)
                .put(jd_handlers::handle_update_job_description)
                .delete(jd_handlers::handle_delete_job_description),
        )
        // Résumé upload
        .route(
            "/api/v1/resumes/extract",
            post(handlers::handle_extract_resume)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .with_state(state)
}
