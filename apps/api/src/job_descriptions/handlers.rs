use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::handlers::UserIdQuery;
use crate::analysis::validation::{
    validate_job_description, validate_job_title, validate_saved_job_description,
    validate_user_id, ValidationResult,
};
use crate::errors::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::job_descriptions::repository::{get_owned, search_job_descriptions};
use crate::models::job_description::{JobDescription, JobDescriptionUpdate, NewJobDescription};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct SaveJobDescriptionRequest {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
}

#[derive(Serialize)]
pub struct JobDescriptionListResponse {
    pub job_descriptions: Vec<JobDescription>,
}

/// POST /api/v1/job-descriptions
pub async fn handle_save_job_description(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveJobDescriptionRequest>,
) -> Result<(StatusCode, Json<JobDescription>), AppError> {
    validate_saved_job_description(&req.user_id, &req.title, &req.description).into_result()?;

    let jd = state
        .job_descriptions
        .create(NewJobDescription {
            user_id: req.user_id,
            title: req.title,
            description: req.description,
            company: req.company,
        })
        .await?;

    info!(
        "Job description {} saved for user {} ({} keywords)",
        jd.id,
        jd.user_id,
        jd.metadata.extracted_keywords.len()
    );
    Ok((StatusCode::CREATED, Json(jd)))
}

#[derive(Deserialize)]
pub struct ListJobDescriptionsQuery {
    pub user_id: String,
    pub limit: Option<usize>,
}

/// GET /api/v1/job-descriptions
pub async fn handle_list_job_descriptions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListJobDescriptionsQuery>,
) -> Result<Json<JobDescriptionListResponse>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let job_descriptions = state
        .job_descriptions
        .list_active(&params.user_id, limit)
        .await?;
    Ok(Json(JobDescriptionListResponse { job_descriptions }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub user_id: String,
    pub q: String,
}

/// GET /api/v1/job-descriptions/search
pub async fn handle_search_job_descriptions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> Result<Json<JobDescriptionListResponse>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    if params.q.trim().is_empty() {
        return Err(AppError::Validation("Search term is required".into()));
    }

    let job_descriptions =
        search_job_descriptions(state.job_descriptions.as_ref(), &params.user_id, &params.q)
            .await?;
    Ok(Json(JobDescriptionListResponse { job_descriptions }))
}

/// GET /api/v1/job-descriptions/:id
pub async fn handle_get_job_description(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<Json<JobDescription>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let jd = get_owned(state.job_descriptions.as_ref(), id, &params.user_id).await?;
    Ok(Json(jd))
}

#[derive(Deserialize)]
pub struct UpdateJobDescriptionRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub changes: JobDescriptionUpdate,
}

/// PUT /api/v1/job-descriptions/:id
pub async fn handle_update_job_description(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateJobDescriptionRequest>,
) -> Result<Json<JobDescription>, AppError> {
    validate_update(&req).into_result()?;

    let jd = state
        .job_descriptions
        .update(id, &req.user_id, req.changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))?;

    info!("Job description {id} updated for user {}", jd.user_id);
    Ok(Json(jd))
}

fn validate_update(req: &UpdateJobDescriptionRequest) -> ValidationResult {
    let mut errors = validate_user_id(&req.user_id).errors;
    if req.changes.is_empty() {
        errors.push("At least one field must be updated".to_string());
    }
    if let Some(title) = &req.changes.title {
        errors.extend(validate_job_title(title).errors);
    }
    if let Some(description) = &req.changes.description {
        errors.extend(validate_job_description(description).errors);
    }
    ValidationResult::from_errors(errors)
}

/// DELETE /api/v1/job-descriptions/:id
pub async fn handle_delete_job_description(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    if !state
        .job_descriptions
        .delete(id, &params.user_id)
        .await?
    {
        return Err(AppError::NotFound(format!("Job description {id} not found")));
    }
    info!("Deleted job description {id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}
