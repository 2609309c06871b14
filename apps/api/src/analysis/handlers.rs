use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::comparison::{compare_by_id, ComparisonResult};
use crate::analysis::engine::analyze;
use crate::analysis::export::{analyses_to_csv, EXPORT_FILE_NAME};
use crate::analysis::profile::{profile_document, DocumentProfile};
use crate::analysis::repository::get_owned;
use crate::analysis::stats::{compute_stats, AnalysisStats};
use crate::analysis::validation::{
    validate_analysis_request, validate_feedback_rating, validate_user_id,
};
use crate::errors::AppError;
use crate::extraction::{extract_text, UploadedDocument};
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::job_descriptions::repository::get_owned as get_owned_job_description;
use crate::models::analysis::{Analysis, NewAnalysis, UserFeedback};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct CreateAnalysisRequest {
    pub user_id: String,
    pub resume_id: Option<String>,
    pub resume_text: String,
    /// May be left empty when `job_description_id` names a saved description.
    #[serde(default)]
    pub job_description: String,
    pub job_description_id: Option<Uuid>,
}

/// POST /api/v1/analyses
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateAnalysisRequest>,
) -> Result<(StatusCode, Json<Analysis>), AppError> {
    let mut job_description = req.job_description;
    if let Some(jd_id) = req.job_description_id {
        validate_user_id(&req.user_id).into_result()?;
        let saved =
            get_owned_job_description(state.job_descriptions.as_ref(), jd_id, &req.user_id)
                .await?;
        if job_description.trim().is_empty() {
            job_description = saved.description;
        }
    }

    validate_analysis_request(&req.user_id, &req.resume_text, &job_description)
        .into_result()?;

    let report = analyze(
        state.recommender.as_ref(),
        &req.resume_text,
        &job_description,
    )
    .await;

    let analysis = state
        .repository
        .create(NewAnalysis::new(
            req.user_id,
            req.resume_id,
            &job_description,
            report,
        ))
        .await?;

    if let Some(jd_id) = req.job_description_id {
        state
            .job_descriptions
            .increment_analysis_count(jd_id, &analysis.user_id)
            .await?;
    }

    info!(
        "Analysis {} for user {}: overall {} ({} of {} keywords matched, recommendations by {})",
        analysis.id,
        analysis.user_id,
        analysis.scores.overall,
        analysis.keywords.matched_count,
        analysis.keywords.total,
        analysis.recommendations.generated_by
    );
    Ok((StatusCode::CREATED, Json(analysis)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub user_id: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
pub struct AnalysisListResponse {
    pub analyses: Vec<Analysis>,
    pub has_more: bool,
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListQuery>,
) -> Result<Json<AnalysisListResponse>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    // One extra row tells us whether another page exists.
    let mut analyses = state
        .repository
        .list_by_owner(&params.user_id, limit + 1, offset)
        .await?;
    let has_more = analyses.len() > limit;
    analyses.truncate(limit);

    Ok(Json(AnalysisListResponse { analyses, has_more }))
}

/// GET /api/v1/analyses/stats
pub async fn handle_analysis_stats(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<Json<AnalysisStats>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let analyses = state
        .repository
        .list_by_owner(&params.user_id, usize::MAX, 0)
        .await?;
    Ok(Json(compute_stats(&analyses)))
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub user_id: String,
    pub first: Uuid,
    pub second: Uuid,
}

/// GET /api/v1/analyses/compare
pub async fn handle_compare_analyses(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CompareQuery>,
) -> Result<Json<ComparisonResult>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let result = compare_by_id(
        state.repository.as_ref(),
        &params.user_id,
        params.first,
        params.second,
    )
    .await?;
    Ok(Json(result))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<Json<Analysis>, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let analysis = get_owned(state.repository.as_ref(), id, &params.user_id).await?;
    Ok(Json(analysis))
}

/// DELETE /api/v1/analyses/:id
pub async fn handle_delete_analysis(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    if !state.repository.delete(id, &params.user_id).await? {
        return Err(AppError::NotFound(format!("Analysis {id} not found")));
    }
    info!("Deleted analysis {id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/analyses/export.csv
pub async fn handle_export_analyses(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&params.user_id).into_result()?;
    let analyses = state
        .repository
        .list_by_owner(&params.user_id, usize::MAX, 0)
        .await?;
    let csv = analyses_to_csv(&analyses)?;

    info!(
        "Exported {} analyses for user {}",
        analyses.len(),
        params.user_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    ))
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub helpful: bool,
}

/// PUT /api/v1/analyses/:id/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<FeedbackRequest>,
) -> Result<Json<Analysis>, AppError> {
    validate_user_id(&req.user_id).into_result()?;
    validate_feedback_rating(req.rating).into_result()?;

    let feedback = UserFeedback {
        rating: req.rating,
        comment: req.comment.filter(|c| !c.trim().is_empty()),
        helpful: req.helpful,
        submitted_at: Utc::now(),
    };
    if !state
        .repository
        .attach_feedback(id, &req.user_id, feedback)
        .await?
    {
        return Err(AppError::NotFound(format!("Analysis {id} not found")));
    }

    let analysis = get_owned(state.repository.as_ref(), id, &req.user_id).await?;
    Ok(Json(analysis))
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub file_name: String,
    pub text: String,
    pub profile: DocumentProfile,
}

/// POST /api/v1/resumes/extract
pub async fn handle_extract_resume(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>, AppError> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        upload = Some(UploadedDocument {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Multipart field 'file' is required".into()))?;
    let text = extract_text(&upload).await?;
    let profile = profile_document(&text);

    Ok(Json(ExtractResponse {
        file_name: upload.file_name,
        text,
        profile,
    }))
}
