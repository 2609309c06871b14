//! Analysis persistence behind a trait so the engine never touches storage.
//!
//! `PgAnalysisRepository` is used when `DATABASE_URL` is set;
//! `InMemoryAnalysisRepository` otherwise (and in tests).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{Analysis, AnalysisRow, NewAnalysis, UserFeedback};

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn create(&self, new: NewAnalysis) -> Result<Analysis, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError>;

    /// Newest first.
    async fn list_by_owner(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Analysis>, AppError>;

    /// Returns `false` when no analysis with that id belongs to `user_id`.
    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError>;

    /// Returns `false` when no analysis with that id belongs to `user_id`.
    async fn attach_feedback(
        &self,
        id: Uuid,
        user_id: &str,
        feedback: UserFeedback,
    ) -> Result<bool, AppError>;
}

/// Resolves an analysis owned by `user_id`, or `NotFound`.
///
/// Analyses owned by someone else are reported as missing.
pub async fn get_owned(
    repo: &dyn AnalysisRepository,
    id: Uuid,
    user_id: &str,
) -> Result<Analysis, AppError> {
    repo.get(id)
        .await?
        .filter(|a| a.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgAnalysisRepository {
    pool: PgPool,
}

impl PgAnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisRepository for PgAnalysisRepository {
    async fn create(&self, new: NewAnalysis) -> Result<Analysis, AppError> {
        let id = Uuid::new_v4();

        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analyses
                (id, user_id, resume_id, job_description, scores, keywords, recommendations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&new.user_id)
        .bind(&new.resume_id)
        .bind(&new.job_description)
        .bind(Json(&new.scores))
        .bind(Json(&new.keywords))
        .bind(Json(&new.recommendations))
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted analysis {id} for user {}", new.user_id);
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError> {
        let row = sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Analysis::from))
    }

    async fn list_by_owner(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Analysis>, AppError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM analyses
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Analysis::from).collect())
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn attach_feedback(
        &self,
        id: Uuid,
        user_id: &str,
        feedback: UserFeedback,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE analyses SET feedback = $1 WHERE id = $2 AND user_id = $3")
                .bind(Json(&feedback))
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store holding at most `limit` analyses per user, newest first.
pub struct InMemoryAnalysisRepository {
    analyses: RwLock<Vec<Analysis>>,
    limit: usize,
}

impl InMemoryAnalysisRepository {
    pub fn new(limit: usize) -> Self {
        Self {
            analyses: RwLock::new(Vec::new()),
            limit,
        }
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn create(&self, new: NewAnalysis) -> Result<Analysis, AppError> {
        let analysis = new.into_analysis(Uuid::new_v4(), Utc::now());
        let mut analyses = self.analyses.write().await;
        analyses.insert(0, analysis.clone());

        // Retention is per owner: only the creator's oldest records are evicted.
        let mut kept = 0;
        analyses.retain(|a| {
            if a.user_id != analysis.user_id {
                return true;
            }
            kept += 1;
            kept <= self.limit
        });
        Ok(analysis)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError> {
        Ok(self
            .analyses
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_by_owner(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Analysis>, AppError> {
        Ok(self
            .analyses
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let mut analyses = self.analyses.write().await;
        let before = analyses.len();
        analyses.retain(|a| !(a.id == id && a.user_id == user_id));
        Ok(analyses.len() < before)
    }

    async fn attach_feedback(
        &self,
        id: Uuid,
        user_id: &str,
        feedback: UserFeedback,
    ) -> Result<bool, AppError> {
        let mut analyses = self.analyses.write().await;
        match analyses
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        {
            Some(analysis) => {
                analysis.feedback = Some(feedback);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
