//! Job-description persistence. Mirrors the analysis repository: Postgres when
//! `DATABASE_URL` is set, a per-user bounded in-memory store otherwise.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job_description::{
    JobDescription, JobDescriptionRow, JobDescriptionUpdate, NewJobDescription,
};

/// Search scans this many of the newest active entries.
pub const SEARCH_SCAN_LIMIT: usize = 100;
pub const SEARCH_RESULT_LIMIT: usize = 20;

#[async_trait]
pub trait JobDescriptionRepository: Send + Sync {
    async fn create(&self, new: NewJobDescription) -> Result<JobDescription, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<JobDescription>, AppError>;

    /// Active entries only, newest first.
    async fn list_active(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JobDescription>, AppError>;

    /// `None` when no entry with that id belongs to `user_id`.
    async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        update: JobDescriptionUpdate,
    ) -> Result<Option<JobDescription>, AppError>;

    /// Returns `false` when no entry with that id belongs to `user_id`.
    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError>;

    /// Bumps `analyses_count` and stamps `last_analyzed_at`.
    /// Returns `false` when no entry with that id belongs to `user_id`.
    async fn increment_analysis_count(&self, id: Uuid, user_id: &str) -> Result<bool, AppError>;
}

/// Resolves a job description owned by `user_id`, or `NotFound`.
pub async fn get_owned(
    repo: &dyn JobDescriptionRepository,
    id: Uuid,
    user_id: &str,
) -> Result<JobDescription, AppError> {
    repo.get(id)
        .await?
        .filter(|jd| jd.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))
}

/// Case-insensitive search over title, description and company of the user's
/// newest active entries.
pub async fn search_job_descriptions(
    repo: &dyn JobDescriptionRepository,
    user_id: &str,
    term: &str,
) -> Result<Vec<JobDescription>, AppError> {
    let needle = term.trim().to_lowercase();
    let candidates = repo.list_active(user_id, SEARCH_SCAN_LIMIT).await?;
    Ok(candidates
        .into_iter()
        .filter(|jd| jd.matches(&needle))
        .take(SEARCH_RESULT_LIMIT)
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgJobDescriptionRepository {
    pool: PgPool,
}

impl PgJobDescriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobDescriptionRepository for PgJobDescriptionRepository {
    async fn create(&self, new: NewJobDescription) -> Result<JobDescription, AppError> {
        let jd = new.into_job_description(Uuid::new_v4(), Utc::now());

        let row = sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            INSERT INTO job_descriptions
                (id, user_id, title, description, company, is_active, analyses_count,
                 metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(jd.id)
        .bind(&jd.user_id)
        .bind(&jd.title)
        .bind(&jd.description)
        .bind(&jd.company)
        .bind(jd.is_active)
        .bind(jd.analyses_count)
        .bind(Json(&jd.metadata))
        .bind(jd.created_at)
        .bind(jd.updated_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved job description {} for user {}", jd.id, jd.user_id);
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobDescription>, AppError> {
        let row = sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT * FROM job_descriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobDescription::from))
    }

    async fn list_active(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JobDescription>, AppError> {
        let rows = sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            SELECT * FROM job_descriptions
            WHERE user_id = $1 AND is_active
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(JobDescription::from).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        update: JobDescriptionUpdate,
    ) -> Result<Option<JobDescription>, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT * FROM job_descriptions WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut jd = JobDescription::from(current);
        jd.apply(update, Utc::now());

        let row = sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            UPDATE job_descriptions
            SET title = $1, description = $2, company = $3, is_active = $4,
                metadata = $5, updated_at = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&jd.title)
        .bind(&jd.description)
        .bind(&jd.company)
        .bind(jd.is_active)
        .bind(Json(&jd.metadata))
        .bind(jd.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_descriptions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_analysis_count(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE job_descriptions
            SET analyses_count = analyses_count + 1,
                last_analyzed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
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

/// Process-local store holding at most `limit` job descriptions per user, newest first.
pub struct InMemoryJobDescriptionRepository {
    entries: RwLock<Vec<JobDescription>>,
    limit: usize,
}

impl InMemoryJobDescriptionRepository {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            limit,
        }
    }
}

#[async_trait]
impl JobDescriptionRepository for InMemoryJobDescriptionRepository {
    async fn create(&self, new: NewJobDescription) -> Result<JobDescription, AppError> {
        let jd = new.into_job_description(Uuid::new_v4(), Utc::now());
        let mut entries = self.entries.write().await;
        entries.insert(0, jd.clone());

        let mut kept = 0;
        entries.retain(|e| {
            if e.user_id != jd.user_id {
                return true;
            }
            kept += 1;
            kept <= self.limit
        });
        Ok(jd)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobDescription>, AppError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list_active(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JobDescription>, AppError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id && e.is_active)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        update: JobDescriptionUpdate,
    ) -> Result<Option<JobDescription>, AppError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .map(|jd| {
                jd.apply(update, Utc::now());
                jd.clone()
            }))
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(entries.len() < before)
    }

    async fn increment_analysis_count(&self, id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        match entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
        {
            Some(jd) => {
                jd.record_analysis(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
