use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::keywords::{extract_keywords, JOB_KEYWORD_LIMIT};

/// A job description saved to a user's library for reuse across analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    /// Inactive entries are hidden from listings and search.
    pub is_active: bool,
    pub analyses_count: i64,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub metadata: JobDescriptionMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived from `description`; recomputed whenever the description changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionMetadata {
    pub word_count: usize,
    pub character_count: usize,
    pub extracted_keywords: Vec<String>,
}

impl JobDescriptionMetadata {
    pub fn from_description(description: &str) -> Self {
        Self {
            word_count: description.split_whitespace().count(),
            character_count: description.chars().count(),
            extracted_keywords: extract_keywords(description, JOB_KEYWORD_LIMIT),
        }
    }
}

/// Input for `JobDescriptionRepository::create`.
#[derive(Debug, Clone)]
pub struct NewJobDescription {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
}

impl NewJobDescription {
    pub fn into_job_description(self, id: Uuid, now: DateTime<Utc>) -> JobDescription {
        let metadata = JobDescriptionMetadata::from_description(&self.description);
        JobDescription {
            id,
            user_id: self.user_id,
            title: self.title.trim().to_string(),
            description: self.description,
            company: normalize_company(self.company),
            is_active: true,
            analyses_count: 0,
            last_analyzed_at: None,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left untouched. An empty `company` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDescriptionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub is_active: Option<bool>,
}

impl JobDescriptionUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.company.is_none()
            && self.is_active.is_none()
    }
}

impl JobDescription {
    pub fn apply(&mut self, update: JobDescriptionUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            if description != self.description {
                self.metadata = JobDescriptionMetadata::from_description(&description);
                self.description = description;
            }
        }
        if update.company.is_some() {
            self.company = normalize_company(update.company);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    pub fn record_analysis(&mut self, now: DateTime<Utc>) {
        self.analyses_count += 1;
        self.last_analyzed_at = Some(now);
        self.updated_at = now;
    }

    /// Case-insensitive substring match on title, description or company.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .company
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

fn normalize_company(company: Option<String>) -> Option<String> {
    company
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Clone, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub is_active: bool,
    pub analyses_count: i64,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub metadata: Json<JobDescriptionMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobDescriptionRow> for JobDescription {
    fn from(row: JobDescriptionRow) -> Self {
        JobDescription {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            company: row.company,
            is_active: row.is_active,
            analyses_count: row.analyses_count,
            last_analyzed_at: row.last_analyzed_at,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
