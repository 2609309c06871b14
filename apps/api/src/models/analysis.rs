use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::keywords::KeywordAnalysis;
use crate::analysis::recommendations::Recommendations;
use crate::analysis::scoring::ScoreBreakdown;

/// Stored copies of the job description are cut to this many characters.
pub const STORED_JOB_DESCRIPTION_CHARS: usize = 500;

/// A persisted analysis. Immutable after creation except for `feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub user_id: String,
    pub resume_id: Option<String>,
    pub job_description: String,
    pub scores: ScoreBreakdown,
    pub keywords: KeywordAnalysis,
    pub recommendations: Recommendations,
    pub feedback: Option<UserFeedback>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub rating: u8,
    pub comment: Option<String>,
    pub helpful: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Input for `AnalysisRepository::create`; identity and timestamp are assigned there.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub user_id: String,
    pub resume_id: Option<String>,
    pub job_description: String,
    pub scores: ScoreBreakdown,
    pub keywords: KeywordAnalysis,
    pub recommendations: Recommendations,
}

impl NewAnalysis {
    /// Builds the record to persist, truncating the job description copy.
    pub fn new(
        user_id: String,
        resume_id: Option<String>,
        job_description: &str,
        report: crate::analysis::engine::AnalysisReport,
    ) -> Self {
        Self {
            user_id,
            resume_id,
            job_description: truncate_text(job_description, STORED_JOB_DESCRIPTION_CHARS),
            scores: report.scores,
            keywords: report.keywords,
            recommendations: report.recommendations,
        }
    }

    pub fn into_analysis(self, id: Uuid, created_at: DateTime<Utc>) -> Analysis {
        Analysis {
            id,
            user_id: self.user_id,
            resume_id: self.resume_id,
            job_description: self.job_description,
            scores: self.scores,
            keywords: self.keywords,
            recommendations: self.recommendations,
            feedback: None,
            created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: String,
    pub resume_id: Option<String>,
    pub job_description: String,
    pub scores: Json<ScoreBreakdown>,
    pub keywords: Json<KeywordAnalysis>,
    pub recommendations: Json<Recommendations>,
    pub feedback: Option<Json<UserFeedback>>,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for Analysis {
    fn from(row: AnalysisRow) -> Self {
        Analysis {
            id: row.id,
            user_id: row.user_id,
            resume_id: row.resume_id,
            job_description: row.job_description,
            scores: row.scores.0,
            keywords: row.keywords.0,
            recommendations: row.recommendations.0,
            feedback: row.feedback.map(|f| f.0),
            created_at: row.created_at,
        }
    }
}

/// Cuts `text` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
