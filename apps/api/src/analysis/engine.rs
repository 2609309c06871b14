//! Analysis engine: runs the full scoring pipeline for one résumé/JD pair.
//!
//! Flow: extract JD keywords → match against résumé → sub-scores → blend →
//!       recommendations.
//!
//! Scoring is pure and synchronous. Only the recommender may suspend.

use serde::{Deserialize, Serialize};

use crate::analysis::keywords::{
    extract_keywords, match_keywords, DisplayLimits, KeywordAnalysis, JOB_KEYWORD_LIMIT,
};
use crate::analysis::recommendations::{RecommendationInput, Recommendations, Recommender};
use crate::analysis::scoring::{compute_scores, ScoreBreakdown, ScoreWeights};

/// Engine output, before identity and timestamps are assigned by persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub scores: ScoreBreakdown,
    pub keywords: KeywordAnalysis,
    pub recommendations: Recommendations,
}

/// Deterministic part of the pipeline: keyword analysis and score breakdown.
pub fn score_texts(resume_text: &str, job_description: &str) -> (ScoreBreakdown, KeywordAnalysis) {
    let job_keywords = extract_keywords(job_description, JOB_KEYWORD_LIMIT);
    let keywords = match_keywords(&job_keywords, resume_text, DisplayLimits::default());
    let scores = compute_scores(
        resume_text,
        job_description,
        &keywords,
        &ScoreWeights::default(),
    );
    (scores, keywords)
}

/// Runs the whole pipeline. Never fails: recommenders recover locally.
pub async fn analyze(
    recommender: &dyn Recommender,
    resume_text: &str,
    job_description: &str,
) -> AnalysisReport {
    let (scores, keywords) = score_texts(resume_text, job_description);

    let recommendations = recommender
        .recommend(&RecommendationInput {
            resume_text,
            job_description,
            scores: &scores,
            keywords: &keywords,
        })
        .await;

    AnalysisReport {
        scores,
        keywords,
        recommendations,
    }
}
