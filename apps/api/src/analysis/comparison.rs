//! Progress between two analyses of the same user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::repository::{get_owned, AnalysisRepository};
use crate::errors::AppError;
use crate::models::analysis::Analysis;

/// Signed deltas, always `second - first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDifferences {
    pub score_change: i64,
    pub keyword_improvement: i64,
    pub format_improvement: i64,
    pub impact_improvement: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub first: Analysis,
    pub second: Analysis,
    pub differences: ScoreDifferences,
}

/// Compares `first` with the later `second`. No clamping.
pub fn compare(first: Analysis, second: Analysis) -> ComparisonResult {
    let differences = ScoreDifferences {
        score_change: delta(first.scores.overall as i64, second.scores.overall as i64),
        keyword_improvement: delta(
            first.keywords.matched_count as i64,
            second.keywords.matched_count as i64,
        ),
        format_improvement: delta(first.scores.format as i64, second.scores.format as i64),
        impact_improvement: delta(first.scores.impact as i64, second.scores.impact as i64),
    };
    ComparisonResult {
        first,
        second,
        differences,
    }
}

/// Resolves both analyses for `user_id` and compares them.
pub async fn compare_by_id(
    repo: &dyn AnalysisRepository,
    user_id: &str,
    first_id: Uuid,
    second_id: Uuid,
) -> Result<ComparisonResult, AppError> {
    let (first, second) = tokio::try_join!(
        get_owned(repo, first_id, user_id),
        get_owned(repo, second_id, user_id),
    )?;
    Ok(compare(first, second))
}

fn delta(before: i64, after: i64) -> i64 {
    after - before
}
