use serde::{Deserialize, Serialize};

use crate::models::analysis::Analysis;

/// Number of most recent analyses plotted in `score_history`.
const HISTORY_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub date: chrono::NaiveDate,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStats {
    pub average_matched: u32,
    pub average_missing: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: usize,
    pub average_score: u32,
    pub best_score: u32,
    pub worst_score: u32,
    /// Oldest first.
    pub score_history: Vec<ScorePoint>,
    pub keyword_stats: KeywordStats,
}

/// Aggregates a user's analyses, which must be ordered newest first.
pub fn compute_stats(analyses: &[Analysis]) -> AnalysisStats {
    if analyses.is_empty() {
        return AnalysisStats {
            total: 0,
            average_score: 0,
            best_score: 0,
            worst_score: 100,
            score_history: vec![],
            keyword_stats: KeywordStats {
                average_matched: 0,
                average_missing: 0,
            },
        };
    }

    let scores: Vec<u32> = analyses.iter().map(|a| a.scores.overall).collect();

    let mut score_history: Vec<ScorePoint> = analyses
        .iter()
        .take(HISTORY_POINTS)
        .map(|a| ScorePoint {
            date: a.created_at.date_naive(),
            score: a.scores.overall,
        })
        .collect();
    score_history.reverse();

    AnalysisStats {
        total: analyses.len(),
        average_score: rounded_mean(scores.iter().map(|&s| s as usize), analyses.len()),
        best_score: scores.iter().copied().max().unwrap_or(0),
        worst_score: scores.iter().copied().min().unwrap_or(100),
        score_history,
        keyword_stats: KeywordStats {
            average_matched: rounded_mean(
                analyses.iter().map(|a| a.keywords.matched_count),
                analyses.len(),
            ),
            average_missing: rounded_mean(
                analyses.iter().map(|a| a.keywords.missing.len()),
                analyses.len(),
            ),
        },
    }
}

fn rounded_mean(values: impl Iterator<Item = usize>, count: usize) -> u32 {
    let sum: usize = values.sum();
    (sum as f64 / count as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::keywords::KeywordAnalysis;
    use crate::analysis::recommendations::{build_rule_recommendations, RecommendationInput};
    use crate::analysis::scoring::ScoreBreakdown;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn analysis(overall: u32, matched_count: usize, missing: usize, day: u32) -> Analysis {
        let scores = ScoreBreakdown {
            overall,
            keyword: overall,
            semantic: 0,
            format: 70,
            impact: 50,
        };
        let keywords = KeywordAnalysis {
            matched: vec![],
            missing: (0..missing).map(|i| format!("kw{i}")).collect(),
            total: matched_count + missing,
            matched_count,
        };
        let recommendations = build_rule_recommendations(&RecommendationInput {
            resume_text: "",
            job_description: "",
            scores: &scores,
            keywords: &keywords,
        });
        Analysis {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            resume_id: None,
            job_description: String::new(),
            scores,
            keywords,
            recommendations,
            feedback: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.best_score, 0);
        assert_eq!(stats.worst_score, 100);
        assert!(stats.score_history.is_empty());
    }

    #[test]
    fn test_stats_aggregate_scores_and_keywords() {
        // newest first
        let analyses = vec![analysis(80, 6, 2, 3), analysis(61, 4, 3, 2), analysis(45, 2, 6, 1)];
        let stats = compute_stats(&analyses);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average_score, 62);
        assert_eq!(stats.best_score, 80);
        assert_eq!(stats.worst_score, 45);
        assert_eq!(stats.keyword_stats.average_matched, 4);
        assert_eq!(stats.keyword_stats.average_missing, 4);
        assert_eq!(
            stats.score_history.iter().map(|p| p.score).collect::<Vec<_>>(),
            vec![45, 61, 80]
        );
        assert_eq!(
            stats.score_history[0].date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_history_keeps_ten_most_recent() {
        let analyses: Vec<Analysis> = (1..=12).rev().map(|d| analysis(d * 5, 1, 1, d)).collect();
        let stats = compute_stats(&analyses);
        assert_eq!(stats.score_history.len(), HISTORY_POINTS);
        assert_eq!(stats.score_history.first().unwrap().score, 15);
        assert_eq!(stats.score_history.last().unwrap().score, 60);
    }
}
