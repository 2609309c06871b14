//! Sub-score calculators and the weighted aggregator.
//!
//! Every calculator is a total function over `&str` returning a value in
//! 0..=100. None of them share state, so they can run in any order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::keywords::KeywordAnalysis;

const FORMAT_BASE: i32 = 70;
const SECTION_BONUS: i32 = 5;
const EXPECTED_SECTIONS: &[&str] = &["experience", "education", "skills", "summary", "projects"];
const BULLET_MARKERS: &[char] = &['•', '*', '-', '·'];

const IMPACT_BASE: u32 = 50;
const NUMBER_POINTS_CAP: u32 = 20;
const ACTION_VERBS: &[&str] = &[
    "achieved",
    "improved",
    "increased",
    "decreased",
    "managed",
    "led",
    "developed",
    "created",
    "implemented",
    "designed",
];

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?\s?%").unwrap());
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$£€]\s?\d+(?:[.,]\d+)*").unwrap());

/// The four sub-scores plus the blended overall score, each 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: u32,
    pub keyword: u32,
    pub semantic: u32,
    pub format: u32,
    pub impact: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub keyword: f64,
    pub semantic: f64,
    pub format: f64,
    pub impact: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keyword: 0.40,
            semantic: 0.30,
            format: 0.15,
            impact: 0.15,
        }
    }
}

/// Human-readable band for a 0..=100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreStatus {
    Excellent,
    Good,
    NeedsWork,
    Poor,
}

impl ScoreStatus {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => ScoreStatus::Excellent,
            60..=79 => ScoreStatus::Good,
            40..=59 => ScoreStatus::NeedsWork,
            _ => ScoreStatus::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreStatus::Excellent => "Excellent",
            ScoreStatus::Good => "Good",
            ScoreStatus::NeedsWork => "Needs Work",
            ScoreStatus::Poor => "Poor",
        }
    }
}

/// Computes every sub-score and blends them with `weights`.
pub fn compute_scores(
    resume_text: &str,
    job_description: &str,
    keywords: &KeywordAnalysis,
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    let keyword = keyword_score(keywords);
    let semantic = semantic_score(resume_text, job_description);
    let format = format_score(resume_text);
    let impact = impact_score(resume_text);

    ScoreBreakdown {
        overall: aggregate(keyword, semantic, format, impact, weights),
        keyword,
        semantic,
        format,
        impact,
    }
}

/// Share of job-description keywords found in the résumé. 0 when there are none.
pub fn keyword_score(keywords: &KeywordAnalysis) -> u32 {
    if keywords.total == 0 {
        return 0;
    }
    percent(keywords.matched_count, keywords.total)
}

/// Word-trigram overlap, normalised by the smaller trigram set.
pub fn semantic_score(resume_text: &str, job_description: &str) -> u32 {
    let resume_lower = resume_text.to_lowercase();
    let jd_lower = job_description.to_lowercase();
    let resume_trigrams = trigrams(&resume_lower);
    let jd_trigrams = trigrams(&jd_lower);

    let smaller = resume_trigrams.len().min(jd_trigrams.len());
    if smaller == 0 {
        return 0;
    }
    let shared = resume_trigrams.intersection(&jd_trigrams).count();
    percent(shared, smaller)
}

/// Layout heuristic: section headings, bullet usage and overall length.
pub fn format_score(resume_text: &str) -> u32 {
    let lower = resume_text.to_lowercase();
    let mut score = FORMAT_BASE;

    score += EXPECTED_SECTIONS
        .iter()
        .filter(|section| lower.contains(*section))
        .count() as i32
        * SECTION_BONUS;

    let bullets = resume_text
        .chars()
        .filter(|c| BULLET_MARKERS.contains(c))
        .count();
    if bullets > 10 {
        score += 25;
    } else if bullets > 5 {
        score += 10;
    }

    let words = resume_text.split_whitespace().count();
    score += match words {
        0..=300 => 0,
        301..=799 => 10,
        800..=1200 => 5,
        _ => -10,
    };

    score.clamp(0, 100) as u32
}

/// Rewards quantified achievements and action verbs.
pub fn impact_score(resume_text: &str) -> u32 {
    let lower = resume_text.to_lowercase();

    let numbers = NUMBER_RE.find_iter(resume_text).count() as u32;
    let verbs = ACTION_VERBS.iter().filter(|v| lower.contains(*v)).count() as u32;
    let percents = PERCENT_RE.find_iter(resume_text).count() as u32;
    let amounts = CURRENCY_RE.find_iter(resume_text).count() as u32;

    let score = IMPACT_BASE
        + (numbers * 2).min(NUMBER_POINTS_CAP)
        + verbs * 2
        + percents * 3
        + amounts * 4;

    score.min(100)
}

/// Weighted blend of the four sub-scores, rounded and clamped to 0..=100.
pub fn aggregate(keyword: u32, semantic: u32, format: u32, impact: u32, weights: &ScoreWeights) -> u32 {
    let blended = keyword as f64 * weights.keyword
        + semantic as f64 * weights.semantic
        + format as f64 * weights.format
        + impact as f64 * weights.impact;
    blended.round().clamp(0.0, 100.0) as u32
}

fn trigrams(text: &str) -> HashSet<[&str; 3]> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

fn percent(part: usize, whole: usize) -> u32 {
    ((part as f64 / whole as f64) * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::keywords::{extract_keywords, match_keywords, DisplayLimits};

    fn analysis(matched_count: usize, total: usize) -> KeywordAnalysis {
        KeywordAnalysis {
            matched: vec![],
            missing: vec![],
            total,
            matched_count,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.keyword + w.semantic + w.format + w.impact - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_score_zero_total_is_zero() {
        assert_eq!(keyword_score(&analysis(0, 0)), 0);
    }

    #[test]
    fn test_keyword_score_rounds_rate() {
        assert_eq!(keyword_score(&analysis(6, 7)), 86);
        assert_eq!(keyword_score(&analysis(1, 3)), 33);
        assert_eq!(keyword_score(&analysis(4, 4)), 100);
    }

    #[test]
    fn test_semantic_empty_inputs_are_zero() {
        assert_eq!(semantic_score("", ""), 0);
        assert_eq!(semantic_score("two words", "three whole words"), 0);
    }

    #[test]
    fn test_semantic_identical_text_is_full() {
        let text = "Designed and shipped distributed storage services";
        assert_eq!(semantic_score(text, text), 100);
    }

    #[test]
    fn test_semantic_uses_smaller_set_as_denominator() {
        // resume trigrams: {a b c, b c d}; jd trigrams: {a b c, b c x, c x y, x y z}
        assert_eq!(semantic_score("a b c d", "A B C x y z"), 50);
    }

    #[test]
    fn test_format_base_for_plain_text() {
        assert_eq!(format_score(""), 70);
        assert_eq!(format_score("hello world"), 70);
    }

    #[test]
    fn test_format_sections_and_bullets() {
        let text = "SUMMARY\nEXPERIENCE\n• a\n• b\n• c\n• d\n• e\n• f\nEDUCATION";
        // 70 + 3 sections * 5 + 10 for six bullets
        assert_eq!(format_score(text), 95);
    }

    #[test]
    fn test_format_many_bullets_bonus() {
        let text = "- x ".repeat(11);
        assert_eq!(format_score(&text), 95);
    }

    #[test]
    fn test_format_word_count_adjustments() {
        let mid = "word ".repeat(500);
        assert_eq!(format_score(&mid), 80);
        let long = "word ".repeat(1000);
        assert_eq!(format_score(&long), 75);
        let too_long = "word ".repeat(1300);
        assert_eq!(format_score(&too_long), 60);
        let boundary = "word ".repeat(300);
        assert_eq!(format_score(&boundary), 70);
    }

    #[test]
    fn test_format_clamps_to_100() {
        let mut text = String::from("summary experience education skills projects\n");
        text.push_str(&"• word ".repeat(400));
        assert_eq!(format_score(&text), 100);
    }

    #[test]
    fn test_impact_base_for_plain_text() {
        assert_eq!(impact_score(""), 50);
        assert_eq!(impact_score("wrote some code"), 50);
    }

    #[test]
    fn test_impact_counts_numbers_verbs_percents_and_currency() {
        // numbers: 30, 2 -> +4; verbs: increased, managed -> +4; 30% -> +3; $2 -> +4
        let text = "Increased revenue 30% and managed a $2 budget";
        assert_eq!(impact_score(text), 65);
    }

    #[test]
    fn test_impact_number_contribution_is_capped() {
        let text = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        assert_eq!(impact_score(&text), 70);
    }

    #[test]
    fn test_impact_clamps_to_100() {
        let text = "€100 ".repeat(20);
        assert_eq!(impact_score(&text), 100);
    }

    #[test]
    fn test_aggregate_weighted_blend() {
        let w = ScoreWeights::default();
        assert_eq!(aggregate(100, 100, 100, 100, &w), 100);
        assert_eq!(aggregate(0, 0, 0, 0, &w), 0);
        // 50*0.4 + 20*0.3 + 80*0.15 + 60*0.15 = 20 + 6 + 12 + 9 = 47
        assert_eq!(aggregate(50, 20, 80, 60, &w), 47);
    }

    #[test]
    fn test_degenerate_job_description_scores_without_keywords() {
        let resume = "Led migrations across services";
        let jd = "the a an of";
        let keywords = match_keywords(&extract_keywords(jd, 30), resume, DisplayLimits::default());
        let scores = compute_scores(resume, jd, &keywords, &ScoreWeights::default());
        assert_eq!(keywords.total, 0);
        assert_eq!(scores.keyword, 0);
        let expected = aggregate(0, scores.semantic, scores.format, scores.impact, &ScoreWeights::default());
        assert_eq!(scores.overall, expected);
    }

    #[test]
    fn test_scores_bounded_for_odd_inputs() {
        let inputs = [
            "",
            "∑∫∂ 東京 🚀🚀🚀 ---- **** ••••",
            "$$$ %%% €€€ 100% $5 £3,000.50",
        ];
        for resume in inputs {
            for jd in inputs {
                let keywords =
                    match_keywords(&extract_keywords(jd, 30), resume, DisplayLimits::default());
                let s = compute_scores(resume, jd, &keywords, &ScoreWeights::default());
                for value in [s.overall, s.keyword, s.semantic, s.format, s.impact] {
                    assert!(value <= 100, "score {value} out of range");
                }
            }
        }
    }

    #[test]
    fn test_score_status_bands() {
        assert_eq!(ScoreStatus::from_score(95), ScoreStatus::Excellent);
        assert_eq!(ScoreStatus::from_score(80), ScoreStatus::Excellent);
        assert_eq!(ScoreStatus::from_score(60), ScoreStatus::Good);
        assert_eq!(ScoreStatus::from_score(40), ScoreStatus::NeedsWork);
        assert_eq!(ScoreStatus::from_score(39), ScoreStatus::Poor);
        assert_eq!(ScoreStatus::NeedsWork.label(), "Needs Work");
    }
}
