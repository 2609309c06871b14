//! Keyword extraction and job-description keyword matching.
//!
//! Extraction is frequency based: lowercase, strip punctuation, drop short
//! tokens, stop-words and numbers, then rank by count. Ties keep the order in
//! which the token first appeared so the output is reproducible.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cap for keywords pulled from a whole document (résumé profile).
pub const DOCUMENT_KEYWORD_LIMIT: usize = 50;
/// Cap for keywords pulled from a job description.
pub const JOB_KEYWORD_LIMIT: usize = 30;

/// Tokens of this many characters or fewer are discarded.
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "this", "that", "from", "your", "will", "have", "need", "into", "about", "also", "were",
    "been", "they", "their", "them", "what", "when", "which", "while",
];

/// Result of matching job-description keywords against a résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    /// Keywords found in the résumé, in job-description rank order (display-capped).
    pub matched: Vec<String>,
    /// Keywords absent from the résumé, in rank order (display-capped).
    pub missing: Vec<String>,
    /// Number of job-description keywords considered.
    pub total: usize,
    /// Number of matches before the display cap.
    pub matched_count: usize,
}

/// Presentation caps applied to `KeywordAnalysis` lists.
#[derive(Debug, Clone, Copy)]
pub struct DisplayLimits {
    pub matched: usize,
    pub missing: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            matched: 15,
            missing: 10,
        }
    }
}

/// Extracts up to `max_count` frequency-ranked keywords from `text`.
pub fn extract_keywords(text: &str, max_count: usize) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    // (token, count) in first-occurrence order
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in normalized.split_whitespace().filter(|t| is_keyword_candidate(t)) {
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // sort_by is stable, so equal counts keep first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(max_count)
        .map(|(token, _)| token.to_string())
        .collect()
}

/// Splits `job_keywords` into those contained in `resume_text` and those missing.
///
/// Containment is a plain case-insensitive substring check, so `"java"` matches
/// inside `"javascript"`. Scores depend on this exact behaviour.
pub fn match_keywords(
    job_keywords: &[String],
    resume_text: &str,
    limits: DisplayLimits,
) -> KeywordAnalysis {
    let resume_lower = resume_text.to_lowercase();

    let (matched, missing): (Vec<&String>, Vec<&String>) = job_keywords
        .iter()
        .partition(|kw| resume_lower.contains(kw.to_lowercase().as_str()));

    KeywordAnalysis {
        matched_count: matched.len(),
        total: job_keywords.len(),
        matched: matched
            .into_iter()
            .take(limits.matched)
            .cloned()
            .collect(),
        missing: missing
            .into_iter()
            .take(limits.missing)
            .cloned()
            .collect(),
    }
}

fn is_keyword_candidate(token: &str) -> bool {
    token.chars().count() > MIN_TOKEN_CHARS && !STOP_WORDS.contains(&token) && !is_numeric(token)
}

/// True when the whole token reads as a finite number ("2024", "1e3").
fn is_numeric(token: &str) -> bool {
    token
        .parse::<f64>()
        .map(|v| v.is_finite())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Experienced engineer skilled in Python and distributed systems. \
        Led team of five. Increased throughput by 30%.";
    const JOB: &str =
        "We need a Python engineer experienced in distributed systems and team leadership.";

    #[test]
    fn test_extract_empty_text_yields_nothing() {
        assert!(extract_keywords("", JOB_KEYWORD_LIMIT).is_empty());
        assert!(extract_keywords("   \n\t ", JOB_KEYWORD_LIMIT).is_empty());
    }

    #[test]
    fn test_extract_filters_short_stop_and_numeric_tokens() {
        let keywords = extract_keywords("The rust team shipped 2024 releases with 1500 users", 50);
        assert_eq!(keywords, vec!["rust", "team", "shipped", "releases", "users"]);
    }

    #[test]
    fn test_extract_ranks_by_frequency_then_first_occurrence() {
        let keywords = extract_keywords("alpha beta gamma beta gamma gamma delta", 10);
        assert_eq!(keywords, vec!["gamma", "beta", "alpha", "delta"]);
    }

    #[test]
    fn test_extract_strips_punctuation_and_lowercases() {
        let keywords = extract_keywords("Kubernetes, KUBERNETES; kubernetes! (Docker)", 10);
        assert_eq!(keywords, vec!["kubernetes", "docker"]);
    }

    #[test]
    fn test_extract_truncates_to_max_count() {
        let text = "one1 two2 three3 four4 five5";
        assert_eq!(extract_keywords(text, 2), vec!["one1", "two2"]);
    }

    #[test]
    fn test_extract_handles_non_ascii_without_panicking() {
        let keywords = extract_keywords("Résumé für Entwickler — 東京 データベース", 10);
        assert!(keywords.contains(&"résumé".to_string()));
        assert!(keywords.contains(&"entwickler".to_string()));
    }

    #[test]
    fn test_example_job_keywords() {
        let keywords = extract_keywords(JOB, JOB_KEYWORD_LIMIT);
        assert_eq!(
            keywords,
            vec![
                "python",
                "engineer",
                "experienced",
                "distributed",
                "systems",
                "team",
                "leadership"
            ]
        );
    }

    #[test]
    fn test_example_match_misses_only_leadership() {
        let keywords = extract_keywords(JOB, JOB_KEYWORD_LIMIT);
        let analysis = match_keywords(&keywords, RESUME, DisplayLimits::default());
        assert_eq!(analysis.missing, vec!["leadership"]);
        assert_eq!(analysis.total, 7);
        assert_eq!(analysis.matched_count, analysis.total - 1);
    }

    #[test]
    fn test_match_is_substring_based() {
        let keywords = vec!["java".to_string()];
        let analysis = match_keywords(&keywords, "Five years of JavaScript", DisplayLimits::default());
        assert_eq!(analysis.matched, vec!["java"]);
    }

    #[test]
    fn test_match_partition_holds_without_caps() {
        let keywords = extract_keywords(
            "rust tokio axum postgres redis kafka docker kubernetes terraform grafana",
            JOB_KEYWORD_LIMIT,
        );
        let limits = DisplayLimits {
            matched: usize::MAX,
            missing: usize::MAX,
        };
        let analysis = match_keywords(&keywords, "Built services in Rust on Postgres and Kafka", limits);
        assert_eq!(analysis.matched_count + analysis.missing.len(), analysis.total);
        assert_eq!(analysis.matched, vec!["rust", "postgres", "kafka"]);
    }

    #[test]
    fn test_match_caps_display_lists_but_not_count() {
        let keywords: Vec<String> = (0..25).map(|i| format!("skill{i:02}x")).collect();
        let all_present = keywords.join(" ");
        let analysis = match_keywords(&keywords, &all_present, DisplayLimits::default());
        assert_eq!(analysis.matched.len(), 15);
        assert_eq!(analysis.matched_count, 25);

        let analysis = match_keywords(&keywords, "", DisplayLimits::default());
        assert_eq!(analysis.missing.len(), 10);
        assert_eq!(analysis.matched_count, 0);
    }

    #[test]
    fn test_match_with_no_keywords() {
        let analysis = match_keywords(&[], RESUME, DisplayLimits::default());
        assert_eq!(analysis.total, 0);
        assert!(analysis.matched.is_empty());
        assert!(analysis.missing.is_empty());
    }
}
