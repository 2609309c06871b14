//! Pluggable, trait-based generators of résumé guidance.
//!
//! Default: `RuleBasedRecommender` (deterministic, no network).
//! Optional: `LlmRecommender`, which asks a `TextGenerator` for a critique and
//! falls back to the rule path on error, timeout or an unusable response.
//!
//! `AppState` holds an `Arc<dyn Recommender>`, chosen at startup via config.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::keywords::KeywordAnalysis;
use crate::analysis::prompts::{CRITIQUE_PROMPT_TEMPLATE, CRITIQUE_SYSTEM};
use crate::analysis::scoring::{ScoreBreakdown, ScoreStatus};
use crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;
use crate::llm_client::{LlmError, TextGenerator};

pub const MAX_IMPROVEMENTS: usize = 5;
pub const MAX_BULLET_REWRITES: usize = 3;
pub const MAX_MISSING_SKILLS: usize = 5;

/// Prompt prefixes sent to the enrichment model, in characters.
const RESUME_PROMPT_CHARS: usize = 3000;
const JOB_PROMPT_CHARS: usize = 1500;

const GENERIC_IMPROVEMENTS: &[&str] = &[
    "Consider adding more specific keywords from the job description.",
    "Ensure your experience sections emphasize impact over duties.",
    "Tailor your professional summary to this specific role.",
];

const BULLET_EXEMPLARS: &[&str] = &[
    "Collaborated with a team of five to improve project delivery efficiency by 20%.",
    "Implemented a monitoring system that reduced unplanned downtime by 15 hours per week.",
    "Redesigned the onboarding workflow, cutting new-hire ramp-up time from six weeks to four.",
];

const ATS_TIPS: &[&str] = &[
    "Use a standard font like Arial or Calibri.",
    "Keep your resume to 1-2 pages maximum.",
    "Avoid images, charts, and complex columns.",
    "Use conventional section headings so the ATS can find each part of your resume.",
];

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());
static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•·]|\d+[.)])\s*").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub summary: String,
    pub improvements: Vec<String>,
    pub bullet_rewrites: Vec<String>,
    pub missing_skills: Vec<String>,
    pub tips: Vec<String>,
    /// Unparsed model output, present only for enriched recommendations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub generated_by: String, // "rules" | "llm"
}

/// Everything a recommender may look at. Borrowed from the running analysis.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub scores: &'a ScoreBreakdown,
    pub keywords: &'a KeywordAnalysis,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Produces recommendations for a finished score. Infallible: implementations
/// that depend on external services must recover locally.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, input: &RecommendationInput<'_>) -> Recommendations;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedRecommender
// ────────────────────────────────────────────────────────────────────────────

pub struct RuleBasedRecommender;

#[async_trait]
impl Recommender for RuleBasedRecommender {
    async fn recommend(&self, input: &RecommendationInput<'_>) -> Recommendations {
        build_rule_recommendations(input)
    }
}

pub fn build_rule_recommendations(input: &RecommendationInput<'_>) -> Recommendations {
    Recommendations {
        summary: build_summary(input.scores, input.keywords),
        improvements: build_improvements(input.scores, input.keywords),
        bullet_rewrites: BULLET_EXEMPLARS.iter().map(|s| s.to_string()).collect(),
        missing_skills: missing_skills(input.keywords),
        tips: ATS_TIPS.iter().map(|s| s.to_string()).collect(),
        raw: None,
        generated_by: "rules".to_string(),
    }
}

fn build_summary(scores: &ScoreBreakdown, keywords: &KeywordAnalysis) -> String {
    let status = ScoreStatus::from_score(scores.overall).label();
    let coverage = if keywords.total == 0 {
        "The job description contained no usable keywords to match against.".to_string()
    } else {
        format!(
            "It matches {} of {} key terms from the job description.",
            keywords.matched_count, keywords.total
        )
    };
    format!(
        "This is an automated ATS analysis. Your resume scored {}/100 ({status}). {coverage}",
        scores.overall
    )
}

fn build_improvements(scores: &ScoreBreakdown, keywords: &KeywordAnalysis) -> Vec<String> {
    let mut improvements = Vec::new();

    if !keywords.missing.is_empty() {
        improvements.push(format!(
            "Add these job-description keywords where they genuinely apply: {}.",
            keywords
                .missing
                .iter()
                .take(MAX_MISSING_SKILLS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if scores.impact < 70 {
        improvements.push(
            "Quantify achievements with numbers, percentages, or amounts saved or earned."
                .to_string(),
        );
    }
    if scores.format < 85 {
        improvements.push(
            "Use standard section headings such as Summary, Experience, Education and Skills."
                .to_string(),
        );
    }
    if scores.semantic < 20 {
        improvements.push(
            "Reuse key phrases from the job description so your wording lines up with the role."
                .to_string(),
        );
    }

    for generic in GENERIC_IMPROVEMENTS {
        if improvements.len() >= 3 {
            break;
        }
        improvements.push(generic.to_string());
    }

    improvements.truncate(MAX_IMPROVEMENTS);
    improvements
}

fn missing_skills(keywords: &KeywordAnalysis) -> Vec<String> {
    keywords
        .missing
        .iter()
        .take(MAX_MISSING_SKILLS)
        .cloned()
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRecommender
// ────────────────────────────────────────────────────────────────────────────

/// Enriches recommendations with a model critique, bounded by `timeout`.
pub struct LlmRecommender {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl LlmRecommender {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    async fn critique(&self, input: &RecommendationInput<'_>) -> Result<String, LlmError> {
        let prompt = build_critique_prompt(input);
        let system = format!("{CRITIQUE_SYSTEM} {PLAIN_TEXT_SYSTEM}");

        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt, &system)).await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl Recommender for LlmRecommender {
    async fn recommend(&self, input: &RecommendationInput<'_>) -> Recommendations {
        let fallback = build_rule_recommendations(input);

        match self.critique(input).await {
            Ok(text) => match parse_critique(&text, &fallback) {
                Some(recommendations) => {
                    debug!("Enriched recommendations parsed from {} chars", text.len());
                    recommendations
                }
                None => {
                    warn!("LLM critique had no usable sections, using rule-based recommendations");
                    fallback
                }
            },
            Err(e) => {
                warn!("Recommendation enrichment unavailable ({e}), using rule-based recommendations");
                fallback
            }
        }
    }
}

fn build_critique_prompt(input: &RecommendationInput<'_>) -> String {
    let missing = if input.keywords.missing.is_empty() {
        "none".to_string()
    } else {
        input.keywords.missing.join(", ")
    };

    let resume = prefix_chars(input.resume_text, RESUME_PROMPT_CHARS);
    let job = prefix_chars(input.job_description, JOB_PROMPT_CHARS);
    let overall = input.scores.overall.to_string();

    fill_template(
        CRITIQUE_PROMPT_TEMPLATE,
        &[
            ("resume_text", resume.as_str()),
            ("job_description", job.as_str()),
            ("overall", overall.as_str()),
            ("missing_keywords", missing.as_str()),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass. Inserted values are never
/// rescanned; unknown placeholders are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn prefix_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CritiqueSection {
    Improvements,
    BulletRewrites,
    Skills,
    Tips,
}

/// Paragraphs are classified by their first line.
fn classify(heading: &str) -> Option<CritiqueSection> {
    let heading = heading.to_lowercase();
    if heading.contains("improvement") {
        Some(CritiqueSection::Improvements)
    } else if heading.contains("bullet") {
        Some(CritiqueSection::BulletRewrites)
    } else if heading.contains("skill") {
        Some(CritiqueSection::Skills)
    } else if heading.contains("tip") {
        Some(CritiqueSection::Tips)
    } else {
        None
    }
}

/// List items of a paragraph: a trailing-colon heading is skipped, list
/// markers are stripped, blank lines are dropped.
fn paragraph_items(paragraph: &str) -> Vec<String> {
    let mut lines = paragraph.lines().peekable();
    if lines
        .peek()
        .is_some_and(|first| first.trim_end().ends_with(':'))
    {
        lines.next();
    }
    lines
        .map(|line| LIST_MARKER_RE.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Turns a free-text critique into `Recommendations`. Sections the model left
/// out are filled from `fallback`. Returns `None` when nothing usable was found.
fn parse_critique(text: &str, fallback: &Recommendations) -> Option<Recommendations> {
    let mut summary: Option<String> = None;
    let mut improvements = Vec::new();
    let mut bullet_rewrites = Vec::new();
    let mut tips = Vec::new();

    for paragraph in PARAGRAPH_BREAK_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let heading = paragraph.lines().next().unwrap_or_default();
        match classify(heading) {
            Some(CritiqueSection::Improvements) => improvements.extend(paragraph_items(paragraph)),
            Some(CritiqueSection::BulletRewrites) => {
                bullet_rewrites.extend(paragraph_items(paragraph))
            }
            // missing skills always come from the keyword analysis
            Some(CritiqueSection::Skills) => {}
            Some(CritiqueSection::Tips) => tips.extend(paragraph_items(paragraph)),
            None => {
                if summary.is_none() {
                    summary = Some(paragraph.split_whitespace().collect::<Vec<_>>().join(" "));
                }
            }
        }
    }

    if summary.is_none() && improvements.is_empty() && bullet_rewrites.is_empty() {
        return None;
    }

    improvements.truncate(MAX_IMPROVEMENTS);
    bullet_rewrites.truncate(MAX_BULLET_REWRITES);

    Some(Recommendations {
        summary: summary.unwrap_or_else(|| fallback.summary.clone()),
        improvements: non_empty_or(improvements, &fallback.improvements),
        bullet_rewrites: non_empty_or(bullet_rewrites, &fallback.bullet_rewrites),
        missing_skills: fallback.missing_skills.clone(),
        tips: non_empty_or(tips, &fallback.tips),
        raw: Some(text.to_string()),
        generated_by: "llm".to_string(),
    })
}

fn non_empty_or(items: Vec<String>, fallback: &[String]) -> Vec<String> {
    if items.is_empty() {
        fallback.to_vec()
    } else {
        items
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubGenerator {
        reply: Result<String, ()>,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                prompts: Mutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                delay: Duration::ZERO,
                prompts: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(|_| LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    fn scores(overall: u32, semantic: u32, format: u32, impact: u32) -> ScoreBreakdown {
        ScoreBreakdown {
            overall,
            keyword: 50,
            semantic,
            format,
            impact,
        }
    }

    fn keywords(missing: &[&str]) -> KeywordAnalysis {
        KeywordAnalysis {
            matched: vec!["python".to_string()],
            missing: missing.iter().map(|s| s.to_string()).collect(),
            total: missing.len() + 1,
            matched_count: 1,
        }
    }

    fn assert_fully_populated(r: &Recommendations) {
        assert!(!r.summary.is_empty());
        assert!(!r.improvements.is_empty() && r.improvements.len() <= MAX_IMPROVEMENTS);
        assert!(!r.bullet_rewrites.is_empty() && r.bullet_rewrites.len() <= MAX_BULLET_REWRITES);
        assert!(r.missing_skills.len() <= MAX_MISSING_SKILLS);
        assert!(!r.tips.is_empty());
        assert!(r.improvements.iter().all(|s| !s.trim().is_empty()));
    }

    #[test]
    fn test_rules_are_deterministic_and_bounded() {
        let s = scores(40, 5, 70, 50);
        let k = keywords(&["kafka", "terraform", "grafana", "helm", "istio", "envoy", "vault"]);
        let input = RecommendationInput {
            resume_text: "resume",
            job_description: "job",
            scores: &s,
            keywords: &k,
        };
        let first = build_rule_recommendations(&input);
        let second = build_rule_recommendations(&input);
        assert_eq!(first, second);
        assert_fully_populated(&first);
        assert_eq!(first.missing_skills, vec!["kafka", "terraform", "grafana", "helm", "istio"]);
        assert!(first.improvements[0].contains("kafka"));
        assert_eq!(first.generated_by, "rules");
        assert!(first.raw.is_none());
    }

    #[test]
    fn test_rules_with_strong_scores_use_generic_improvements() {
        let s = scores(90, 80, 95, 90);
        let k = keywords(&[]);
        let input = RecommendationInput {
            resume_text: "resume",
            job_description: "job",
            scores: &s,
            keywords: &k,
        };
        let r = build_rule_recommendations(&input);
        assert_eq!(r.improvements.len(), 3);
        assert_eq!(r.improvements[0], GENERIC_IMPROVEMENTS[0]);
        assert!(r.missing_skills.is_empty());
        assert!(r.summary.contains("automated"));
        assert!(r.summary.contains("Excellent"));
    }

    #[test]
    fn test_summary_handles_zero_keywords() {
        let s = scores(30, 0, 70, 50);
        let k = KeywordAnalysis {
            matched: vec![],
            missing: vec![],
            total: 0,
            matched_count: 0,
        };
        assert!(build_summary(&s, &k).contains("no usable keywords"));
    }

    #[test]
    fn test_parse_critique_classifies_paragraphs() {
        let fallback = build_rule_recommendations(&RecommendationInput {
            resume_text: "",
            job_description: "",
            scores: &scores(50, 10, 70, 50),
            keywords: &keywords(&["leadership"]),
        });
        let text = "Solid backend profile with a gap\naround leadership.\n\n\
            Improvements:\n- Lead with outcomes\n- Name the team size\n\n\
            Bullet rewrites:\n1. Led a team of 5 engineers to ship v2 in 8 weeks.\n\n\
            Skills to add:\n- leadership\n- mentoring\n\n\
            ATS tips:\n* Keep one column";
        let r = parse_critique(text, &fallback).unwrap();
        assert_eq!(r.summary, "Solid backend profile with a gap around leadership.");
        assert_eq!(r.improvements, vec!["Lead with outcomes", "Name the team size"]);
        assert_eq!(
            r.bullet_rewrites,
            vec!["Led a team of 5 engineers to ship v2 in 8 weeks."]
        );
        assert_eq!(r.missing_skills, vec!["leadership"]);
        assert_eq!(r.tips, vec!["Keep one column"]);
        assert_eq!(r.generated_by, "llm");
        assert_eq!(r.raw.as_deref(), Some(text));
    }

    #[test]
    fn test_parse_critique_caps_lists_and_fills_gaps() {
        let fallback = build_rule_recommendations(&RecommendationInput {
            resume_text: "",
            job_description: "",
            scores: &scores(50, 10, 70, 50),
            keywords: &keywords(&[]),
        });
        let text = "Improvements:\n- a\n- b\n- c\n- d\n- e\n- f\n- g";
        let r = parse_critique(text, &fallback).unwrap();
        assert_eq!(r.improvements.len(), MAX_IMPROVEMENTS);
        assert_eq!(r.summary, fallback.summary);
        assert_eq!(r.bullet_rewrites, fallback.bullet_rewrites);
        assert_eq!(r.tips, fallback.tips);
    }

    #[test]
    fn test_parse_critique_rejects_unusable_text() {
        let fallback = build_rule_recommendations(&RecommendationInput {
            resume_text: "",
            job_description: "",
            scores: &scores(50, 10, 70, 50),
            keywords: &keywords(&[]),
        });
        assert!(parse_critique("", &fallback).is_none());
        assert!(parse_critique("Skills:\n- rust\n\nTips:\n- short", &fallback).is_none());
    }

    #[test]
    fn test_prompt_truncates_inputs() {
        let resume = "r".repeat(5000);
        let jd = "j".repeat(4000);
        let s = scores(50, 10, 70, 50);
        let k = keywords(&["kafka"]);
        let prompt = build_critique_prompt(&RecommendationInput {
            resume_text: &resume,
            job_description: &jd,
            scores: &s,
            keywords: &k,
        });
        assert!(prompt.contains(&"r".repeat(RESUME_PROMPT_CHARS)));
        assert!(!prompt.contains(&"r".repeat(RESUME_PROMPT_CHARS + 1)));
        assert!(prompt.contains(&"j".repeat(JOB_PROMPT_CHARS)));
        assert!(!prompt.contains(&"j".repeat(JOB_PROMPT_CHARS + 1)));
        assert!(prompt.contains("kafka"));
        assert!(prompt.contains("50/100"));
    }

    #[test]
    fn test_prompt_does_not_expand_placeholders_inside_inputs() {
        let s = scores(50, 10, 70, 50);
        let k = keywords(&[]);
        let prompt = build_critique_prompt(&RecommendationInput {
            resume_text: "My template: {job_description} {overall} {missing_keywords}",
            job_description: "CONFIDENTIAL-JD",
            scores: &s,
            keywords: &k,
        });
        assert!(prompt.contains("My template: {job_description} {overall} {missing_keywords}"));
        assert_eq!(prompt.matches("CONFIDENTIAL-JD").count(), 1);
        assert!(prompt.contains("Keywords from the job description that the résumé lacks: none."));
    }

    #[test]
    fn test_fill_template_keeps_unknown_placeholders() {
        let filled = fill_template("{a} and {b} and {unknown}", &[("a", "{b}"), ("b", "2")]);
        assert_eq!(filled, "{b} and 2 and {unknown}");
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_rules() {
        let recommender =
            LlmRecommender::new(Arc::new(StubGenerator::failing()), Duration::from_secs(5));
        let s = scores(50, 10, 70, 50);
        let k = keywords(&["kafka"]);
        let input = RecommendationInput {
            resume_text: "resume",
            job_description: "job",
            scores: &s,
            keywords: &k,
        };
        let r = recommender.recommend(&input).await;
        assert_eq!(r, build_rule_recommendations(&input));
        assert_fully_populated(&r);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_timeout_falls_back_to_rules() {
        let mut slow = StubGenerator::replying("Improvements:\n- never seen");
        slow.delay = Duration::from_secs(120);
        let recommender = LlmRecommender::new(Arc::new(slow), Duration::from_secs(5));
        let s = scores(50, 10, 70, 50);
        let k = keywords(&[]);
        let input = RecommendationInput {
            resume_text: "resume",
            job_description: "job",
            scores: &s,
            keywords: &k,
        };
        let r = recommender.recommend(&input).await;
        assert_eq!(r.generated_by, "rules");
        assert!(!r.improvements.iter().any(|i| i == "never seen"));
    }

    #[tokio::test]
    async fn test_llm_malformed_reply_falls_back_to_rules() {
        let recommender = LlmRecommender::new(
            Arc::new(StubGenerator::replying("Tips:\n")),
            Duration::from_secs(5),
        );
        let s = scores(50, 10, 70, 50);
        let k = keywords(&[]);
        let input = RecommendationInput {
            resume_text: "resume",
            job_description: "job",
            scores: &s,
            keywords: &k,
        };
        assert_eq!(recommender.recommend(&input).await.generated_by, "rules");
    }

    #[tokio::test]
    async fn test_llm_success_uses_critique() {
        let stub = Arc::new(StubGenerator::replying(
            "Good match overall.\n\nImprovements:\n- Mention Kafka explicitly",
        ));
        let recommender = LlmRecommender::new(stub.clone(), Duration::from_secs(5));
        let s = scores(50, 10, 70, 50);
        let k = keywords(&["kafka"]);
        let input = RecommendationInput {
            resume_text: "Built pipelines",
            job_description: "Kafka engineer",
            scores: &s,
            keywords: &k,
        };
        let r = recommender.recommend(&input).await;
        assert_eq!(r.generated_by, "llm");
        assert_eq!(r.summary, "Good match overall.");
        assert_eq!(r.improvements, vec!["Mention Kafka explicitly"]);
        assert_eq!(r.missing_skills, vec!["kafka"]);
        let prompts = stub.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Built pipelines"));
    }
}
