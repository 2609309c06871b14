use anyhow::{Context, Result};
use std::time::Duration;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means analyses are kept in memory only.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub enable_llm_recommendations: bool,
    /// Required only when `enable_llm_recommendations` is set.
    pub anthropic_api_key: Option<String>,
    pub llm_timeout: Duration,
    pub memory_analysis_limit: usize,
    pub memory_job_description_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let enable_llm_recommendations = parse_env("ENABLE_LLM_RECOMMENDATIONS", false)?;
        let anthropic_api_key = if enable_llm_recommendations {
            Some(require_env("ANTHROPIC_API_KEY")?)
        } else {
            optional_env("ANTHROPIC_API_KEY")
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            enable_llm_recommendations,
            anthropic_api_key,
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 30)?),
            memory_analysis_limit: parse_env("MEMORY_ANALYSIS_LIMIT", 50)?,
            memory_job_description_limit: parse_env("MEMORY_JOB_DESCRIPTION_LIMIT", 50)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_defaults_when_unset() {
        assert_eq!(parse_env("ATS_TEST_UNSET_PORT", 8080u16).unwrap(), 8080);
        assert!(!parse_env("ATS_TEST_UNSET_FLAG", false).unwrap());
    }

    #[test]
    fn test_parse_env_reads_and_rejects() {
        std::env::set_var("ATS_TEST_LIMIT", " 25 ");
        assert_eq!(parse_env("ATS_TEST_LIMIT", 50usize).unwrap(), 25);

        std::env::set_var("ATS_TEST_BAD_PORT", "eighty");
        let err = parse_env("ATS_TEST_BAD_PORT", 8080u16).unwrap_err();
        assert!(err.to_string().contains("ATS_TEST_BAD_PORT"));
    }

    #[test]
    fn test_optional_env_ignores_blank() {
        std::env::set_var("ATS_TEST_BLANK", "  ");
        assert_eq!(optional_env("ATS_TEST_BLANK"), None);
    }
}
