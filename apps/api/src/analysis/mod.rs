// ATS analysis: keyword matching, sub-scores, recommendations and the
// persistence/API layer around them.
pub mod comparison;
pub mod engine;
pub mod export;
pub mod handlers;
pub mod keywords;
pub mod profile;
pub mod prompts;
pub mod recommendations;
pub mod repository;
pub mod scoring;
pub mod stats;
pub mod validation;
