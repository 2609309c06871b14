// Saved job-description library: reusable descriptions with derived keyword
// metadata and a running count of the analyses run against them.
pub mod handlers;
pub mod repository;
