//! Request validation performed before the engine runs.
//!
//! The engine itself accepts any string; these limits belong to the API.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 5000;
pub const MAX_JOB_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Collapses every collected error into one `AppError::Validation`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors.join("; ")))
        }
    }
}

pub fn validate_job_description(description: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let chars = description.chars().count();

    if description.trim().is_empty() {
        errors.push("Job description is required".to_string());
    }
    if chars < MIN_JOB_DESCRIPTION_CHARS {
        errors.push(format!(
            "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters"
        ));
    }
    if chars > MAX_JOB_DESCRIPTION_CHARS {
        errors.push(format!(
            "Job description must be less than {MAX_JOB_DESCRIPTION_CHARS} characters"
        ));
    }

    ValidationResult::from_errors(errors)
}

pub fn validate_user_id(user_id: &str) -> ValidationResult {
    let errors = if user_id.trim().is_empty() {
        vec!["user_id is required".to_string()]
    } else {
        vec![]
    };
    ValidationResult::from_errors(errors)
}

pub fn validate_job_title(title: &str) -> ValidationResult {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push("Job title is required".to_string());
    }
    if title.chars().count() > MAX_JOB_TITLE_CHARS {
        errors.push(format!(
            "Job title must be less than {MAX_JOB_TITLE_CHARS} characters"
        ));
    }
    ValidationResult::from_errors(errors)
}

/// Checks a job description about to be saved to the library.
pub fn validate_saved_job_description(
    user_id: &str,
    title: &str,
    description: &str,
) -> ValidationResult {
    let mut errors = validate_user_id(user_id).errors;
    errors.extend(validate_job_title(title).errors);
    errors.extend(validate_job_description(description).errors);
    ValidationResult::from_errors(errors)
}

pub fn validate_analysis_request(
    user_id: &str,
    resume_text: &str,
    job_description: &str,
) -> ValidationResult {
    let mut errors = validate_user_id(user_id).errors;

    if resume_text.trim().is_empty() {
        errors.push("Resume text is required".to_string());
    }
    errors.extend(validate_job_description(job_description).errors);

    ValidationResult::from_errors(errors)
}

pub fn validate_feedback_rating(rating: u8) -> ValidationResult {
    let errors = if (1..=5).contains(&rating) {
        vec![]
    } else {
        vec!["Rating must be between 1 and 5".to_string()]
    };
    ValidationResult::from_errors(errors)
}
