//! CSV export of a user's analysis history.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::analysis::Analysis;

pub const EXPORT_FILE_NAME: &str = "analysis-history.csv";

const HEADERS: [&str; 8] = [
    "Date",
    "ATS Score",
    "Keyword Match",
    "Semantic Score",
    "Format Score",
    "Impact Score",
    "Matched Keywords",
    "Missing Keywords",
];

#[derive(Serialize)]
struct ExportRow {
    date: String,
    overall: String,
    keyword: String,
    semantic: String,
    format: String,
    impact: String,
    matched_keywords: usize,
    missing_keywords: usize,
}

impl From<&Analysis> for ExportRow {
    fn from(a: &Analysis) -> Self {
        Self {
            date: a.created_at.format("%Y-%m-%d").to_string(),
            overall: format!("{}%", a.scores.overall),
            keyword: format!("{}%", a.scores.keyword),
            semantic: format!("{}%", a.scores.semantic),
            format: format!("{}%", a.scores.format),
            impact: format!("{}%", a.scores.impact),
            matched_keywords: a.keywords.matched_count,
            missing_keywords: a.keywords.missing.len(),
        }
    }
}

/// One row per analysis, in the order given. The header is always written.
pub fn analyses_to_csv(analyses: &[Analysis]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEADERS).map_err(csv_error)?;
    for analysis in analyses {
        writer
            .serialize(ExportRow::from(analysis))
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV is not UTF-8: {e}")))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("CSV export failed: {e}"))
}
