//! Text extraction for uploaded résumés.
//!
//! PDF and DOCX parsing is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::errors::AppError;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const TEXT_MIME: &str = "text/plain";

/// Main body part of a WordprocessingML package.
const DOCX_BODY_PART: &str = "word/document.xml";

static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x0B\x0C\r]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    fn label(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::PlainText => "text",
        }
    }
}

#[derive(Debug, Error)]
enum DocxError {
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedDocument {
    /// Content type wins; the file extension is consulted when it is absent or generic.
    fn kind(&self) -> Option<DocumentKind> {
        let mime = self
            .content_type
            .as_deref()
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(PDF_MIME) => return Some(DocumentKind::Pdf),
            Some(DOCX_MIME) => return Some(DocumentKind::Docx),
            Some(TEXT_MIME) => return Some(DocumentKind::PlainText),
            Some("application/octet-stream") | None => {}
            Some(_) => return None,
        }

        let name = self.file_name.to_ascii_lowercase();
        if name.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if name.ends_with(".docx") {
            Some(DocumentKind::Docx)
        } else if name.ends_with(".txt") {
            Some(DocumentKind::PlainText)
        } else {
            None
        }
    }
}

/// Extracts and cleans the text of an uploaded PDF, DOCX or plain-text file.
pub async fn extract_text(document: &UploadedDocument) -> Result<String, AppError> {
    if document.data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if document.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File exceeds the {} MiB upload limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let raw = match document.kind() {
        Some(DocumentKind::Pdf) => {
            parse_blocking(DocumentKind::Pdf, document.data.clone(), |data| {
                pdf_extract::extract_text_from_mem(data).map_err(|e| e.to_string())
            })
            .await?
        }
        Some(DocumentKind::Docx) => {
            parse_blocking(DocumentKind::Docx, document.data.clone(), |data| {
                docx_to_text(data).map_err(|e| e.to_string())
            })
            .await?
        }
        Some(DocumentKind::PlainText) => String::from_utf8_lossy(&document.data).into_owned(),
        None => {
            warn!(
                "Rejected upload '{}' with content type {:?}",
                document.file_name, document.content_type
            );
            return Err(AppError::UnprocessableEntity(
                "Unsupported file type".to_string(),
            ));
        }
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the file".to_string(),
        ));
    }

    info!(
        "Extracted {} characters from '{}'",
        text.chars().count(),
        document.file_name
    );
    Ok(text)
}

/// Runs `parse` on a blocking thread. Parser errors and parser panics are the
/// uploader's problem (422); a lost blocking task is ours (500).
async fn parse_blocking<F>(kind: DocumentKind, data: Bytes, parse: F) -> Result<String, AppError>
where
    F: FnOnce(&[u8]) -> Result<String, String> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        catch_unwind(AssertUnwindSafe(|| parse(&data[..])))
            .unwrap_or_else(|_| Err("parser panicked".to_string()))
    })
    .await
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "spawn_blocking failed in {} extraction: {e}",
            kind.label()
        ))
    })?;

    outcome.map_err(|e| {
        warn!("{} extraction failed: {e}", kind.label());
        AppError::UnprocessableEntity(format!("Could not read {}: {e}", kind.label()))
    })
}

/// Concatenates the `w:t` runs of `word/document.xml`, one line per paragraph.
fn docx_to_text(data: &[u8]) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY_PART)?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text_run => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Normalises extracted text: one space between words, no blank lines,
/// no control characters. Non-ASCII letters are kept.
pub fn clean_text(raw: &str) -> String {
    let collapsed = HORIZONTAL_WS_RE.replace_all(raw, " ");
    collapsed
        .lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_control())
                .collect::<String>()
        })
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
