//! Source document loading and text extraction.

use docqa_core::{AppError, AppResult};
use std::path::Path;

/// A parsed document: an ordered sequence of page texts.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document name (file name of the upload)
    pub name: String,

    /// Page texts in reading order; plain-text sources have one page
    pub pages: Vec<String>,
}

impl Document {
    /// Create a document from already-extracted page texts.
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Pdf,
    PlainText,
}

impl SourceFormat {
    fn from_path(path: &Path) -> AppResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") | Some("md") | Some("markdown") => Ok(Self::PlainText),
            other => Err(AppError::Document(format!(
                "Unsupported document format: {:?} (expected pdf, txt, or md)",
                other.unwrap_or("none")
            ))),
        }
    }
}

/// Load a document from disk and extract its text page by page.
///
/// # Errors
/// Returns [`AppError::Document`] for unreadable or corrupt files, which
/// is distinct from the internal-processing errors the rest of the
/// pipeline reports.
pub fn load_document(path: &Path) -> AppResult<Document> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::Document(format!("Invalid document path: {:?}", path)))?;

    let pages = match SourceFormat::from_path(path)? {
        SourceFormat::Pdf => pdf_extract::extract_text_by_pages(path).map_err(|e| {
            AppError::Document(format!("Failed to extract text from {:?}: {}", path, e))
        })?,
        SourceFormat::PlainText => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::Document(format!("Failed to read {:?}: {}", path, e))
            })?;
            vec![text]
        }
    };

    tracing::debug!(document = %name, pages = pages.len(), "Loaded document");

    Ok(Document::new(name, pages))
}
