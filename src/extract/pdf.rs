use crate::MagpieError;
use std::path::Path;

/// Strategy seam for PDF text extraction
///
/// Implementations that prune running headers/footers or dehyphenate
/// line-wrapped words plug in here; the engine only consumes the
/// `(title, text)` pair.
pub trait PdfExtractor: Send + Sync {
    /// Extracts the document title and body text from a PDF on disk
    fn extract(&self, path: &Path) -> Result<(Option<String>, String), MagpieError>;
}

/// Default extractor backed by `pdf-extract`
///
/// Reports no title; the artifact formatter substitutes `no_title`.
pub struct PlainPdfExtractor;

impl PdfExtractor for PlainPdfExtractor {
    fn extract(&self, path: &Path) -> Result<(Option<String>, String), MagpieError> {
        let text = pdf_extract::extract_text(path).map_err(|e| MagpieError::PdfExtract {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok((None, text))
    }
}

/// Formats the text artifact for a PDF: title line, blank line, body
pub fn format_text_artifact(title: Option<&str>, text: &str) -> String {
    let title = match title {
        Some(t) if !t.is_empty() => t,
        _ => "no_title",
    };
    format!("{title}\n\n{text}")
}
