//! Pluggable text extraction
//!
//! HTML and PDF extraction are collaborators of the crawl engine, not part
//! of it: the engine hands bytes (or a file path) to a trait object and
//! stores whatever comes back. The defaults shipped here are deliberately
//! plain.

mod html;
mod pdf;

pub use html::{extract_title, HtmlExtractor, TagStripExtractor};
pub use pdf::{format_text_artifact, PdfExtractor, PlainPdfExtractor};
