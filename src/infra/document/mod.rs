mod pdf;
mod plain_text;

use std::path::Path;

use crate::domain::{Page, PipelineError};

pub use pdf::PdfDocumentLoader;
pub use plain_text::PlainTextLoader;

/// Turns a file into sanitized page texts, in reading order.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Page>, PipelineError>;
}

pub fn loader_for_path(path: &Path) -> Result<Box<dyn DocumentLoader>, PipelineError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => Ok(Box::new(PdfDocumentLoader)),
        Some("txt" | "md") => Ok(Box::new(PlainTextLoader)),
        _ => Err(PipelineError::ingestion(format!(
            "unsupported file type: {} (expected .pdf, .txt or .md)",
            path.display()
        ))),
    }
}
