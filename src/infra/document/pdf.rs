use std::path::Path;

use lopdf::Document;

use crate::domain::{Page, PipelineError};
use crate::infra::text::sanitize_text;

use super::DocumentLoader;

/// Extracts one page of text per PDF page with `lopdf`. Images are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentLoader;

impl PdfDocumentLoader {
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Vec<Page>, PipelineError> {
        let document = Document::load_mem(bytes)
            .map_err(|err| PipelineError::ingestion(format!("failed to parse PDF: {err}")))?;
        extract_pages(&document, "document")
    }
}

impl DocumentLoader for PdfDocumentLoader {
    fn load(&self, path: &Path) -> Result<Vec<Page>, PipelineError> {
        let document = Document::load(path).map_err(|err| {
            PipelineError::ingestion(format!("failed to parse PDF {}: {err}", path.display()))
        })?;
        extract_pages(&document, &path.display().to_string())
    }
}

fn extract_pages(document: &Document, label: &str) -> Result<Vec<Page>, PipelineError> {
    let mut pages = Vec::new();
    // get_pages is keyed by 1-based page number and already sorted.
    for number in document.get_pages().into_keys() {
        let raw = document.extract_text(&[number]).map_err(|err| {
            PipelineError::ingestion(format!(
                "failed to extract text from page {number} of {label}: {err}"
            ))
        })?;

        let text = sanitize_text(&raw);
        if text.trim().is_empty() {
            continue;
        }
        pages.push(Page { number, text });
    }

    if pages.is_empty() {
        return Err(PipelineError::ingestion(format!(
            "{label} does not contain extractable text"
        )));
    }

    Ok(pages)
}
