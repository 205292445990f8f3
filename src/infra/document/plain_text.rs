use std::path::Path;

use crate::domain::{Page, PipelineError};
use crate::infra::text::sanitize_bytes;

use super::DocumentLoader;

/// Reads a whole text file as page 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Page>, PipelineError> {
        let bytes = std::fs::read(path).map_err(|err| {
            PipelineError::ingestion(format!("failed to read {}: {err}", path.display()))
        })?;

        let text = sanitize_bytes(&bytes);
        if text.trim().is_empty() {
            return Err(PipelineError::ingestion(format!(
                "{} does not contain any text",
                path.display()
            )));
        }

        Ok(vec![Page { number: 1, text }])
    }
}
