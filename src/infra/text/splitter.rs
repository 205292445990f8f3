use text_splitter::{Characters, ChunkConfig, TextSplitter};

use crate::domain::{Chunk, Page, PipelineError};

pub const DEFAULT_CHUNK_SIZE: usize = 300;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Character-window chunker. Window boundaries prefer paragraph, sentence and word breaks.
pub struct ChunkSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    splitter: TextSplitter<Characters>,
}

impl ChunkSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, PipelineError> {
        if chunk_size == 0 {
            return Err(PipelineError::ingestion("chunk size must be greater than 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(PipelineError::ingestion(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|err| PipelineError::ingestion(format!("invalid chunk config: {err}")))?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
            splitter: TextSplitter::new(config),
        })
    }

    /// 300-character windows with 50 characters of overlap.
    pub fn with_defaults() -> Result<Self, PipelineError> {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every page in order. Ids run across the whole document.
    pub fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .chunks(&page.text)
                    .filter(|text| !text.trim().is_empty())
                    .map(move |text| (page.number, text.to_string()))
            })
            .enumerate()
            .map(|(id, (page, text))| Chunk { id, page, text })
            .collect()
    }
}
