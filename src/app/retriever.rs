use std::sync::Arc;

use crate::domain::{PipelineError, ScoredChunk};
use crate::infra::embedding::EmbeddingProvider;
use crate::infra::vector_store::VectorStore;

pub const DEFAULT_TOP_K: usize = 1;

/// Embeds a question and looks it up in the vector store.
pub struct Retriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Box<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, store: Box<dyn VectorStore>) -> Self {
        Self { embeddings, store }
    }

    pub fn indexed_chunks(&self) -> usize {
        self.store.len()
    }

    /// Most relevant chunks first.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>, PipelineError> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embeddings.embed_query(question)?;
        Ok(self.store.query(&embedding, k))
    }
}
