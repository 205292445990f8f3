mod json_store;

use crate::domain::{PipelineError, ScoredChunk, StoredChunk};

pub use json_store::{DEFAULT_COLLECTION, DEFAULT_PERSIST_DIR, JsonVectorStore};

pub trait VectorStore: Send + Sync {
    fn add(&mut self, entries: Vec<StoredChunk>) -> Result<(), PipelineError>;

    /// Nearest neighbours of `embedding`, most similar first, at most `k` of them.
    fn query(&self, embedding: &[f32], k: usize) -> Vec<ScoredChunk>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self) -> Result<(), PipelineError>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
