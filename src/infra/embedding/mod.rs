mod openai_compatible;

use crate::domain::PipelineError;

pub use openai_compatible::OpenAiCompatibleEmbeddings;

pub trait EmbeddingProvider: Send + Sync {
    fn model_id(&self) -> &str;

    /// Returns one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| PipelineError::embedding("provider returned no vector for the query"))
    }
}
