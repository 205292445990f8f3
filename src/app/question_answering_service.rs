use std::sync::Arc;

use tracing::debug;

use crate::domain::{PipelineError, ScoredChunk};
use crate::infra::llm::CompletionProvider;
use crate::infra::text::sanitize_text;

use super::{ContextAssembler, DEFAULT_TOP_K, Retriever};

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

/// Retrieve, assemble, complete. One question makes exactly one completion call.
pub struct QuestionAnsweringService {
    retriever: Retriever,
    completion: Arc<dyn CompletionProvider>,
    assembler: ContextAssembler,
    top_k: usize,
}

impl QuestionAnsweringService {
    pub fn new(retriever: Retriever, completion: Arc<dyn CompletionProvider>) -> Self {
        Self {
            retriever,
            completion,
            assembler: ContextAssembler::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn answer(&self, question: &str) -> Result<Answer, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let sources = self.retriever.retrieve(question, self.top_k)?;
        let texts = sources
            .iter()
            .map(|scored| scored.chunk.text.as_str())
            .collect::<Vec<_>>();
        let prompt = self.assembler.prompt_for(&texts, question);
        debug!(
            provider = self.completion.provider_id(),
            retrieved = sources.len(),
            prompt_chars = prompt.chars().count(),
            "sending question to completion provider"
        );

        let raw = self.completion.complete(&prompt)?;

        Ok(Answer {
            text: sanitize_text(&raw),
            sources,
        })
    }
}
