pub const DEFAULT_CONTEXT_BUDGET_CHARS: usize = 3000;

/// Caller-side prompt assembly. The completion adapter receives the result verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAssembler {
    budget_chars: usize,
}

impl ContextAssembler {
    pub fn new(budget_chars: usize) -> Self {
        Self { budget_chars }
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    /// Joins chunk texts with a blank line and cuts the result at the character budget.
    pub fn assemble_context<S>(&self, chunks: &[S]) -> String
    where
        S: AsRef<str>,
    {
        let joined = chunks
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n\n");

        match joined.char_indices().nth(self.budget_chars) {
            Some((byte_index, _)) => joined[..byte_index].to_string(),
            None => joined,
        }
    }

    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        format!("Contexto:\n{context}\n\nPergunta: {question}")
    }

    pub fn prompt_for<S>(&self, chunks: &[S], question: &str) -> String
    where
        S: AsRef<str>,
    {
        self.build_prompt(&self.assemble_context(chunks), question)
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_BUDGET_CHARS)
    }
}
