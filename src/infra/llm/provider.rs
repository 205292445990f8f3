use crate::domain::AdapterError;

/// Anything that turns a fully assembled prompt into generated text.
pub trait CompletionProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    fn complete(&self, prompt_text: &str) -> Result<String, AdapterError>;
}
