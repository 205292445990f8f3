mod adapter_config;
mod completion;
mod document;
mod errors;

pub use adapter_config::{
    AdapterConfig, AdapterConfigBuilder, Credential, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};
pub use completion::{ChatMessage, ChatRole, CompletionRequest, CompletionResponse};
pub use document::{Chunk, Page, ScoredChunk, StoredChunk};
pub use errors::{AdapterError, AdapterErrorCategory, PipelineError};
