use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorCategory {
    UserActionRequired,
    TemporaryFailure,
    ProviderFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("transport failed: {message}")]
    Transport { message: String },
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("provider returned an invalid response: {message}")]
    InvalidResponse { message: String },
}

impl AdapterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> AdapterErrorCategory {
        match self {
            Self::Configuration { .. } => AdapterErrorCategory::UserActionRequired,
            Self::Provider { status: 401 | 403, .. } => AdapterErrorCategory::UserActionRequired,
            Self::Transport { .. } => AdapterErrorCategory::TemporaryFailure,
            Self::Provider { status, .. } if is_transient_status(*status) => {
                AdapterErrorCategory::TemporaryFailure
            }
            Self::Provider { .. } | Self::InvalidResponse { .. } => {
                AdapterErrorCategory::ProviderFailure
            }
        }
    }

    /// Whether a caller may reasonably try the same call again. The adapter itself never does.
    pub fn is_retryable(&self) -> bool {
        self.category() == AdapterErrorCategory::TemporaryFailure
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { message } => {
                format!("The model client is not configured correctly: {message}")
            }
            Self::Transport { message } => {
                format!("Could not reach the model service: {message}")
            }
            Self::Provider {
                status: 401 | 403,
                ..
            } => "The model service rejected the API key. Check OPENROUTER_API_KEY.".to_string(),
            Self::Provider { status, message } => {
                format!("The model service answered with HTTP {status}: {message}")
            }
            Self::InvalidResponse { message } => {
                format!("The model service returned an unreadable response: {message}")
            }
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..=599).contains(&status)
}

/// Failures of the retrieval pipeline surrounding the completion adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("document ingestion failed: {message}")]
    Ingestion { message: String },
    #[error("embedding failed: {message}")]
    Embedding { message: String },
    #[error("vector store failed: {message}")]
    Store { message: String },
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error(transparent)]
    Completion(#[from] AdapterError),
}

impl PipelineError {
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Ingestion { message } => {
                format!("The document could not be processed: {message}")
            }
            Self::Embedding { message } => {
                format!("The embedding service failed: {message}")
            }
            Self::Store { message } => format!("The vector index is unavailable: {message}"),
            Self::EmptyQuestion => "Please type a question.".to_string(),
            Self::Completion(error) => error.user_message(),
        }
    }
}
