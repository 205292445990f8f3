use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::domain::{AdapterError, Credential, PipelineError};
use crate::infra::env::{
    ENV_GLOBAL_TIMEOUT_SECS, read_env_var, read_parsed_env, read_timeout_from_env,
    resolve_timeout_with_global_fallback,
};
use crate::infra::llm::{error_chain, truncate_message};

use super::EmbeddingProvider;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BATCH_SIZE: usize = 64;

const ENV_BASE_URL: &str = "PDFRAG_EMBEDDING_BASE_URL";
const ENV_MODEL: &str = "PDFRAG_EMBEDDING_MODEL";
const ENV_API_KEY: &str = "PDFRAG_EMBEDDING_API_KEY";
const ENV_TIMEOUT_SECS: &str = "PDFRAG_EMBEDDING_TIMEOUT_SECS";
const ENV_BATCH_SIZE: &str = "PDFRAG_EMBEDDING_BATCH_SIZE";

/// Embeddings over any server exposing `POST {base}/embeddings` in the OpenAI shape
/// (text-embeddings-inference, Ollama, vLLM, OpenAI itself).
pub struct OpenAiCompatibleEmbeddings {
    base_url: String,
    model: String,
    api_key: Option<Credential>,
    batch_size: usize,
    client: Client,
}

impl OpenAiCompatibleEmbeddings {
    pub fn with_config(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        batch_size: usize,
    ) -> Result<Self, PipelineError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PipelineError::embedding(
                "embedding base URL must not be empty",
            ));
        }

        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(PipelineError::embedding("embedding model must not be empty"));
        }

        if batch_size == 0 {
            return Err(PipelineError::embedding(
                "embedding batch size must be greater than 0",
            ));
        }

        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .map(Credential::new)
            .transpose()
            .map_err(config_error)?;

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            PipelineError::embedding(format!("failed to create embedding HTTP client: {err}"))
        })?;

        Ok(Self {
            base_url,
            model,
            api_key,
            batch_size,
            client,
        })
    }

    pub fn from_env() -> Result<Self, PipelineError> {
        let base_url = read_env_var(ENV_BASE_URL)
            .map_err(config_error)?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = read_env_var(ENV_MODEL)
            .map_err(config_error)?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_key = read_env_var(ENV_API_KEY).map_err(config_error)?;
        let batch_size = read_parsed_env::<usize>(ENV_BATCH_SIZE, "a positive integer")
            .map_err(config_error)?
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let timeout = resolve_timeout_with_global_fallback(
            read_timeout_from_env(ENV_TIMEOUT_SECS).map_err(config_error)?,
            || read_timeout_from_env(ENV_GLOBAL_TIMEOUT_SECS),
            DEFAULT_TIMEOUT,
        )
        .map_err(config_error)?;

        Self::with_config(base_url, model, api_key, timeout, batch_size)
    }

    fn endpoint_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let payload = EmbeddingsRequest {
            model: &self.model,
            input: batch,
        };

        let mut request = self
            .client
            .post(self.endpoint_url())
            .header(CONTENT_TYPE, "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose());
        }

        let response = request.json(&payload).send().map_err(|err| {
            PipelineError::embedding(format!("transport error: {}", error_chain(&err)))
        })?;
        let status = response.status();
        let body = response.text().map_err(|err| {
            PipelineError::embedding(format!("transport error: {}", error_chain(&err)))
        })?;
        if !status.is_success() {
            return Err(PipelineError::embedding(format!(
                "embedding endpoint returned HTTP {status}: {}",
                truncate_message(&body)
            )));
        }

        let mut decoded: EmbeddingsResponse = serde_json::from_str(&body).map_err(|err| {
            PipelineError::embedding(format!("embedding response decode failed: {err}"))
        })?;
        if decoded.data.len() != batch.len() {
            return Err(PipelineError::embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                decoded.data.len()
            )));
        }

        decoded.data.sort_by_key(|item| item.index);
        Ok(decoded.data.into_iter().map(|item| item.embedding).collect())
    }
}

impl EmbeddingProvider for OpenAiCompatibleEmbeddings {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch)?);
        }
        Ok(vectors)
    }
}

fn config_error(error: AdapterError) -> PipelineError {
    match error {
        AdapterError::Configuration { message } => PipelineError::embedding(message),
        other => PipelineError::embedding(other.to_string()),
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
