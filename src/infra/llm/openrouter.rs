use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    AdapterConfig, AdapterError, CompletionRequest, CompletionResponse, Credential, DEFAULT_TIMEOUT,
};
use crate::infra::env::{
    ENV_GLOBAL_TIMEOUT_SECS, read_env_var, read_parsed_env, read_timeout_from_env,
    resolve_timeout_with_global_fallback,
};

use super::response_parsing::{error_chain, truncate_message};
use super::{CompletionProvider, CredentialSource, EnvCredential};

const PROVIDER_ID: &str = "openrouter";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_TEMPERATURE: &str = "OPENROUTER_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "OPENROUTER_MAX_TOKENS";
pub const ENV_REFERER: &str = "OPENROUTER_REFERER";
pub const ENV_TITLE: &str = "OPENROUTER_TITLE";
pub const ENV_SYSTEM_PROMPT: &str = "OPENROUTER_SYSTEM_PROMPT";
pub const ENV_TIMEOUT_SECS: &str = "OPENROUTER_TIMEOUT_SECS";

/// Chat-completion adapter for OpenRouter and other OpenAI-compatible endpoints.
///
/// Every call makes at most one HTTP attempt. The credential is resolved before the
/// request is built, so a missing key never reaches the network.
pub struct OpenRouterAdapter {
    config: AdapterConfig,
    credentials: Arc<dyn CredentialSource>,
    client: Client,
}

impl OpenRouterAdapter {
    pub fn new<S>(config: AdapterConfig, credentials: S) -> Result<Self, AdapterError>
    where
        S: CredentialSource + 'static,
    {
        Self::with_shared_credentials(config, Arc::new(credentials))
    }

    pub fn with_shared_credentials(
        config: AdapterConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, AdapterError> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    /// Reads the config from `OPENROUTER_*` variables; the key itself is read per call.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::new(config_from_env()?, EnvCredential::new(ENV_API_KEY))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn build_request(&self, prompt_text: &str) -> CompletionRequest {
        CompletionRequest::from_prompt(prompt_text, &self.config)
    }

    pub fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, AdapterError> {
        let credential = self.credentials.resolve()?;
        request.validate()?;

        let mut builder = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(credential.expose())
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &request.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(request).send().map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // The status alone decides the error kind, even when the body is cut short.
            let body = response
                .text()
                .unwrap_or_else(|err| format!("<unreadable body: {}>", error_chain(&err)));
            return Err(map_http_error(status, &body));
        }

        let body = response.text().map_err(map_transport_error)?;
        parse_success_body(&body)
    }
}

impl CompletionProvider for OpenRouterAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn complete(&self, prompt_text: &str) -> Result<String, AdapterError> {
        let request = self.build_request(prompt_text);
        Ok(self.send(&request)?.text)
    }
}

/// One-shot form of [`OpenRouterAdapter::complete`] for callers that hold only a config.
pub fn complete(
    prompt_text: &str,
    config: &AdapterConfig,
    credentials: &dyn CredentialSource,
) -> Result<String, AdapterError> {
    // Resolve up front so a missing key fails before any client is built.
    let credential = credentials.resolve()?;
    let adapter = OpenRouterAdapter::with_shared_credentials(
        config.clone(),
        Arc::new(ResolvedCredential(credential)),
    )?;
    adapter.complete(prompt_text)
}

struct ResolvedCredential(Credential);

impl CredentialSource for ResolvedCredential {
    fn resolve(&self) -> Result<Credential, AdapterError> {
        Ok(self.0.clone())
    }
}

pub fn config_from_env() -> Result<AdapterConfig, AdapterError> {
    let mut builder = AdapterConfig::builder();

    if let Some(base_url) = read_env_var(ENV_BASE_URL)? {
        builder = builder.base_url(base_url);
    }
    if let Some(model) = read_env_var(ENV_MODEL)? {
        builder = builder.model(model);
    }
    if let Some(temperature) =
        read_parsed_env::<f64>(ENV_TEMPERATURE, "a number between 0 and 2")?
    {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = read_parsed_env::<u32>(ENV_MAX_TOKENS, "a positive integer")? {
        builder = builder.max_tokens(max_tokens);
    }
    if let Some(referer) = read_env_var(ENV_REFERER)? {
        builder = builder.referer(referer);
    }
    if let Some(title) = read_env_var(ENV_TITLE)? {
        builder = builder.title(title);
    }
    if let Some(instruction) = read_env_var(ENV_SYSTEM_PROMPT)? {
        builder = builder.system_instruction(instruction);
    }

    let timeout = resolve_timeout_with_global_fallback(
        read_timeout_from_env(ENV_TIMEOUT_SECS)?,
        || read_timeout_from_env(ENV_GLOBAL_TIMEOUT_SECS),
        DEFAULT_TIMEOUT,
    )?;

    builder.timeout(timeout).build()
}

fn build_client(config: &AdapterConfig) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|err| {
            AdapterError::configuration(format!("failed to create HTTP client: {err}"))
        })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

fn parse_success_body(body: &str) -> Result<CompletionResponse, AdapterError> {
    let response: ChatCompletionsResponse = serde_json::from_str(body).map_err(|err| {
        AdapterError::invalid_response(format!("chat completion decode failed: {err}"))
    })?;

    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.as_ref())
        .and_then(|message| message.content.as_ref())
        .map(message_content_text)
        .unwrap_or_default();

    Ok(CompletionResponse { text })
}

fn message_content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts.iter().filter_map(content_part_text).collect(),
        _ => String::new(),
    }
}

fn content_part_text(part: &Value) -> Option<&str> {
    match part {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    }
}

fn map_http_error(status: StatusCode, body: &str) -> AdapterError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| truncate_message(body));

    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string()
    } else {
        message
    };

    AdapterError::provider(status.as_u16(), message)
}

fn map_transport_error(error: reqwest::Error) -> AdapterError {
    if error.is_timeout() {
        return AdapterError::transport(format!("request timed out: {}", error_chain(&error)));
    }
    AdapterError::transport(error_chain(&error))
}
