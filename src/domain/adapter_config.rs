use std::fmt;
use std::time::Duration;

use super::AdapterError;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/o4-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable settings for the completion adapter. Build it once and share it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    referer: Option<String>,
    title: Option<String>,
    system_instruction: Option<String>,
    timeout: Duration,
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Returns a builder seeded with this config, for holders that need a variant.
    pub fn to_builder(&self) -> AdapterConfigBuilder {
        AdapterConfigBuilder {
            base_url: Some(self.base_url.clone()),
            model: Some(self.model.clone()),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            referer: self.referer.clone(),
            title: self.title.clone(),
            system_instruction: self.system_instruction.clone(),
            timeout: Some(self.timeout),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            referer: None,
            title: None,
            system_instruction: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdapterConfigBuilder {
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    referer: Option<String>,
    title: Option<String>,
    system_instruction: Option<String>,
    timeout: Option<Duration>,
}

impl AdapterConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn clear_system_instruction(mut self) -> Self {
        self.system_instruction = None;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AdapterConfig, AdapterError> {
        let defaults = AdapterConfig::default();

        let base_url = self.base_url.unwrap_or(defaults.base_url);
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AdapterError::configuration("base URL must not be empty"));
        }

        let model = self.model.unwrap_or(defaults.model).trim().to_string();
        if model.is_empty() {
            return Err(AdapterError::configuration("model must not be empty"));
        }

        let temperature = self.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AdapterError::configuration(format!(
                "temperature must be in 0.0..=2.0 (got {temperature})"
            )));
        }

        let max_tokens = self.max_tokens.unwrap_or(defaults.max_tokens);
        if max_tokens == 0 {
            return Err(AdapterError::configuration(
                "max_tokens must be greater than 0",
            ));
        }

        let timeout = self.timeout.unwrap_or(defaults.timeout);
        if timeout.is_zero() {
            return Err(AdapterError::configuration(
                "timeout must be greater than 0 seconds",
            ));
        }

        Ok(AdapterConfig {
            base_url,
            model,
            temperature,
            max_tokens,
            referer: non_blank(self.referer),
            title: non_blank(self.title),
            system_instruction: non_blank(self.system_instruction),
            timeout,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// API key for the completion endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Result<Self, AdapterError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AdapterError::configuration("API key must not be empty"));
        }
        Ok(Self(secret))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
