use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AdapterConfig, AdapterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One outbound chat-completion call. Extra headers travel beside the JSON body, never inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip)]
    pub extra_headers: BTreeMap<String, String>,
}

impl CompletionRequest {
    /// Shapes `prompt_text` into a request using the defaults carried by `config`.
    pub fn from_prompt(prompt_text: &str, config: &AdapterConfig) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(instruction) = config.system_instruction() {
            messages.push(ChatMessage::system(instruction));
        }
        messages.push(ChatMessage::user(prompt_text));

        let mut extra_headers = BTreeMap::new();
        if let Some(referer) = config.referer() {
            extra_headers.insert("HTTP-Referer".to_string(), referer.to_string());
        }
        if let Some(title) = config.title() {
            extra_headers.insert("X-Title".to_string(), title.to_string());
        }

        Self {
            model: config.model().to_string(),
            messages,
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            extra_headers,
        }
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.model.trim().is_empty() {
            return Err(AdapterError::configuration("model must not be empty"));
        }
        if self.messages.is_empty() {
            return Err(AdapterError::configuration("messages must not be empty"));
        }
        if !self
            .messages
            .iter()
            .any(|message| message.role == ChatRole::User)
        {
            return Err(AdapterError::configuration(
                "messages must include at least one user message",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AdapterError::configuration(format!(
                "temperature must be in 0.0..=2.0 (got {})",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AdapterError::configuration(
                "max_tokens must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

impl CompletionResponse {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, ChatRole, CompletionRequest};
    use crate::domain::{AdapterConfig, AdapterError};

    fn config() -> AdapterConfig {
        AdapterConfig::builder()
            .temperature(0.7)
            .max_tokens(300)
            .build()
            .expect("config should build")
    }

    #[test]
    fn from_prompt_uses_single_user_message_without_system_instruction() {
        let request = CompletionRequest::from_prompt("hello", &config());

        assert_eq!(request.messages, vec![ChatMessage::user("hello")]);
        assert_eq!(request.model, "openai/o4-mini");
        assert!(request.extra_headers.is_empty());
    }

    #[test]
    fn from_prompt_prefixes_system_instruction_and_attribution_headers() {
        let config = AdapterConfig::builder()
            .system_instruction("Be brief.")
            .referer("https://example.com")
            .title("PDF Chat")
            .build()
            .expect("config should build");

        let request = CompletionRequest::from_prompt("hello", &config);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(
            request.extra_headers.get("HTTP-Referer").map(String::as_str),
            Some("https://example.com")
        );
        assert_eq!(
            request.extra_headers.get("X-Title").map(String::as_str),
            Some("PDF Chat")
        );
    }

    #[test]
    fn serialized_request_omits_extra_headers() {
        let mut request = CompletionRequest::from_prompt("hello", &config());
        request
            .extra_headers
            .insert("X-Title".to_string(), "ignored".to_string());

        let value = serde_json::to_value(&request).expect("request should serialize");

        assert!(value.get("extra_headers").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn validate_requires_a_user_message() {
        let mut request = CompletionRequest::from_prompt("hello", &config());
        request.messages = vec![ChatMessage::system("only system")];

        let error = request
            .validate()
            .expect_err("request without user message should fail");

        assert!(matches!(
            error,
            AdapterError::Configuration { message }
            if message == "messages must include at least one user message"
        ));
    }

    #[test]
    fn validate_rejects_empty_messages() {
        let mut request = CompletionRequest::from_prompt("hello", &config());
        request.messages.clear();

        assert!(matches!(
            request.validate(),
            Err(AdapterError::Configuration { .. })
        ));
    }
}
