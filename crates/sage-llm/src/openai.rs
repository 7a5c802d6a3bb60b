use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::{Generator, Result};

/// Generation client configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl GeneratorConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiGenerator {
    config: GeneratorConfig,
    http_client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Config(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = CompletionRequest {
            model: &self.config.model,
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GenerationError::Auth(message),
                _ => GenerationError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GenerationError::EmptyCompletion)?;

        debug!(chars = content.len(), "generation backend returned");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_response_parsing() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[test]
    fn test_empty_choices_parse() {
        let raw = r#"{"choices": []}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_request_body_shape() {
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
    }
}
