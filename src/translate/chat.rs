//! Chat-completion client for segment translation

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::Translator;
use crate::config::TranslationConfig;

/// Chat message for the completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Translator backed by an OpenAI-shape chat-completion endpoint.
pub struct ChatCompletionTranslator {
    config: TranslationConfig,
    client: Client,
}

impl ChatCompletionTranslator {
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Translator for ChatCompletionTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: format!(
                        "You are a subtitle translator. Translate the user's text into {}. \
                         Respond with the translation only.",
                        target_language
                    ),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending segment to completion service");
        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("completion service error {}: {}", status, body));
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(completion_text(&parsed))
    }
}

/// The result text is the trimmed content of the first returned choice, or a
/// placeholder when the service answered without one.
fn completion_text(response: &ChatResponse) -> String {
    let content = response
        .choices
        .first()
        .map(|choice| choice.message.content.trim())
        .unwrap_or_default();

    if content.is_empty() {
        "(no translation)".to_string()
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ChatResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_trimmed_first_choice() {
        let response = parse(
            r#"{"choices":[
                {"message":{"role":"assistant","content":"  Hallo Welt \n"}},
                {"message":{"role":"assistant","content":"ignored"}}
            ]}"#,
        );
        assert_eq!(completion_text(&response), "Hallo Welt");
    }

    #[test]
    fn test_empty_choices_placeholder() {
        let response = parse(r#"{"choices":[]}"#);
        assert_eq!(completion_text(&response), "(no translation)");
    }

    #[test]
    fn test_missing_choices_placeholder() {
        let response = parse("{}");
        assert_eq!(completion_text(&response), "(no translation)");
    }

    #[test]
    fn test_blank_content_placeholder() {
        let response = parse(r#"{"choices":[{"message":{"role":"assistant","content":"   \n"}}]}"#);
        assert_eq!(completion_text(&response), "(no translation)");
    }
}
