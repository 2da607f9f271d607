use crate::traits::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat Completions client over plain HTTP
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Client whose requests give up after `timeout`
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let bearer = format!("Bearer {}", api_key.into());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).context("API key is not a valid header value")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at a compatible server (proxies, test doubles)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = CompletionPayload::from_request(&request);
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, body);
        }

        let raw: Value = response.json().await.context("Chat completion body is not JSON")?;
        let body: CompletionBody =
            serde_json::from_value(raw.clone()).context("Unexpected chat completion shape")?;

        let choice = body.choices.into_iter().next();
        Ok(ChatResponse {
            content: choice.as_ref().and_then(|c| c.message.content.clone()),
            usage: body.usage.map(TokenUsage::from),
            finish_reason: choice.and_then(|c| c.finish_reason),
            raw,
        })
    }
}

/// Reasoning models reject `temperature` and take `max_completion_tokens`
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("gpt-5")
}

#[derive(Debug, Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

impl<'a> CompletionPayload<'a> {
    fn from_request(request: &'a ChatRequest) -> Self {
        let options = &request.options;
        let reasoning = is_reasoning_model(&request.model);

        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: options.temperature.filter(|_| !reasoning),
            max_tokens: options.max_tokens.filter(|_| !reasoning),
            max_completion_tokens: options.max_tokens.filter(|_| reasoning),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatOptions;

    fn payload_for(model: &str) -> Value {
        let request = ChatRequest::new(model, vec![Message::user("Hi")])
            .with_options(ChatOptions::new().temperature(0.5).max_tokens(150));
        serde_json::to_value(CompletionPayload::from_request(&request)).unwrap()
    }

    #[test]
    fn test_payload_for_chat_models() {
        let payload = payload_for("gpt-3.5-turbo");

        assert_eq!(payload["max_tokens"], 150);
        assert_eq!(payload["temperature"], 0.5);
        assert!(payload.get("max_completion_tokens").is_none());
        assert_eq!(payload["messages"][0]["role"], "user");
    }

    #[test]
    fn test_payload_for_reasoning_models() {
        let payload = payload_for("gpt-5-mini");

        assert_eq!(payload["max_completion_tokens"], 150);
        assert!(payload.get("max_tokens").is_none());
        assert!(payload.get("temperature").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAIClient::new("sk-test").unwrap().with_base_url("http://localhost:1234/");
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
