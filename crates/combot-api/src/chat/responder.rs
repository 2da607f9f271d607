use combot_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use combot_types::{ChatLogEntry, ResponseKind, Scenario};
use std::sync::Arc;

use crate::chat::messages::LLM_ERROR_REPLY;
use crate::chat::prompts::{build_content, prompt_for};
use crate::config::LlmConfig;

/// Generates bot replies with the language model.
///
/// Failures never surface to the caller: the participant gets a fixed
/// apology and the turn still succeeds.
#[derive(Clone)]
pub struct Responder {
    client: Arc<dyn ChatClient>,
    model: String,
    options: ChatOptions,
}

impl Responder {
    pub fn new(client: Arc<dyn ChatClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            options: ChatOptions::new()
                .temperature(config.temperature)
                .max_tokens(config.max_tokens),
        }
    }

    pub async fn reply(
        &self,
        scenario: &Scenario,
        kind: ResponseKind,
        user_input: &str,
        chat_log: &[ChatLogEntry],
    ) -> String {
        let prompt = prompt_for(scenario.brand, scenario.think_level, scenario.feel_level, kind);
        let content = build_content(&prompt, kind, user_input, chat_log);

        let request = ChatRequest::new(self.model.clone(), vec![Message::user(content)])
            .with_options(self.options.clone());

        match self.client.chat(request).await {
            Ok(response) => match response.text() {
                Some(text) if kind == ResponseKind::LowContinuation => text.trim_matches('"').to_string(),
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!(kind = ?kind, "Language model returned no text");
                    LLM_ERROR_REPLY.to_string()
                }
            },
            Err(e) => {
                tracing::error!(kind = ?kind, "Reply generation failed: {:#}", e);
                LLM_ERROR_REPLY.to_string()
            }
        }
    }
}
