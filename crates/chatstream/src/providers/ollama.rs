use super::base::{CallOptions, ChatModel, Usage};
use super::configs::OllamaProviderConfig;
use super::utils::{create_streaming_request, stream_chat_completion, ChatParameters};
use crate::callbacks::{CallbackHandler, RunCallbacks};
use crate::models::message::Message;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5";

/// Talks to the OpenAI compatible endpoint of a local ollama server, no authentication
pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatModel for OllamaProvider {
    async fn call(
        &self,
        messages: &[Message],
        options: &CallOptions,
        handlers: &[Arc<dyn CallbackHandler>],
    ) -> Result<(Message, Usage)> {
        let parameters = ChatParameters {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let payload = create_streaming_request(&parameters, messages, options);

        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let request = self.client.post(&url).json(&payload);

        let callbacks = RunCallbacks::new(handlers);
        stream_chat_completion(request, &callbacks).await
    }
}
