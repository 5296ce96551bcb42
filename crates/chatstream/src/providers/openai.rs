use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::base::{CallOptions, ChatModel, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{create_streaming_request, stream_chat_completion, ChatParameters};
use crate::callbacks::{CallbackHandler, RunCallbacks};
use crate::models::message::Message;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
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
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload);

        let callbacks = RunCallbacks::new(handlers);
        stream_chat_completion(request, &callbacks).await
    }
}
