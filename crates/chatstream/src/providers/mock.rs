use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::callbacks::{CallbackHandler, RunCallbacks};
use crate::models::message::Message;
use crate::providers::base::{CallOptions, ChatModel, Usage};

/// A mock provider that streams pre-configured tokens for testing
pub struct MockProvider {
    tokens: Vec<String>,
    failure: Option<String>,
}

impl MockProvider {
    /// Create a new mock provider that streams the tokens and completes
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            failure: None,
        }
    }

    /// Stream the tokens, then fail with the given message
    pub fn failing_after(tokens: &[&str], message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(tokens)
        }
    }
}

#[async_trait]
impl ChatModel for MockProvider {
    async fn call(
        &self,
        _messages: &[Message],
        _options: &CallOptions,
        handlers: &[Arc<dyn CallbackHandler>],
    ) -> Result<(Message, Usage)> {
        let callbacks = RunCallbacks::new(handlers);
        callbacks.start().await;
        for token in &self.tokens {
            callbacks.token(token).await;
        }

        if let Some(message) = &self.failure {
            let err = anyhow!("{}", message);
            callbacks.error(&err).await;
            return Err(err);
        }

        callbacks.end().await;
        Ok((Message::assistant(self.tokens.concat()), Usage::default()))
    }
}
