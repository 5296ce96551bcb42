use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::callbacks::CallbackHandler;
use crate::models::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Per-call overrides of the provider configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub stop: Vec<String>,
}

/// Base trait for streaming chat models (OpenAI, Ollama, etc)
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the next assistant message
    ///
    /// Tokens are written into every handler as they are produced. The returned future resolves
    /// with the aggregated message once generation completes; on failure the handlers receive
    /// the error before it is returned.
    async fn call(
        &self,
        messages: &[Message],
        options: &CallOptions,
        handlers: &[Arc<dyn CallbackHandler>],
    ) -> Result<(Message, Usage)>;
}
