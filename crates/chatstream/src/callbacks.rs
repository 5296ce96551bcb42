use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Receives lifecycle events and tokens from a chat model while it generates
///
/// Every method has a no-op default so handlers only implement what they observe.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn handle_llm_start(&self, _run_id: Uuid) {}

    async fn handle_llm_new_token(&self, _token: &str, _run_id: Uuid) {}

    async fn handle_llm_end(&self, _run_id: Uuid) {}

    async fn handle_llm_error(&self, _error: &anyhow::Error, _run_id: Uuid) {}
}

/// Fans the events of a single model run out to a set of handlers
pub struct RunCallbacks<'a> {
    run_id: Uuid,
    handlers: &'a [Arc<dyn CallbackHandler>],
}

impl<'a> RunCallbacks<'a> {
    pub fn new(handlers: &'a [Arc<dyn CallbackHandler>]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            handlers,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub async fn start(&self) {
        for handler in self.handlers {
            handler.handle_llm_start(self.run_id).await;
        }
    }

    pub async fn token(&self, token: &str) {
        for handler in self.handlers {
            handler.handle_llm_new_token(token, self.run_id).await;
        }
    }

    pub async fn end(&self) {
        for handler in self.handlers {
            handler.handle_llm_end(self.run_id).await;
        }
    }

    pub async fn error(&self, error: &anyhow::Error) {
        for handler in self.handlers {
            handler.handle_llm_error(error, self.run_id).await;
        }
    }
}
