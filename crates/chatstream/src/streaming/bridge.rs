use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::callbacks::CallbackHandler;
use crate::errors::StreamError;

const CHANNEL_CAPACITY: usize = 100;

/// Tokens produced by the model, in arrival order
pub type TextStream = BoxStream<'static, Result<String, StreamError>>;

type StartCallback = Box<dyn FnOnce() + Send>;
type TokenCallback = Box<dyn FnMut(&str) + Send>;
type CompletionCallback = Box<dyn FnOnce(&str) + Send>;

/// Hooks invoked by the reading side of the bridge
///
/// `on_completion` and `on_final` receive the aggregated text and run after the model signalled
/// completion but before the text stream ends. Neither runs when the stream is aborted.
#[derive(Default)]
pub struct StreamCallbacks {
    on_start: Option<StartCallback>,
    on_token: Option<TokenCallback>,
    on_completion: Option<CompletionCallback>,
    on_final: Option<CompletionCallback>,
}

impl StreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start<F: FnOnce() + Send + 'static>(mut self, callback: F) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_token<F: FnMut(&str) + Send + 'static>(mut self, callback: F) -> Self {
        self.on_token = Some(Box::new(callback));
        self
    }

    pub fn on_completion<F: FnOnce(&str) + Send + 'static>(mut self, callback: F) -> Self {
        self.on_completion = Some(Box::new(callback));
        self
    }

    pub fn on_final<F: FnOnce(&str) + Send + 'static>(mut self, callback: F) -> Self {
        self.on_final = Some(Box::new(callback));
        self
    }
}

#[derive(Debug)]
enum BridgeEvent {
    Token(String),
    End,
    Abort(String),
}

/// Write side of the bridge, handed to the model as a callback handler
///
/// Runs are tracked by id; the stream completes once the last active run has ended.
pub struct StreamHandlers {
    tx: mpsc::Sender<BridgeEvent>,
    runs: Mutex<HashSet<Uuid>>,
}

impl StreamHandlers {
    async fn send(&self, event: BridgeEvent) {
        if let Err(e) = self.tx.send(event).await {
            tracing::debug!("Stream reader is gone, dropping event: {:?}", e.0);
        }
    }

    fn runs(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CallbackHandler for StreamHandlers {
    async fn handle_llm_start(&self, run_id: Uuid) {
        self.runs().insert(run_id);
    }

    async fn handle_llm_new_token(&self, token: &str, _run_id: Uuid) {
        self.send(BridgeEvent::Token(token.to_string())).await;
    }

    async fn handle_llm_end(&self, run_id: Uuid) {
        let finished = {
            let mut runs = self.runs();
            runs.remove(&run_id);
            runs.is_empty()
        };
        if finished {
            self.send(BridgeEvent::End).await;
        }
    }

    async fn handle_llm_error(&self, error: &anyhow::Error, run_id: Uuid) {
        self.runs().remove(&run_id);
        self.send(BridgeEvent::Abort(error.to_string())).await;
    }
}

/// Create a token stream and the handlers that feed it
pub fn create_bridge(callbacks: StreamCallbacks) -> (TextStream, Arc<StreamHandlers>) {
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handlers = Arc::new(StreamHandlers {
        tx,
        runs: Mutex::new(HashSet::new()),
    });

    let StreamCallbacks {
        on_start,
        mut on_token,
        on_completion,
        on_final,
    } = callbacks;

    let stream = async_stream::stream! {
        if let Some(on_start) = on_start {
            on_start();
        }

        let mut aggregated = String::new();
        loop {
            match rx.recv().await {
                Some(BridgeEvent::Token(token)) => {
                    if let Some(on_token) = on_token.as_mut() {
                        on_token(&token);
                    }
                    aggregated.push_str(&token);
                    yield Ok(token);
                }
                Some(BridgeEvent::End) => break,
                Some(BridgeEvent::Abort(message)) => {
                    yield Err(StreamError::Aborted(message));
                    return;
                }
                None => {
                    yield Err(StreamError::HandlersDropped);
                    return;
                }
            }
        }

        if let Some(on_completion) = on_completion {
            on_completion(&aggregated);
        }
        if let Some(on_final) = on_final {
            on_final(&aggregated);
        }
    };

    (stream.boxed(), handlers)
}
