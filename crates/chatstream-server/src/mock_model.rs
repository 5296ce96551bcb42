//! Test doubles for the route and invocation tests
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chatstream::{
    callbacks::{CallbackHandler, RunCallbacks},
    models::message::Message,
    providers::base::{CallOptions, ChatModel, Usage},
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing_subscriber::fmt::MakeWriter;

/// A chat model that streams fixed tokens, optionally waiting for a release signal first
#[derive(Default)]
pub struct ScriptedModel {
    tokens: Vec<String>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
    received: Mutex<Vec<Vec<Message>>>,
    completed: AtomicBool,
}

impl ScriptedModel {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Fail after streaming the tokens
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Block until the gate is notified before producing anything
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn received(&self) -> Vec<Vec<Message>> {
        self.received.lock().unwrap().clone()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn call(
        &self,
        messages: &[Message],
        _options: &CallOptions,
        handlers: &[Arc<dyn CallbackHandler>],
    ) -> Result<(Message, Usage)> {
        self.received.lock().unwrap().push(messages.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let callbacks = RunCallbacks::new(handlers);
        callbacks.start().await;
        for token in &self.tokens {
            callbacks.token(token).await;
        }

        let result = match &self.failure {
            Some(message) => {
                let err = anyhow!("{}", message);
                callbacks.error(&err).await;
                Err(err)
            }
            None => {
                callbacks.end().await;
                Ok((Message::assistant(self.tokens.concat()), Usage::default()))
            }
        };
        self.completed.store(true, Ordering::SeqCst);
        result
    }
}

/// Collects formatted log output of the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's tracing events here until the guard drops
    ///
    /// Only covers tasks polled on the current thread, which holds for `#[tokio::test]`.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
