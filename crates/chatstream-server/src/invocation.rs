use chatstream::{
    callbacks::CallbackHandler,
    models::message::Message,
    providers::base::{CallOptions, ChatModel},
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Run a model call on a detached task
///
/// The caller observes completion only through the handlers. A failed call is logged and
/// dropped; by the time it fails the response has already been returned.
pub fn spawn_model_call(
    model: Arc<dyn ChatModel>,
    messages: Vec<Message>,
    options: CallOptions,
    handlers: Vec<Arc<dyn CallbackHandler>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match model.call(&messages, &options, &handlers).await {
            Ok((_, usage)) => {
                tracing::debug!(
                    input_tokens = ?usage.input_tokens,
                    output_tokens = ?usage.output_tokens,
                    "Chat model call finished"
                );
            }
            Err(e) => {
                tracing::error!("Chat model call failed: {}", e);
            }
        }
    })
}
