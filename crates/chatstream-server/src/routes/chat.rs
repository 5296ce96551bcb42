use super::ChatRequest;
use crate::invocation::spawn_model_call;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use chatstream::{
    callbacks::CallbackHandler,
    models::message::adapt,
    providers::base::CallOptions,
    streaming::{create_bridge, ResponseInit, StreamCallbacks, StreamingTextResponse},
};
use std::sync::Arc;

// plain token stream, no side channel
async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> StreamingTextResponse {
    let messages = adapt(&request.messages);

    let callbacks = StreamCallbacks::new().on_completion(|completion| {
        tracing::debug!("Streamed completion of {} bytes", completion.len());
    });
    let (stream, handlers) = create_bridge(callbacks);

    let handlers: Vec<Arc<dyn CallbackHandler>> = vec![handlers];
    spawn_model_call(state.model, messages, CallOptions::default(), handlers);

    StreamingTextResponse::new(stream, ResponseInit::default(), None)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
