// Export route modules
pub mod chat;
pub mod status;
pub mod stream_data;

use crate::state::AppState;
use axum::Router;
use chatstream::models::message::ChatMessage;
use serde::Deserialize;

/// Request body shared by the chat endpoints
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(stream_data::routes(state.clone()))
        .merge(chat::routes(state))
        .merge(status::routes())
}
