use chatstream::providers::base::ChatModel;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}
