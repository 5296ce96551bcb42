//! These models represent the messages passed between the interface, the handler and the model
//!
//! There are two related formats we need to interact with:
//! - chat UI messages (`{role, content}`), sent from the interface to the server
//! - openai chat messages, sent from the server to the LLM
//!
//! Incoming records are decoded as-is into [`message::ChatMessage`] and immediately adapted into
//! the internal [`message::Message`], which only distinguishes human from assistant authorship.
pub mod message;
pub mod role;
