//! Streaming of model output to HTTP clients
//!
//! A request wires these pieces together:
//! - [`bridge::create_bridge`] pairs a token stream with the handlers a model writes into
//! - [`data::StreamData`] carries structured records alongside the tokens
//! - [`response::StreamingTextResponse`] frames both into one response body using [`protocol`]
pub mod bridge;
pub mod data;
pub mod protocol;
pub mod response;

pub use bridge::{create_bridge, StreamCallbacks, StreamHandlers, TextStream};
pub use data::StreamData;
pub use protocol::StreamPart;
pub use response::{ResponseInit, StreamingTextResponse};
