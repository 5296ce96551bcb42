use anyhow::{anyhow, Result};
use futures::StreamExt;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};

use super::base::{CallOptions, Usage};
use crate::callbacks::RunCallbacks;
use crate::models::message::Message;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role(),
                "content": message.content(),
            })
        })
        .collect()
}

/// Sampling parameters shared by every OpenAI compatible provider
pub struct ChatParameters<'a> {
    pub model: &'a str,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

/// Build a streaming chat completion payload, call options take precedence over configuration
pub fn create_streaming_request(
    parameters: &ChatParameters<'_>,
    messages: &[Message],
    options: &CallOptions,
) -> Value {
    let mut payload = Map::new();
    payload.insert("model".to_string(), json!(parameters.model));
    payload.insert(
        "messages".to_string(),
        json!(messages_to_openai_spec(messages)),
    );
    payload.insert("stream".to_string(), json!(true));
    payload.insert(
        "stream_options".to_string(),
        json!({ "include_usage": true }),
    );

    // Add optional parameters
    if let Some(temp) = options.temperature.or(parameters.temperature) {
        payload.insert("temperature".to_string(), json!(temp));
    }
    if let Some(tokens) = options.max_tokens.or(parameters.max_tokens) {
        payload.insert("max_tokens".to_string(), json!(tokens));
    }
    if !options.stop.is_empty() {
        payload.insert("stop".to_string(), json!(options.stop));
    }

    Value::Object(payload)
}

pub fn get_usage(data: &Value) -> Option<Usage> {
    let usage = data.get("usage").filter(|usage| !usage.is_null())?;

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok());

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok());

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => input.checked_add(output),
            _ => None,
        });

    Some(Usage::new(input_tokens, output_tokens, total_tokens))
}

/// One decoded `chat.completion.chunk`
#[derive(Debug, Default, PartialEq)]
pub struct StreamChunk {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

/// Parse the payload of one `data:` line of a streaming chat completion
pub fn parse_stream_chunk(data: &str) -> Result<StreamChunk> {
    let value: Value = serde_json::from_str(data)?;

    if let Some(error) = value.get("error") {
        return Err(anyhow!("OpenAI API error: {}", error));
    }

    let choice = &value["choices"][0];
    Ok(StreamChunk {
        content: choice["delta"]["content"].as_str().map(String::from),
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage: get_usage(&value),
    })
}

/// Splits a server-sent event byte stream into the payloads of its `data:` lines
///
/// Bytes are buffered until a full line is available so multi-byte characters split across
/// network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = Self::data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::data_payload(&line)
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        line.strip_prefix("data:")
            .map(|data| data.trim_start().to_string())
            .filter(|data| !data.is_empty())
    }
}

/// Send a streaming chat completion request and forward its tokens to the run's handlers
///
/// Handlers see start, every token, then either end or the error that is also returned.
pub async fn stream_chat_completion(
    request: RequestBuilder,
    callbacks: &RunCallbacks<'_>,
) -> Result<(Message, Usage)> {
    callbacks.start().await;
    match read_completion_stream(request, callbacks).await {
        Ok(result) => {
            callbacks.end().await;
            Ok(result)
        }
        Err(e) => {
            tracing::debug!("Chat completion run {} failed: {}", callbacks.run_id(), e);
            callbacks.error(&e).await;
            Err(e)
        }
    }
}

async fn read_completion_stream(
    request: RequestBuilder,
    callbacks: &RunCallbacks<'_>,
) -> Result<(Message, Usage)> {
    let response = request.send().await?;

    match response.status() {
        StatusCode::OK => {}
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            return Err(anyhow!("Server error: {}", status));
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Request failed: {}\nBody: {}", status, body));
        }
    }

    let mut decoder = SseDecoder::default();
    let mut bytes = response.bytes_stream();
    let mut text = String::new();
    let mut usage = Usage::default();
    let mut finished = false;

    'read: while let Some(chunk) = bytes.next().await {
        for data in decoder.push(&chunk?) {
            if handle_data(&data, callbacks, &mut text, &mut usage).await? {
                finished = true;
                break 'read;
            }
        }
    }
    if !finished {
        if let Some(data) = decoder.finish() {
            handle_data(&data, callbacks, &mut text, &mut usage).await?;
        }
    }

    Ok((Message::assistant(text), usage))
}

/// Returns true once the `[DONE]` sentinel is seen
async fn handle_data(
    data: &str,
    callbacks: &RunCallbacks<'_>,
    text: &mut String,
    usage: &mut Usage,
) -> Result<bool> {
    if data == "[DONE]" {
        return Ok(true);
    }

    let chunk = parse_stream_chunk(data)?;
    if let Some(chunk_usage) = chunk.usage {
        *usage = chunk_usage;
    }
    if let Some(token) = chunk.content.filter(|token| !token.is_empty()) {
        callbacks.token(&token).await;
        text.push_str(&token);
    }
    Ok(false)
}
