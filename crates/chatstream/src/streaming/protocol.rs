//! Line framing for multiplexed stream bodies
//!
//! Each part is written as `<code>:<json>\n`. Text parts carry a JSON string, data parts a JSON
//! array of the values appended since the previous flush, and error parts a JSON string.
use serde_json::{json, Value};

use crate::errors::ProtocolError;

const TEXT_CODE: char = '0';
const DATA_CODE: char = '2';
const ERROR_CODE: char = '3';

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    Text(String),
    Data(Vec<Value>),
    Error(String),
}

impl StreamPart {
    pub fn code(&self) -> char {
        match self {
            StreamPart::Text(_) => TEXT_CODE,
            StreamPart::Data(_) => DATA_CODE,
            StreamPart::Error(_) => ERROR_CODE,
        }
    }

    /// Encode the part as a single newline-terminated line
    pub fn format(&self) -> String {
        let value = match self {
            StreamPart::Text(text) => json!(text),
            StreamPart::Data(values) => json!(values),
            StreamPart::Error(message) => json!(message),
        };
        format!("{}:{}\n", self.code(), value)
    }
}

/// Decode a single framed line, with or without its trailing newline
pub fn parse_stream_part(line: &str) -> Result<StreamPart, ProtocolError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (code, value) = line
        .split_once(':')
        .ok_or_else(|| ProtocolError::MissingPrefix(line.to_string()))?;

    let mut chars = code.chars();
    let code = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(ProtocolError::UnknownCode(code.to_string())),
    };

    let invalid = |source| ProtocolError::InvalidValue { code, source };
    match code {
        TEXT_CODE => Ok(StreamPart::Text(
            serde_json::from_str(value).map_err(invalid)?,
        )),
        DATA_CODE => Ok(StreamPart::Data(
            serde_json::from_str(value).map_err(invalid)?,
        )),
        ERROR_CODE => Ok(StreamPart::Error(
            serde_json::from_str(value).map_err(invalid)?,
        )),
        other => Err(ProtocolError::UnknownCode(other.to_string())),
    }
}

/// Decode every non-empty line of a complete body
pub fn parse_stream_parts(body: &str) -> Result<Vec<StreamPart>, ProtocolError> {
    body.lines()
        .filter(|line| !line.is_empty())
        .map(parse_stream_part)
        .collect()
}
