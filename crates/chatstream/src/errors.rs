use thiserror::Error;

/// Errors observed by the reading side of a token stream
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream aborted: {0}")]
    Aborted(String),

    #[error("Stream handlers dropped before the model signalled completion")]
    HandlersDropped,
}

/// Errors returned by the side-channel data sink
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDataError {
    #[error("Data stream is closed, no further values can be appended")]
    Closed,

    #[error("Data stream has already been closed")]
    AlreadyClosed,
}

/// Errors raised while decoding a framed stream part
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Stream part is missing the `<code>:` prefix: {0}")]
    MissingPrefix(String),

    #[error("Unknown stream part code: {0}")]
    UnknownCode(String),

    #[error("Invalid value for stream part {code}: {source}")]
    InvalidValue {
        code: char,
        #[source]
        source: serde_json::Error,
    },
}
