use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

use super::bridge::TextStream;
use super::data::StreamData;
use super::protocol::StreamPart;
use crate::errors::StreamError;

const STREAM_DATA_HEADER: &str = "x-experimental-stream-data";
const DATA_CLOSE_WARNING_AFTER: Duration = Duration::from_secs(3);

/// Status and extra headers for a streaming response
#[derive(Debug, Default, Clone)]
pub struct ResponseInit {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl ResponseInit {
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A streaming text response, optionally multiplexed with side-channel data
///
/// Without data the body is the raw token text. With data every token is framed as a text part
/// and appended values are flushed as data parts before the next token; once the token stream
/// ends the body stays open until the data channel is closed.
pub struct StreamingTextResponse {
    stream: TextStream,
    init: ResponseInit,
    data: Option<StreamData>,
}

impl StreamingTextResponse {
    pub fn new(stream: TextStream, init: ResponseInit, data: Option<StreamData>) -> Self {
        Self { stream, init, data }
    }

    /// The body as it will be written to the client
    pub fn into_body_stream(self) -> BoxStream<'static, Result<Bytes, StreamError>> {
        match self.data {
            None => self.stream.map(|token| token.map(Bytes::from)).boxed(),
            Some(data) => frame_with_data(self.stream, data),
        }
    }
}

fn frame_with_data(
    mut stream: TextStream,
    data: StreamData,
) -> BoxStream<'static, Result<Bytes, StreamError>> {
    let framed = async_stream::stream! {
        while let Some(token) = stream.next().await {
            match token {
                Ok(text) => {
                    let pending = data.take_pending();
                    if !pending.is_empty() {
                        yield Ok(Bytes::from(StreamPart::Data(pending).format()));
                    }
                    yield Ok(Bytes::from(StreamPart::Text(text).format()));
                }
                Err(e) => {
                    tracing::warn!("Token stream ended early: {}", e);
                    // data appended before the failure still reaches the client
                    let pending = data.take_pending();
                    if !pending.is_empty() {
                        yield Ok(Bytes::from(StreamPart::Data(pending).format()));
                    }
                    yield Err(e);
                    return;
                }
            }
        }

        if tokio::time::timeout(DATA_CLOSE_WARNING_AFTER, data.closed())
            .await
            .is_err()
        {
            tracing::warn!("Data stream is still open after the token stream ended, waiting for close()");
            data.closed().await;
        }

        let pending = data.take_pending();
        if !pending.is_empty() {
            yield Ok(Bytes::from(StreamPart::Data(pending).format()));
        }
    };
    framed.boxed()
}

impl IntoResponse for StreamingTextResponse {
    fn into_response(self) -> Response {
        let status = self.init.status.unwrap_or(StatusCode::OK);
        let extra_headers = self.init.headers.clone();
        let has_data = self.data.is_some();

        let mut response = Response::new(Body::from_stream(self.into_body_stream()));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        if has_data {
            headers.insert(
                HeaderName::from_static(STREAM_DATA_HEADER),
                HeaderValue::from_static("true"),
            );
        }
        headers.extend(extra_headers);

        response
    }
}
