use super::ChatRequest;
use crate::invocation::spawn_model_call;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use chatstream::{
    callbacks::CallbackHandler,
    models::message::adapt,
    providers::base::CallOptions,
    streaming::{create_bridge, ResponseInit, StreamCallbacks, StreamData, StreamingTextResponse},
};
use serde_json::json;
use std::sync::Arc;

/// Stream the model's tokens with a side channel that receives one record when the model finishes
async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> StreamingTextResponse {
    let messages = adapt(&request.messages);
    let data = StreamData::new();

    let callbacks = StreamCallbacks::new().on_final({
        let data = data.clone();
        move |_| {
            // records travel as serialized text
            let record = json!({ "key": "value" }).to_string();
            if let Err(e) = data.append(record) {
                tracing::warn!("Failed to append final data: {}", e);
            }
            if let Err(e) = data.close() {
                tracing::warn!("Failed to close data stream: {}", e);
            }
        }
    });
    let (stream, handlers) = create_bridge(callbacks);

    let handlers: Vec<Arc<dyn CallbackHandler>> = vec![handlers];
    spawn_model_call(state.model, messages, CallOptions::default(), handlers);

    StreamingTextResponse::new(stream, ResponseInit::default(), Some(data))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/stream-data-basic", post(handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_model::{LogCapture, ScriptedModel};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chatstream::models::message::Message;
    use chatstream::streaming::protocol::{parse_stream_parts, StreamPart};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri("/api/stream-data-basic")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_streams_tokens_then_final_data() {
        let model = Arc::new(ScriptedModel::new(&["Hello", " there"]));
        let app = routes(AppState::new(model.clone()));

        let response = app
            .oneshot(chat_request(json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "system", "content": "odd one"}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()["x-experimental-stream-data"], "true");

        let body = body_text(response).await;
        assert_eq!(
            parse_stream_parts(&body).unwrap(),
            vec![
                StreamPart::Text("Hello".to_string()),
                StreamPart::Text(" there".to_string()),
                StreamPart::Data(vec![json!("{\"key\":\"value\"}")]),
            ]
        );
        assert_eq!(
            model.received(),
            vec![vec![
                Message::human("hi"),
                Message::assistant("hello"),
                Message::assistant("odd one"),
            ]]
        );
    }

    #[tokio::test]
    async fn test_response_returns_before_model_finishes() {
        let gate = Arc::new(Notify::new());
        let model = Arc::new(ScriptedModel::new(&["late"]).gated(gate.clone()));
        let app = routes(AppState::new(model.clone()));

        let response = tokio::time::timeout(
            Duration::from_secs(1),
            app.oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "hi"}]
            }))),
        )
        .await
        .expect("response should not wait for the model")
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!model.is_completed());

        gate.notify_one();
        let body = body_text(response).await;
        assert_eq!(body, "0:\"late\"\n2:[\"{\\\"key\\\":\\\"value\\\"}\"]\n");
    }

    #[tokio::test]
    async fn test_final_record_is_serialized_text() {
        let model = Arc::new(ScriptedModel::new(&["hi"]));
        let app = routes(AppState::new(model));

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .await
            .unwrap();

        let body = body_text(response).await;
        assert_eq!(
            body,
            concat!(r#"0:"hi""#, "\n", r#"2:["{\"key\":\"value\"}"]"#, "\n")
        );

        let parts = parse_stream_parts(&body).unwrap();
        let StreamPart::Data(records) = &parts[1] else {
            panic!("Expected a data part, got {:?}", parts[1]);
        };
        let record: serde_json::Value =
            serde_json::from_str(records[0].as_str().unwrap()).unwrap();
        assert_eq!(record, json!({"key": "value"}));
    }

    #[tokio::test]
    async fn test_model_failure_is_logged_and_truncates_stream() {
        let logs = LogCapture::default();
        let _guard = logs.install();

        let model = Arc::new(ScriptedModel::new(&["partial"]).failing("provider unavailable"));
        let app = routes(AppState::new(model.clone()));

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        assert_eq!(body.next().await.unwrap().unwrap(), "0:\"partial\"\n");
        assert!(body.next().await.unwrap().is_err());

        for _ in 0..100 {
            if model.is_completed() && logs.contents().contains("provider unavailable") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(logs
            .contents()
            .contains("Chat model call failed: provider unavailable"));
    }

    #[tokio::test]
    async fn test_malformed_requests_are_rejected() {
        let model = Arc::new(ScriptedModel::new(&["unused"]));
        let app = routes(AppState::new(model.clone()));

        let invalid_json = Request::builder()
            .uri("/api/stream-data-basic")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(invalid_json).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let missing_messages = chat_request(json!({"prompt": "hi"}));
        let response = app.clone().oneshot(missing_messages).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bad_message = chat_request(json!({"messages": [{"role": "user"}]}));
        let response = app.clone().oneshot(bad_message).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let no_content_type = Request::builder()
            .uri("/api/stream-data-basic")
            .method("POST")
            .body(Body::from(json!({"messages": []}).to_string()))
            .unwrap();
        let response = app.oneshot(no_content_type).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        assert!(model.received().is_empty());
    }
}
