// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the chat-completion adapter against a mock server.

use std::time::Duration;

use futures::StreamExt;
use quire_core::{CompletionProvider, CompletionRequest, ProviderKind, QuireError};
use quire_openai::{ChatCompletionProvider, ChatSettings};
use quire_test_utils::DripServer;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> ChatCompletionProvider {
    provider_with_probe(server, Duration::from_secs(15))
}

fn provider_with_probe(server: &MockServer, probe_timeout: Duration) -> ChatCompletionProvider {
    ChatCompletionProvider::new(ChatSettings {
        kind: ProviderKind::Custom,
        model: "test-model".into(),
        api_key: "sk-test".into(),
        endpoint: Some(format!("{}/v1/", server.uri())),
        request_timeout: Duration::from_secs(30),
        probe_timeout,
    })
    .expect("provider should build")
}

fn provider_at(base: &str, request_timeout: Duration) -> ChatCompletionProvider {
    ChatCompletionProvider::new(ChatSettings {
        kind: ProviderKind::Custom,
        model: "test-model".into(),
        api_key: "sk-test".into(),
        endpoint: Some(format!("{base}/v1")),
        request_timeout,
        probe_timeout: Duration::from_secs(15),
    })
    .expect("provider should build")
}

fn delta_event(text: &str) -> Vec<u8> {
    let chunk = serde_json::json!({"choices": [{"delta": {"content": text}}]});
    format!("data: {chunk}\n\n").into_bytes()
}

fn request() -> CompletionRequest {
    CompletionRequest::new("You write journals.", "Went for a walk.", 256)
}

fn sse_body(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{l}\n\n")).collect()
}

#[tokio::test]
async fn stream_sends_headers_and_body_and_decodes_chunks() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
        r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
        ": keep-alive",
        r#"data: {"choices":[{"delta":{"content":" world"}}]}"#,
        "data: [DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "stream": true,
            "max_tokens": 256,
            "messages": [
                {"role": "system", "content": "You write journals."},
                {"role": "user", "content": "Went for a walk."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = provider(&server).stream(request()).await.unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks, vec!["Hello", " world"]);
}

#[tokio::test]
async fn stream_error_status_carries_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited\nslow down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).stream(request()).await.err().unwrap();
    match err {
        QuireError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited\nslow down");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn json_mode_requests_json_object_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "stream": false,
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"title\":\"t\"}"}}]
        })))
        .mount(&server)
        .await;

    let text = provider(&server).complete_json(request()).await.unwrap();
    assert_eq!(text, r#"{"title":"t"}"#);
}

#[tokio::test]
async fn json_mode_does_not_retry_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).complete_json(request()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn json_mode_missing_choices_is_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "x"})))
        .mount(&server)
        .await;

    let err = provider(&server).complete_json(request()).await.unwrap_err();
    assert!(matches!(err, QuireError::ParseFailure { .. }), "{err:?}");
}

#[tokio::test]
async fn probe_sends_one_token_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({"max_tokens": 1, "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "p"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(provider(&server).probe().await.unwrap());
}

#[tokio::test]
async fn probe_reports_rejected_credentials_as_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    assert!(!provider(&server).probe().await.unwrap());
}

#[tokio::test]
async fn probe_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = provider_with_probe(&server, Duration::from_millis(100))
        .probe()
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // A non-pooled server actually shuts down on drop; pooled ones keep listening.
    let server = MockServer::builder().start().await;
    let provider = provider(&server);
    drop(server);

    let err = provider.complete_json(request()).await.unwrap_err();
    assert!(matches!(err, QuireError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn stream_skips_line_that_is_not_utf8() {
    let server = MockServer::start().await;
    let mut body = sse_body(&[r#"data: {"choices":[{"delta":{"content":"a"}}]}"#]).into_bytes();
    body.extend_from_slice(b"data: \xff\xfe\n\n");
    body.extend_from_slice(
        sse_body(&[r#"data: {"choices":[{"delta":{"content":"b"}}]}"#, "data: [DONE]"]).as_bytes(),
    );

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = provider(&server).stream(request()).await.unwrap();
    let items: Vec<_> = stream.collect().await;
    let chunks: Vec<String> = items.into_iter().map(|c| c.unwrap()).collect();
    assert_eq!(chunks, vec!["a", "b"]);
}

#[tokio::test]
async fn long_stream_outlives_request_timeout() {
    let mut chunks: Vec<Vec<u8>> = (0..6).map(|i| delta_event(&format!("c{i}"))).collect();
    chunks.push(b"data: [DONE]\n\n".to_vec());
    let server = DripServer::start(
        "text/event-stream",
        chunks,
        Duration::from_millis(100),
        Duration::ZERO,
    )
    .await
    .unwrap();

    let provider = provider_at(server.uri(), Duration::from_millis(400));
    let stream = provider.stream(request()).await.unwrap();
    let items: Vec<_> = stream.collect().await;
    let chunks: Vec<String> = items.into_iter().map(|c| c.unwrap()).collect();
    assert_eq!(chunks, vec!["c0", "c1", "c2", "c3", "c4", "c5"]);
}

#[tokio::test]
async fn stalled_stream_ends_with_timeout() {
    let server = DripServer::start(
        "text/event-stream",
        vec![delta_event("c0")],
        Duration::ZERO,
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    let provider = provider_at(server.uri(), Duration::from_millis(200));
    let stream = provider.stream(request()).await.unwrap();
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items[0].as_ref().unwrap(), "c0");
    assert!(
        matches!(items[1], Err(QuireError::Timeout { .. })),
        "{:?}",
        items[1]
    );
}

#[tokio::test]
async fn json_mode_is_bounded_by_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"choices":[{"message":{"content":"late"}}]}"#)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = provider_at(&server.uri(), Duration::from_millis(150))
        .complete_json(request())
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::Timeout { .. }), "{err:?}");
}
