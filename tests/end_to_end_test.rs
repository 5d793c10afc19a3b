//! Producer and consumer over a real socket
#![cfg(feature = "server-adapters")]

mod support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use promptstream::client::GenerationClient;
use promptstream::config::{ClientConfig, UpstreamConfig};
use promptstream::providers::{AnthropicSource, TokenSource, UpstreamEvent};
use promptstream::server_adapters::axum::{AppState, GENERATE_PATH, router};
use promptstream::types::{GenerationRequest, StreamStatus};
use promptstream::{CancelHandle, GenerateError};
use support::{ScriptedSource, read_fixture};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> GenerationClient {
    GenerationClient::new(ClientConfig::new(format!("http://{addr}{GENERATE_PATH}")))
}

fn state(source: impl TokenSource + 'static) -> AppState {
    AppState::new(Arc::new(source))
}

#[tokio::test]
async fn anthropic_stream_reaches_the_consumer() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(read_fixture("anthropic/hello.sse"), "text/event-stream"),
        )
        .mount(&upstream)
        .await;

    let source = AnthropicSource::new(
        UpstreamConfig::new("test-key").with_base_url(upstream.uri()),
        reqwest::Client::new(),
    );
    let addr = spawn_server(state(source)).await;

    let mut deltas = Vec::new();
    let outcome = client_for(addr)
        .generate(&GenerationRequest::new("Say hello"), CancelHandle::new(), |d| {
            deltas.push(d.to_string())
        })
        .await
        .unwrap();

    assert_eq!(deltas, vec!["Hel", "lo"]);
    assert_eq!(outcome.output, "Hello");
    assert_eq!(outcome.status, StreamStatus::Complete);
}

#[tokio::test]
async fn upstream_error_surfaces_with_partial_output() {
    let source = ScriptedSource::new(vec![
        Ok(UpstreamEvent::Text("Once upon".into())),
        Err(GenerateError::Upstream("overloaded_error: Overloaded".into())),
    ]);
    let addr = spawn_server(state(source)).await;

    let outcome = client_for(addr)
        .generate(&GenerationRequest::new("story"), CancelHandle::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.output, "Once upon");
    let message = outcome.status.error_message().expect("error status");
    assert!(message.contains("Overloaded"));
}

#[tokio::test]
async fn rejected_request_is_an_http_error() {
    let source = ScriptedSource::failing(GenerateError::Configuration("bad key".into()));
    let addr = spawn_server(state(source)).await;

    let err = client_for(addr)
        .generate(&GenerationRequest::new("hi"), CancelHandle::new(), |_| {})
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GenerateError::Http {
            status: 500,
            message: "Failed to generate response".to_string(),
        }
    );
    assert_eq!(err.user_message(), "Failed to generate response.");
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_server() {
    let source = ScriptedSource::texts(&["never"]);
    let opens = source.opens();
    let addr = spawn_server(state(source)).await;

    let err = client_for(addr)
        .generate(&GenerationRequest::new(" \n\t"), CancelHandle::new(), |_| {})
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_mid_stream_stops_updates() {
    let source = ScriptedSource::hanging(vec![
        Ok(UpstreamEvent::Text("first".into())),
        Ok(UpstreamEvent::Text("second".into())),
    ])
    .with_delay(Duration::from_millis(10));
    let released = source.released();
    let addr = spawn_server(state(source)).await;

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    let mut deltas = Vec::new();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        client_for(addr).generate(&GenerationRequest::new("long"), cancel, |d| {
            deltas.push(d.to_string());
            if d == "second" {
                trigger.cancel();
            }
        }),
    )
    .await
    .expect("cancellation should end generation")
    .unwrap();

    assert_eq!(outcome.status, StreamStatus::Cancelled);
    assert_eq!(outcome.output, "firstsecond");
    assert_eq!(deltas, vec!["first", "second"]);

    // the server notices the closed connection and drops the upstream
    tokio::time::timeout(Duration::from_secs(2), async {
        while !released.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("upstream should be released after the client cancels");
}
