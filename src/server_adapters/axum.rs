//! Axum-specific server adapters
//!
//! Exposes the generation endpoint:
//!
//! - `POST /api/ai` with `{ "prompt": string, "systemPrompt"?: string }`
//! - `400 {"error"}` for malformed bodies or an empty prompt (no upstream call)
//! - `401 {"error"}` when the auth cookie gate is enabled and the cookie is missing
//! - `500 {"error"}` when the upstream stream cannot be constructed
//! - `200 text/event-stream` otherwise
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use promptstream::config::UpstreamConfig;
//! use promptstream::providers::AnthropicSource;
//! use promptstream::server_adapters::axum::{router, AppState};
//!
//! # async fn run() -> std::io::Result<()> {
//! let source = AnthropicSource::new(UpstreamConfig::new("sk-..."), reqwest::Client::new());
//! let app = router(AppState::new(Arc::new(source)));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::GenerateError;
use crate::providers::{AnthropicSource, TokenSource, UpstreamStream};
use crate::server_adapters::sse_body;
use crate::types::GenerationRequest;

/// Path of the generation endpoint.
pub const GENERATE_PATH: &str = "/api/ai";

/// Shared state of the generation route.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn TokenSource>,
    auth_cookie: Option<Arc<str>>,
}

impl AppState {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            auth_cookie: None,
        }
    }

    /// Require a non-empty cookie named `name` on every generation request.
    pub fn with_auth_cookie(mut self, name: impl Into<String>) -> Self {
        self.auth_cookie = Some(Arc::from(name.into()));
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(GENERATE_PATH, post(generate))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), GenerateError> {
    let source = Arc::new(AnthropicSource::new(
        config.upstream.clone(),
        reqwest::Client::new(),
    ));
    let mut state = AppState::new(source.clone());
    if let Some(cookie) = &config.auth_cookie {
        state = state.with_auth_cookie(cookie.clone());
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| {
            GenerateError::Configuration(format!("Failed to bind {}: {e}", config.bind_addr))
        })?;
    tracing::info!(
        addr = %config.bind_addr,
        model = %source.config().model,
        "Listening on http://{}{}",
        config.bind_addr,
        GENERATE_PATH
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .map_err(|e| GenerateError::Transport(format!("Server error: {e}")))
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let response = next.run(request).await;
        tracing::info!(status = response.status().as_u16(), "Responded");
        response
    }
    .instrument(span)
    .await
}

/// `POST /api/ai`
pub async fn generate(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(cookie) = state.auth_cookie.as_deref()
        && !has_cookie(&headers, cookie)
    {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let request: GenerationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejecting malformed request body: {e}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    if let Err(e) = request.validate_request() {
        tracing::debug!("Rejecting request: {e}");
        let message = match e {
            GenerateError::Validation(msg) => msg,
            other => other.to_string(),
        };
        return error_response(StatusCode::BAD_REQUEST, &message);
    }

    match state.source.open(&request) {
        Ok(upstream) => sse_response(upstream),
        Err(e) => {
            tracing::error!("AI route error: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate response")
        }
    }
}

/// Wrap an upstream stream in a `text/event-stream` response.
///
/// The body is written frame by frame as the upstream delivers events, so
/// the first token reaches the client without waiting for the rest.
pub fn sse_response(upstream: UpstreamStream) -> Response {
    let mut response = Response::new(Body::from_stream(sse_body(upstream)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(key, value)| key == name && !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn cookie_lookup() {
        let headers = headers_with_cookie("theme=dark; pb_auth=abc123");
        assert!(has_cookie(&headers, "pb_auth"));
        assert!(!has_cookie(&headers, "session"));

        let headers = headers_with_cookie("pb_auth=");
        assert!(!has_cookie(&headers, "pb_auth"));

        assert!(!has_cookie(&HeaderMap::new(), "pb_auth"));
    }
}
