//! Stream consumer
//!
//! Reads a `text/event-stream` body incrementally and turns it back into text
//! deltas. The read loop is strictly sequential: one chunk is decoded, split
//! into frames and dispatched before the next chunk is requested.
//!
//! ## Example
//!
//! ```rust,no_run
//! use promptstream::client::GenerationClient;
//! use promptstream::config::ClientConfig;
//! use promptstream::types::GenerationRequest;
//! use promptstream::CancelHandle;
//!
//! # async fn run() -> Result<(), promptstream::GenerateError> {
//! let client = GenerationClient::new(ClientConfig::default());
//! let cancel = CancelHandle::new();
//! let outcome = client
//!     .generate(&GenerationRequest::new("Write a haiku"), cancel.clone(), |delta| {
//!         print!("{delta}")
//!     })
//!     .await?;
//! println!("\n{:?}", outcome.status);
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;

use futures::{Stream, StreamExt};
use secrecy::ExposeSecret;

use crate::config::ClientConfig;
use crate::error::GenerateError;
use crate::framing::{parse_frame, split_frames};
use crate::types::{Frame, GenerationRequest, StreamStatus};
use crate::utils::{CancelHandle, Utf8StreamDecoder};

/// Status reported when the body closes before `[DONE]`.
pub const TRUNCATED_MESSAGE: &str = "stream ended before completion";

/// Mutable state of one consumption.
#[derive(Debug, Default)]
pub struct StreamState {
    /// Decoded text that does not yet form a complete frame.
    pub buffer: String,
    /// Concatenation of every text delta dispatched so far.
    pub accumulated_output: String,
    /// `true` from the start of the read loop until a terminal status.
    pub is_active: bool,
    pub cancel: CancelHandle,
}

/// Result of consuming one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerOutcome {
    pub status: StreamStatus,
    /// Output accumulated before the terminal status, kept even on error.
    pub output: String,
}

impl ConsumerOutcome {
    fn cancelled() -> Self {
        Self {
            status: StreamStatus::Cancelled,
            output: String::new(),
        }
    }
}

/// Consumes one frame stream.
#[derive(Debug)]
pub struct StreamConsumer {
    state: StreamState,
    decoder: Utf8StreamDecoder,
}

impl StreamConsumer {
    /// Create a consumer observing `cancel`.
    pub fn new(cancel: CancelHandle) -> Self {
        Self {
            state: StreamState {
                cancel,
                ..StreamState::default()
            },
            decoder: Utf8StreamDecoder::new(),
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Read `stream` to a terminal status, calling `on_text` for each text
    /// delta in order.
    ///
    /// Cancellation is checked before every chunk and every frame; once it is
    /// observed `on_text` is not called again and the stream is dropped.
    pub async fn consume<S, B, E, F>(mut self, stream: S, mut on_text: F) -> ConsumerOutcome
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
        F: FnMut(&str),
    {
        futures::pin_mut!(stream);
        let cancel = self.state.cancel.clone();
        self.state.is_active = true;

        let status = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break StreamStatus::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let text = self.decoder.decode(chunk.as_ref());
                    if let Some(status) = self.feed(&text, &mut on_text) {
                        break status;
                    }
                }
                Some(Err(e)) => {
                    if cancel.is_cancelled() {
                        break StreamStatus::Cancelled;
                    }
                    tracing::warn!("Stream read failed: {e}");
                    break StreamStatus::Error(GenerateError::Transport(e.to_string()).to_string());
                }
                None => {
                    let tail = self.decoder.finish();
                    if let Some(status) = self.feed(&tail, &mut on_text) {
                        break status;
                    }
                    tracing::debug!(
                        buffered = self.state.buffer.len(),
                        "Stream closed without [DONE]"
                    );
                    break StreamStatus::Error(TRUNCATED_MESSAGE.to_string());
                }
            }
        };

        self.state.is_active = false;
        self.state.buffer.clear();
        ConsumerOutcome {
            status,
            output: self.state.accumulated_output,
        }
    }

    /// Split decoded text into frames and dispatch them. Returns the terminal
    /// status if one was reached.
    fn feed<F>(&mut self, text: &str, on_text: &mut F) -> Option<StreamStatus>
    where
        F: FnMut(&str),
    {
        if text.is_empty() {
            return None;
        }

        let (segments, rest) = split_frames(&self.state.buffer, text);
        self.state.buffer = rest;

        for segment in segments {
            if self.state.cancel.is_cancelled() {
                return Some(StreamStatus::Cancelled);
            }
            match parse_frame(&segment) {
                Ok(Some(Frame::Text { text })) => {
                    self.state.accumulated_output.push_str(&text);
                    on_text(&text);
                }
                Ok(Some(Frame::Done)) => return Some(StreamStatus::Complete),
                Ok(Some(Frame::Error { message })) => {
                    tracing::warn!("Stream reported an error: {message}");
                    return Some(StreamStatus::Error(message));
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping malformed frame: {e}"),
            }
        }
        None
    }
}

/// HTTP client for the generation endpoint.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GenerationClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit `request` and consume the response stream.
    ///
    /// Returns `Err` when no stream could be consumed: a blank prompt
    /// (rejected before any request), a failed connection or a non-success
    /// status. Once the stream is open every outcome, including errors and
    /// cancellation, is reported through [`ConsumerOutcome::status`].
    pub async fn generate<F>(
        &self,
        request: &GenerationRequest,
        cancel: CancelHandle,
        on_text: F,
    ) -> Result<ConsumerOutcome, GenerateError>
    where
        F: FnMut(&str),
    {
        if request.prompt.trim().is_empty() {
            return Err(GenerateError::Validation("Prompt is required".to_string()));
        }

        let mut builder = self
            .http
            .post(&self.config.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);
        if let Some(cookie) = &self.config.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie.expose_secret());
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(ConsumerOutcome::cancelled()),
            response = builder.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(ConsumerOutcome::cancelled()),
                body = response.text() => body.unwrap_or_default(),
            };
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| "Failed to generate response".to_string());
            tracing::warn!(status = status.as_u16(), "Generation request rejected: {message}");
            return Err(GenerateError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(StreamConsumer::new(cancel)
            .consume(response.bytes_stream(), on_text)
            .await)
    }
}
