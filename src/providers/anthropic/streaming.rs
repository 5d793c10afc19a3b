//! Anthropic streaming implementation using eventsource-stream
//!
//! Converts the Messages API SSE stream into [`UpstreamEvent`]s. Only text
//! deltas, the final `message_stop` and `error` events matter here; every
//! other event type is skipped.

use eventsource_stream::{Event, Eventsource};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::error::GenerateError;
use crate::providers::{UpstreamEvent, UpstreamStream};

/// Anthropic stream event structure
#[derive(Debug, Clone, Deserialize)]
struct AnthropicStreamEvent {
    r#type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
    #[serde(default)]
    error: Option<AnthropicError>,
}

/// Delta of a `content_block_delta` event (`text_delta`, `input_json_delta`, ...)
#[derive(Debug, Clone, Deserialize)]
struct AnthropicDelta {
    #[serde(rename = "type", default)]
    delta_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Body of an `error` event
#[derive(Debug, Clone, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AnthropicError {
    fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("Unknown error");
        match &self.error_type {
            Some(kind) => format!("{kind}: {message}"),
            None => message.to_string(),
        }
    }
}

/// Anthropic event converter
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicEventConverter;

impl AnthropicEventConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert one SSE event. `None` means the event carries nothing for the producer.
    pub fn convert_event(&self, event: &Event) -> Option<Result<UpstreamEvent, GenerateError>> {
        tracing::debug!("Anthropic SSE event: {}", event.data);

        let data = event.data.trim();
        if data.is_empty() {
            return None;
        }

        let parsed: AnthropicStreamEvent = match serde_json::from_str(data) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse Anthropic SSE event: {}", e);
                return Some(Err(GenerateError::Upstream(format!(
                    "Failed to parse Anthropic event: {e}"
                ))));
            }
        };

        match parsed.r#type.as_str() {
            "content_block_delta" => {
                let delta = parsed.delta?;
                // tool input and thinking deltas have no place in a text stream
                if delta.delta_type.as_deref().is_some_and(|t| t != "text_delta") {
                    return None;
                }
                delta.text.map(|text| Ok(UpstreamEvent::Text(text)))
            }
            "message_stop" => Some(Ok(UpstreamEvent::End)),
            "error" => {
                let message = parsed
                    .error
                    .map(|e| e.describe())
                    .unwrap_or_else(|| "Unknown error".to_string());
                Some(Err(GenerateError::Upstream(message)))
            }
            _ => None,
        }
    }
}

/// Send `request_builder` and turn the response into an [`UpstreamStream`].
///
/// Nothing is sent until the stream is first polled. Connection failures and
/// non-success statuses become a single `Err` item. The stream ends after
/// `End` or the first `Err`; if the provider closes the connection without
/// `message_stop`, `End` is reported.
pub fn create_upstream_stream(request_builder: reqwest::RequestBuilder) -> UpstreamStream {
    let converter = AnthropicEventConverter::new();
    let s = async_stream::stream! {
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                yield Err(GenerateError::Upstream(format!("Failed to send request: {e}")));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            yield Err(GenerateError::Upstream(format!(
                "HTTP error {}: {}",
                status.as_u16(),
                error_text
            )));
            return;
        }

        let events = response.bytes_stream().eventsource();
        futures::pin_mut!(events);
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    yield Err(GenerateError::Upstream(format!("SSE parsing error: {e}")));
                    return;
                }
            };

            if let Some(converted) = converter.convert_event(&event) {
                let last = !matches!(converted, Ok(UpstreamEvent::Text(_)));
                yield converted;
                if last {
                    return;
                }
            }
        }

        tracing::debug!("Anthropic stream closed without message_stop");
        yield Ok(UpstreamEvent::End);
    };
    Box::pin(s)
}
