//! HTTP Headers Utility
//!
//! Builds the header set for upstream provider requests.

use crate::error::GenerateError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

/// Anthropic Messages API version pinned by this crate.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP header builder for API requests
#[derive(Debug, Default)]
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    /// Create a new header builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, rejecting names or values that are not valid HTTP.
    ///
    /// Values are not echoed into the error since they may be credentials.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, GenerateError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            GenerateError::Configuration(format!("Invalid header name '{name}': {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            GenerateError::Configuration(format!("Invalid value for header '{name}': {e}"))
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Add JSON content type
    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Ask for an event stream response
    pub fn with_event_stream_accept(mut self) -> Self {
        self.headers
            .insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        self
    }

    /// Add user agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self, GenerateError> {
        self.headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| {
                GenerateError::Configuration(format!("Invalid user agent: {e}"))
            })?,
        );
        Ok(self)
    }

    /// Build the final HeaderMap
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

/// Provider-specific header builders
pub struct ProviderHeaders;

impl ProviderHeaders {
    /// Build headers for a streaming Anthropic Messages request
    pub fn anthropic(api_key: &str) -> Result<HeaderMap, GenerateError> {
        let version = env!("CARGO_PKG_VERSION");
        let builder = HttpHeaderBuilder::new()
            .with_header("x-api-key", api_key)?
            .with_header("anthropic-version", ANTHROPIC_VERSION)?
            .with_json_content_type()
            .with_event_stream_accept()
            .with_user_agent(&format!("promptstream/{version}"))?;

        Ok(builder.build())
    }
}
