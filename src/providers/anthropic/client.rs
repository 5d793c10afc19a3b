//! Anthropic Messages API token source

use secrecy::ExposeSecret;
use serde_json::json;

use super::streaming::create_upstream_stream;
use crate::config::UpstreamConfig;
use crate::error::GenerateError;
use crate::providers::{TokenSource, UpstreamStream};
use crate::types::GenerationRequest;
use crate::utils::http_headers::ProviderHeaders;

/// Streams completions from `POST {base_url}/v1/messages`.
#[derive(Debug, Clone)]
pub struct AnthropicSource {
    http_client: reqwest::Client,
    config: UpstreamConfig,
}

impl AnthropicSource {
    pub fn new(config: UpstreamConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Request body for one streaming generation.
    pub fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": request.effective_system_prompt(),
            "messages": [{ "role": "user", "content": request.prompt }],
            "stream": true,
        })
    }
}

impl TokenSource for AnthropicSource {
    fn open(&self, request: &GenerationRequest) -> Result<UpstreamStream, GenerateError> {
        let headers = ProviderHeaders::anthropic(self.config.api_key.expose_secret())?;
        let body = self.request_body(request);

        tracing::debug!(
            model = %self.config.model,
            max_tokens = self.config.max_tokens,
            "Opening Anthropic stream"
        );

        let builder = self
            .http_client
            .post(self.messages_url())
            .headers(headers)
            .json(&body);
        Ok(create_upstream_stream(builder))
    }
}
