//! Configuration
//!
//! Server, upstream and client settings. Each can be built in code with
//! `with_*` setters or read from the environment:
//!
//! | variable | used by | default |
//! |---|---|---|
//! | `ANTHROPIC_API_KEY` | server | required |
//! | `ANTHROPIC_BASE_URL` | server | `https://api.anthropic.com` |
//! | `PROMPTSTREAM_MODEL` | server | `claude-sonnet-4-5-20250929` |
//! | `PROMPTSTREAM_MAX_TOKENS` | server | `1024` |
//! | `PROMPTSTREAM_BIND` | server | `127.0.0.1:3000` |
//! | `PROMPTSTREAM_AUTH_COOKIE` | server | unset (no gate) |
//! | `PROMPTSTREAM_ENDPOINT` | client | `http://127.0.0.1:3000/api/ai` |
//! | `PROMPTSTREAM_COOKIE` | client | unset |

use std::net::SocketAddr;

use secrecy::SecretString;

use crate::error::GenerateError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/ai";

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Upstream language-model provider settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    /// Generation budget per request.
    pub max_tokens: u32,
}

impl UpstreamConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ANTHROPIC_API_KEY").ok_or_else(|| {
            GenerateError::Configuration("Missing ANTHROPIC_API_KEY environment variable".into())
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("ANTHROPIC_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = lookup("PROMPTSTREAM_MODEL") {
            config = config.with_model(model);
        }
        if let Some(raw) = lookup("PROMPTSTREAM_MAX_TOKENS") {
            let max_tokens = raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                GenerateError::Configuration(format!(
                    "PROMPTSTREAM_MAX_TOKENS must be a positive integer, got '{raw}'"
                ))
            })?;
            config = config.with_max_tokens(max_tokens);
        }
        Ok(config)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Cookie that must be present on `/api/ai` requests. `None` disables the gate.
    pub auth_cookie: Option<String>,
    pub upstream: UpstreamConfig,
}

impl ServerConfig {
    pub fn new(upstream: UpstreamConfig) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            auth_cookie: None,
            upstream,
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_auth_cookie(mut self, name: impl Into<String>) -> Self {
        self.auth_cookie = Some(name.into());
        self
    }

    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream = UpstreamConfig::from_lookup(&lookup)?;
        let raw_addr = lookup("PROMPTSTREAM_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse::<SocketAddr>().map_err(|e| {
            GenerateError::Configuration(format!("Invalid PROMPTSTREAM_BIND '{raw_addr}': {e}"))
        })?;

        let mut config = Self::new(upstream).with_bind_addr(bind_addr);
        if let Some(cookie) = lookup("PROMPTSTREAM_AUTH_COOKIE") {
            config = config.with_auth_cookie(cookie);
        }
        Ok(config)
    }
}

/// Settings for the streaming consumer.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the generation endpoint.
    pub endpoint: String,
    /// Raw `Cookie` header value sent with each request (e.g. `pb_auth=…`).
    pub cookie: Option<SecretString>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cookie: None,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(SecretString::from(cookie.into()));
        self
    }

    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("PROMPTSTREAM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GenerateError::Configuration(format!(
                "PROMPTSTREAM_ENDPOINT must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let mut config = Self::new(endpoint);
        if let Some(cookie) = lookup("PROMPTSTREAM_COOKIE") {
            config = config.with_cookie(cookie);
        }
        Ok(config)
    }
}
