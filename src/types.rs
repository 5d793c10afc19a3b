//! Request and wire types
//!
//! Everything here lives for a single request: a `GenerationRequest` is
//! consumed when the HTTP call returns, and `Frame`/`StreamStatus` exist only
//! while one streaming response is in flight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::GenerateError;

/// System prompt used when the caller does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Body of `POST /api/ai`.
///
/// A missing `prompt` deserializes to an empty string so that both cases are
/// rejected by the same validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// User prompt. Must be non-empty.
    #[serde(default)]
    #[validate(length(min = 1, message = "Prompt is required"))]
    pub prompt: String,

    /// Optional system prompt; defaults to [`DEFAULT_SYSTEM_PROMPT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// System prompt sent upstream. Empty strings fall back to the default persona.
    pub fn effective_system_prompt(&self) -> &str {
        match self.system_prompt.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_SYSTEM_PROMPT,
        }
    }

    /// Validate the request, mapping the first field message into a `Validation` error.
    pub fn validate_request(&self) -> Result<(), GenerateError> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| errors.to_string());
            GenerateError::Validation(message)
        })
    }
}

/// Content presets offered by the dashboard generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    BlogPost,
    MarketingCopy,
    EmailDraft,
    #[default]
    General,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::BlogPost,
        Preset::MarketingCopy,
        Preset::EmailDraft,
        Preset::General,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Preset::BlogPost => "Blog post",
            Preset::MarketingCopy => "Marketing copy",
            Preset::EmailDraft => "Email draft",
            Preset::General => "General",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Preset::BlogPost => {
                "You are an expert blog writer. Write engaging, well-structured blog content."
            }
            Preset::MarketingCopy => {
                "You are a marketing copywriter. Write compelling, conversion-focused copy."
            }
            Preset::EmailDraft => "You are a professional email writer. Write clear, concise emails.",
            Preset::General => DEFAULT_SYSTEM_PROMPT,
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Preset::BlogPost => "Write a blog post about...",
            Preset::MarketingCopy => "Write marketing copy for...",
            Preset::EmailDraft => "Draft an email about...",
            Preset::General => "Ask anything...",
        }
    }

    /// Short name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Preset::BlogPost => "blog",
            Preset::MarketingCopy => "marketing",
            Preset::EmailDraft => "email",
            Preset::General => "general",
        }
    }

    /// Build a request carrying this preset's system prompt.
    pub fn request(self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(prompt).with_system_prompt(self.system_prompt())
    }
}

impl FromStr for Preset {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                GenerateError::Validation(format!(
                    "Unknown preset '{s}'. Valid options: {}",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit of the streaming wire protocol.
///
/// Frames are totally ordered within a stream and `Error`/`Done` are always
/// the last frame sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental text delta.
    Text { text: String },
    /// Upstream failure; the stream closes after it.
    Error { message: String },
    /// Normal end of generation.
    Done,
}

impl Frame {
    pub fn text(text: impl Into<String>) -> Self {
        Frame::Text { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Frame::Error {
            message: message.into(),
        }
    }

    /// Whether no frame may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::Error { .. } | Frame::Done)
    }
}

/// Terminal status of one consumed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    /// The `[DONE]` sentinel was observed.
    Complete,
    /// The caller cancelled before the sentinel arrived.
    Cancelled,
    /// Upstream error frame, transport failure or truncated stream.
    Error(String),
}

impl StreamStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, StreamStatus::Complete)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamStatus::Cancelled)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            StreamStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }
}
