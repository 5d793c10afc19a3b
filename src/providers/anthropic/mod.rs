//! Anthropic provider

pub mod client;
pub mod streaming;

pub use client::AnthropicSource;
pub use streaming::AnthropicEventConverter;
