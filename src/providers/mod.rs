//! Upstream token sources
//!
//! A `TokenSource` opens one upstream generation stream per request. The
//! producer only depends on the text / error / end contract expressed by
//! [`UpstreamEvent`] and the stream's `Err` items.

use std::pin::Pin;

use futures::Stream;

use crate::error::GenerateError;
use crate::types::GenerationRequest;

pub mod anthropic;

pub use anthropic::AnthropicSource;

/// Event delivered by an upstream stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Incremental text delta.
    Text(String),
    /// Normal end of generation.
    End,
}

/// Ordered upstream events. An `Err` item is an upstream failure.
pub type UpstreamStream =
    Pin<Box<dyn Stream<Item = Result<UpstreamEvent, GenerateError>> + Send>>;

/// Opens upstream generation streams.
pub trait TokenSource: Send + Sync {
    /// Open a new stream for `request`.
    ///
    /// Returning `Err` means the stream could not even be constructed (bad
    /// credentials format, unserializable body); such failures happen before
    /// any frame is sent. Connection and provider failures are delivered as
    /// `Err` items of the returned stream instead.
    fn open(&self, request: &GenerationRequest) -> Result<UpstreamStream, GenerateError>;
}
