//! # promptstream - streaming text generation over Server-Sent Events
//!
//! Two halves of one wire contract:
//!
//! - **Producer** ([`server_adapters`]): turns an upstream token stream into
//!   `data: {"text":...}\n\n` frames, ending with exactly one
//!   `data: {"error":...}\n\n` or `data: [DONE]\n\n`.
//! - **Consumer** ([`client`]): reads the body incrementally, reassembles
//!   frames split across chunks and multi-byte characters split across
//!   chunks, and stops promptly when cancelled.
//!
#![deny(unsafe_code)]

//! ## Quick Start
//!
//! ```rust,no_run
//! use promptstream::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GenerationClient::new(ClientConfig::default());
//!     let request = Preset::BlogPost.request("Rust error handling");
//!
//!     let outcome = client
//!         .generate(&request, CancelHandle::new(), |delta| print!("{delta}"))
//!         .await?;
//!     assert!(outcome.status.is_complete());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod framing;
pub mod providers;
pub mod server_adapters;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use error::{GenerateError, Result};
pub use utils::CancelHandle;

/// Commonly used types.
pub mod prelude {
    pub use crate::client::{ConsumerOutcome, GenerationClient, StreamConsumer};
    pub use crate::config::{ClientConfig, ServerConfig, UpstreamConfig};
    pub use crate::error::GenerateError;
    pub use crate::providers::{AnthropicSource, TokenSource, UpstreamEvent, UpstreamStream};
    pub use crate::types::{Frame, GenerationRequest, Preset, StreamStatus};
    pub use crate::utils::CancelHandle;
}
