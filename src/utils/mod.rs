//! Utility modules
//!
//! Small building blocks shared by the producer and the consumer.

pub mod cancel;
pub mod http_headers;
pub mod utf8_decoder;

pub use cancel::CancelHandle;
pub use utf8_decoder::Utf8StreamDecoder;
