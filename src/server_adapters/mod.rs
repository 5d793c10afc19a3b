//! Server adapters: convert an upstream token stream into SSE frames
//!
//! The producer is an explicit two-state machine:
//!
//! ```text
//! Active --Text--> Active
//! Active --Error--> Terminated
//! Active --Done--> Terminated
//! ```
//!
//! Frames are emitted one per upstream event, in arrival order, without
//! batching. Once `Terminated`, nothing more is emitted and the upstream
//! stream is dropped, which closes the provider connection.
//!
//! ## Example (Axum)
//!
//! ```rust,no_run
//! # #[cfg(feature = "server-adapters")]
//! # async fn run() -> Result<(), promptstream::GenerateError> {
//! use promptstream::config::{ServerConfig, UpstreamConfig};
//! use promptstream::server_adapters::axum::serve;
//!
//! serve(ServerConfig::new(UpstreamConfig::new("sk-..."))).await
//! # }
//! ```

use std::convert::Infallible;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::GenerateError;
use crate::providers::{UpstreamEvent, UpstreamStream};
use crate::types::Frame;

#[cfg(feature = "server-adapters")]
pub mod axum;

/// Producer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProducerState {
    #[default]
    Active,
    Terminated,
}

/// Translates upstream events into frames with exactly-once termination.
#[derive(Debug, Default)]
pub struct FrameProducer {
    state: ProducerState,
    text_frames: usize,
}

impl FrameProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// Number of text frames emitted so far.
    pub fn text_frames(&self) -> usize {
        self.text_frames
    }

    /// Apply one upstream event. Returns `None` once terminated.
    pub fn step(&mut self, event: Result<UpstreamEvent, GenerateError>) -> Option<Frame> {
        if self.state == ProducerState::Terminated {
            return None;
        }

        let frame = match event {
            Ok(UpstreamEvent::Text(text)) => {
                self.text_frames += 1;
                Frame::Text { text }
            }
            Ok(UpstreamEvent::End) => Frame::Done,
            Err(e) => {
                tracing::warn!(text_frames = self.text_frames, "Upstream stream failed: {e}");
                Frame::Error {
                    message: e.to_string(),
                }
            }
        };

        if frame.is_terminal() {
            self.state = ProducerState::Terminated;
        }
        Some(frame)
    }

    /// Called when the upstream stream is exhausted. An upstream that closes
    /// without an explicit end still finishes normally.
    pub fn finish(&mut self) -> Option<Frame> {
        match self.state {
            ProducerState::Active => {
                self.state = ProducerState::Terminated;
                Some(Frame::Done)
            }
            ProducerState::Terminated => None,
        }
    }
}

/// Convert an upstream stream into the ordered frame sequence of one response.
pub fn frame_stream(upstream: UpstreamStream) -> impl Stream<Item = Frame> + Send {
    async_stream::stream! {
        let mut upstream = upstream;
        let mut producer = FrameProducer::new();

        while let Some(event) = upstream.next().await {
            let Some(frame) = producer.step(event) else { break };
            let terminal = frame.is_terminal();
            yield frame;
            if terminal {
                break;
            }
        }
        drop(upstream);

        if let Some(frame) = producer.finish() {
            yield frame;
        }
        tracing::debug!(text_frames = producer.text_frames(), "Response stream finished");
    }
}

/// Response body bytes: each frame encoded as `data: ...\n\n`.
pub fn sse_body(upstream: UpstreamStream) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    frame_stream(upstream).map(|frame| Ok(frame.encode()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn upstream(events: Vec<Result<UpstreamEvent, GenerateError>>) -> UpstreamStream {
        Box::pin(stream::iter(events))
    }

    #[test]
    fn text_keeps_producer_active() {
        let mut producer = FrameProducer::new();
        let frame = producer.step(Ok(UpstreamEvent::Text("a".into())));
        assert_eq!(frame, Some(Frame::text("a")));
        assert_eq!(producer.state(), ProducerState::Active);
    }

    #[test]
    fn error_terminates_exactly_once() {
        let mut producer = FrameProducer::new();
        let frame = producer.step(Err(GenerateError::Upstream("rate_limited".into())));
        assert_eq!(frame, Some(Frame::error("Upstream error: rate_limited")));
        assert_eq!(producer.state(), ProducerState::Terminated);

        assert_eq!(producer.step(Ok(UpstreamEvent::Text("late".into()))), None);
        assert_eq!(producer.step(Ok(UpstreamEvent::End)), None);
        assert_eq!(producer.finish(), None);
    }

    #[test]
    fn exhaustion_without_end_finishes_with_done() {
        let mut producer = FrameProducer::new();
        producer.step(Ok(UpstreamEvent::Text("a".into())));
        assert_eq!(producer.finish(), Some(Frame::Done));
        assert_eq!(producer.finish(), None);
    }

    #[tokio::test]
    async fn frames_follow_upstream_order() {
        let frames: Vec<Frame> = frame_stream(upstream(vec![
            Ok(UpstreamEvent::Text("Hel".into())),
            Ok(UpstreamEvent::Text("lo".into())),
            Ok(UpstreamEvent::End),
        ]))
        .collect()
        .await;

        assert_eq!(frames, vec![Frame::text("Hel"), Frame::text("lo"), Frame::Done]);
    }

    #[tokio::test]
    async fn nothing_follows_an_error_frame() {
        let frames: Vec<Frame> = frame_stream(upstream(vec![
            Ok(UpstreamEvent::Text("partial".into())),
            Err(GenerateError::Upstream("overloaded".into())),
            Ok(UpstreamEvent::Text("ignored".into())),
            Ok(UpstreamEvent::End),
        ]))
        .collect()
        .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], Frame::error("Upstream error: overloaded"));
    }

    #[tokio::test]
    async fn upstream_is_dropped_after_the_error_frame() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        struct Released(Arc<AtomicBool>);
        impl Drop for Released {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let guard = Released(released.clone());
        let events = stream::iter(vec![
            Ok(UpstreamEvent::Text("partial".into())),
            Err(GenerateError::Upstream("overloaded".into())),
        ])
        .chain(stream::pending())
        .map(move |event| {
            let _held = &guard;
            event
        });

        let frames = frame_stream(Box::pin(events));
        futures::pin_mut!(frames);

        assert_eq!(frames.next().await, Some(Frame::text("partial")));
        assert!(!released.load(Ordering::SeqCst));
        assert_eq!(frames.next().await, Some(Frame::error("Upstream error: overloaded")));
        // would hang on the pending tail if the upstream were still polled
        assert_eq!(frames.next().await, None);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn body_is_the_wire_encoding() {
        let chunks: Vec<Bytes> = sse_body(upstream(vec![
            Ok(UpstreamEvent::Text("Hi".into())),
            Ok(UpstreamEvent::End),
        ]))
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

        let body: Vec<u8> = chunks.concat();
        assert_eq!(body, b"data: {\"text\":\"Hi\"}\n\ndata: [DONE]\n\n".to_vec());
    }
}
