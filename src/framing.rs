//! Wire framing shared by the producer and the consumer
//!
//! ```text
//! data: {"text":"<delta>"}\n\n
//! data: {"error":"<message>"}\n\n
//! data: [DONE]\n\n
//! ```
//!
//! Frames are delimited by exactly two newlines. JSON encoding escapes any
//! newline inside a payload, so the delimiter never occurs within a frame.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::types::Frame;

/// Prefix of every frame, including the trailing space.
pub const DATA_PREFIX: &str = "data: ";
/// Payload of the terminal frame.
pub const DONE_SENTINEL: &str = "[DONE]";
/// Separator between frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// JSON object carried by text and error frames.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FramePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Frame {
    /// The part of the frame after `data: `.
    pub fn payload(&self) -> String {
        match self {
            Frame::Text { text } => serde_json::json!({ "text": text }).to_string(),
            Frame::Error { message } => serde_json::json!({ "error": message }).to_string(),
            Frame::Done => DONE_SENTINEL.to_string(),
        }
    }

    /// Full wire encoding, delimiter included.
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!("{DATA_PREFIX}{}{FRAME_DELIMITER}", self.payload()))
    }
}

/// Append `chunk` to `buffer` and cut out every complete frame.
///
/// Returns the complete frame segments (without delimiters) and the new
/// buffer, which holds the start of a frame whose delimiter has not arrived
/// yet. The new buffer is empty when `chunk` ends exactly on a delimiter.
pub fn split_frames(buffer: &str, chunk: &str) -> (Vec<String>, String) {
    let mut joined = String::with_capacity(buffer.len() + chunk.len());
    joined.push_str(buffer);
    joined.push_str(chunk);

    let mut segments: Vec<String> = joined.split(FRAME_DELIMITER).map(str::to_owned).collect();
    // split always yields at least one element
    let rest = segments.pop().unwrap_or_default();
    (segments, rest)
}

/// Decode one complete frame segment.
///
/// - `Ok(Some(frame))` for text, error and done frames
/// - `Ok(None)` for blank segments and JSON objects with neither field
///   (an empty `text` counts as absent)
/// - `Err(MalformedFrame)` when the payload is not valid JSON
pub fn parse_frame(segment: &str) -> Result<Option<Frame>, GenerateError> {
    let data = segment.strip_prefix(DATA_PREFIX).unwrap_or(segment);

    if data == DONE_SENTINEL {
        return Ok(Some(Frame::Done));
    }
    if data.trim().is_empty() {
        return Ok(None);
    }

    let payload: FramePayload = serde_json::from_str(data)
        .map_err(|e| GenerateError::MalformedFrame(format!("{e}: {data}")))?;

    Ok(match payload {
        FramePayload {
            error: Some(message),
            ..
        } => Some(Frame::Error { message }),
        FramePayload {
            text: Some(text), ..
        } if !text.is_empty() => Some(Frame::Text { text }),
        _ => None,
    })
}
