//! Stream Frame Codec
//!
//! Decodes inbound WebSocket text frames from the live feed. The feed
//! speaks a minimal JSON protocol: a frame is either an array of sample
//! objects (the backlog sent right after connect) or a single sample
//! object (one incremental tick). The leading character distinguishes
//! the two shapes without a speculative parse.

use serde::Serialize;

use crate::domain::timeseries::Sample;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame was neither a JSON array nor a JSON object.
    #[error("invalid frame format: {0}")]
    InvalidFormat(String),
}

/// A decoded feed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Bulk backlog of samples. Replaces the consumer's buffer wholesale.
    Snapshot(Vec<Sample>),
    /// One sample to append.
    Sample(Sample),
}

/// JSON codec for live feed frames.
#[derive(Debug, Default, Clone)]
pub struct FrameCodec;

impl FrameCodec {
    /// Create a new frame codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into a [`StreamFrame`].
    ///
    /// An array frame decodes as a snapshot, an object frame as a single
    /// sample. Anything else is rejected so the session can drop it and
    /// move on.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON parsing fails or the frame is neither an
    /// array nor an object.
    pub fn decode(&self, text: &str) -> Result<StreamFrame, CodecError> {
        let trimmed = text.trim();

        if trimmed.starts_with('[') {
            let samples: Vec<Sample> = serde_json::from_str(trimmed)?;
            Ok(StreamFrame::Snapshot(samples))
        } else if trimmed.starts_with('{') {
            let sample: Sample = serde_json::from_str(trimmed)?;
            Ok(StreamFrame::Sample(sample))
        } else {
            Err(CodecError::InvalidFormat(format!(
                "expected JSON array or object, got: {}...",
                trimmed.chars().take(50).collect::<String>()
            )))
        }
    }

    /// Encode a value to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_array_frame_as_snapshot() {
        let codec = FrameCodec::new();
        let json = r#"[
            {"timestamp":"2024-01-15T10:00:00Z","value":42.5},
            {"timestamp":"2024-01-15T10:00:01Z","value":43.0}
        ]"#;

        let frame = codec.decode(json).unwrap();
        match frame {
            StreamFrame::Snapshot(samples) => {
                assert_eq!(samples.len(), 2);
                assert_eq!(samples[0].value, 42.5);
                assert_eq!(samples[1].timestamp, "2024-01-15T10:00:01Z");
            }
            StreamFrame::Sample(_) => panic!("expected Snapshot frame"),
        }
    }

    #[test]
    fn decode_object_frame_as_sample() {
        let codec = FrameCodec::new();
        let json = r#"{"timestamp":"2024-01-15T10:00:02Z","value":44.25}"#;

        let frame = codec.decode(json).unwrap();
        match frame {
            StreamFrame::Sample(sample) => {
                assert_eq!(sample.timestamp, "2024-01-15T10:00:02Z");
                assert_eq!(sample.value, 44.25);
            }
            StreamFrame::Snapshot(_) => panic!("expected Sample frame"),
        }
    }

    #[test]
    fn decode_empty_array_is_an_empty_snapshot() {
        let codec = FrameCodec::new();

        let frame = codec.decode("[]").unwrap();
        assert_eq!(frame, StreamFrame::Snapshot(vec![]));
    }

    #[test]
    fn decode_rejects_non_json_frames() {
        let codec = FrameCodec::new();

        let err = codec.decode("ping").unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
    }

    #[test]
    fn decode_clips_the_error_excerpt_at_a_char_boundary() {
        let codec = FrameCodec::new();
        // 49 ASCII bytes, then a two-byte char straddling the excerpt cut.
        let garbage = format!("{}é", "a".repeat(49));

        let err = codec.decode(&garbage).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
        assert!(err.to_string().contains('é'));
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let codec = FrameCodec::new();

        // Valid JSON, wrong fields.
        let err = codec.decode(r#"{"symbol":"AAPL","price":1.0}"#).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let codec = FrameCodec::new();
        let json = "  \n  {\"timestamp\":\"2024-01-15T10:00:03Z\",\"value\":1.5}  ";

        let frame = codec.decode(json).unwrap();
        assert!(matches!(frame, StreamFrame::Sample(_)));
    }

    #[test]
    fn encode_produces_wire_shape() {
        let codec = FrameCodec::new();
        let sample = Sample::new("2024-01-15T10:00:04Z", 7.25);

        let json = codec.encode(&sample).unwrap();
        assert!(json.contains(r#""timestamp":"2024-01-15T10:00:04Z""#));
        assert!(json.contains(r#""value":7.25"#));
    }
}
