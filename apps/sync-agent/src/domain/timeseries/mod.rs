//! Live Metric Time Series
//!
//! Canonical types for the dashboard's live metric feeds: a single
//! timestamped sample, the fixed-capacity sliding window holding the
//! most recent samples, and the event stream a feed transport emits.
//! These types are transport-agnostic; the WebSocket client decodes
//! into them and consumers apply them to a buffer.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// Number of samples a series window retains.
pub const WINDOW_SIZE: usize = 50;

/// One timestamped measurement from a metric feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// ISO-8601 timestamp assigned by the producer.
    pub timestamp: String,
    /// Measured value.
    pub value: f64,
}

impl Sample {
    /// Create a sample with an explicit timestamp.
    #[must_use]
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Create a sample stamped with the current UTC time.
    #[must_use]
    pub fn now(value: f64) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            value,
        }
    }
}

/// Events emitted by a feed transport.
///
/// Consumers receive these over a channel and apply them to a
/// [`SeriesBuffer`]; the transport never writes to the buffer directly.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Push-channel session opened.
    Connected,
    /// Session closed (remote close or read failure).
    Disconnected,
    /// Reconnection attempt scheduled after backoff.
    Reconnecting {
        /// Attempt number (1-based).
        attempt: u32,
    },
    /// Bulk frame: replaces the consuming buffer wholesale.
    Snapshot(Vec<Sample>),
    /// Incremental frame: one sample to append.
    Sample(Sample),
    /// Transport-level error. The session itself is closed elsewhere;
    /// this is informational.
    Error(String),
}

// =============================================================================
// Series Buffer
// =============================================================================

/// Fixed-capacity sliding window of samples.
///
/// Insertion order is chronological order. Appending beyond capacity
/// evicts the oldest sample; a bulk [`initialize`](Self::initialize)
/// replaces contents wholesale with no merge.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SeriesBuffer {
    /// Create an empty buffer with the default window size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_SIZE)
    }

    /// Create an empty buffer with an explicit window capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace contents wholesale, keeping only the most recent
    /// `capacity` samples when the input is larger than the window.
    pub fn initialize(&mut self, samples: Vec<Sample>) {
        let skip = samples.len().saturating_sub(self.capacity);
        self.samples = samples.into_iter().skip(skip).collect();
    }

    /// Append one sample at the tail, evicting from the head on overflow.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Iterate samples oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Copy the window out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample(i: usize) -> Sample {
        Sample::new(format!("2024-01-01T00:00:{i:02}Z"), i as f64)
    }

    #[test]
    fn append_within_capacity_keeps_all() {
        let mut buffer = SeriesBuffer::new();
        for i in 0..10 {
            buffer.append(sample(i));
        }
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.latest().map(|s| s.value), Some(9.0));
    }

    #[test]
    fn append_beyond_capacity_evicts_oldest() {
        let mut buffer = SeriesBuffer::new();
        for i in 0..120 {
            buffer.append(sample(i));
        }
        assert_eq!(buffer.len(), WINDOW_SIZE);

        let values: Vec<f64> = buffer.iter().map(|s| s.value).collect();
        let expected: Vec<f64> = (70..120).map(|i| i as f64).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut buffer = SeriesBuffer::with_capacity(3);
        buffer.append(sample(1));
        buffer.append(sample(2));
        buffer.append(sample(3));
        buffer.append(sample(4));

        let values: Vec<f64> = buffer.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn initialize_truncates_to_most_recent_window() {
        let mut buffer = SeriesBuffer::new();
        buffer.initialize((0..80).map(sample).collect());

        assert_eq!(buffer.len(), WINDOW_SIZE);
        assert_eq!(buffer.iter().next().map(|s| s.value), Some(30.0));
        assert_eq!(buffer.latest().map(|s| s.value), Some(79.0));
    }

    #[test]
    fn initialize_replaces_prior_contents() {
        let mut buffer = SeriesBuffer::new();
        for i in 0..40 {
            buffer.append(sample(i));
        }

        buffer.initialize(vec![sample(100), sample(101)]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.iter().next().map(|s| s.value), Some(100.0));
    }

    #[test]
    fn initialize_with_empty_clears() {
        let mut buffer = SeriesBuffer::new();
        buffer.append(sample(1));
        buffer.initialize(Vec::new());
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn sample_serde_shape() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00Z","value":42.5}"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.value, 42.5);
        assert_eq!(serde_json::to_string(&sample).unwrap(), json);
    }

    proptest! {
        // Window law: after any append sequence the buffer holds exactly
        // the most recent min(capacity, total) samples in arrival order.
        #[test]
        fn window_holds_most_recent_samples(values in prop::collection::vec(-1e6f64..1e6, 0..200)) {
            let mut buffer = SeriesBuffer::new();
            for (i, value) in values.iter().enumerate() {
                buffer.append(Sample::new(format!("t{i}"), *value));
            }

            prop_assert!(buffer.len() <= WINDOW_SIZE);
            prop_assert_eq!(buffer.len(), values.len().min(WINDOW_SIZE));

            let held: Vec<f64> = buffer.iter().map(|s| s.value).collect();
            let skip = values.len().saturating_sub(WINDOW_SIZE);
            prop_assert_eq!(held, values[skip..].to_vec());
        }
    }
}
