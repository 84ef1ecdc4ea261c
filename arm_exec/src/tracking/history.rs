//! Bounded history of recent target locations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::collections::{vec_deque, VecDeque};

use super::{Location, DEFAULT_HISTORY_CAPACITY};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single located sample of the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSample {
    /// Monotonic time at which the frames were captured.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    pub location: Location,
}

/// Recent samples of the target, most recent first.
///
/// Once the history is full the oldest sample is dropped on each push.
#[derive(Debug, Clone)]
pub struct TrackHistory {
    samples: VecDeque<TrackSample>,
    capacity: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackSample {
    pub fn new(timestamp_s: f64, location: Location) -> Self {
        Self {
            timestamp_s,
            location,
        }
    }
}

impl TrackHistory {
    /// Create an empty history holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a history from samples given most recent first.
    ///
    /// Samples beyond the capacity are discarded.
    pub fn from_samples<I>(capacity: usize, samples: I) -> Self
    where
        I: IntoIterator<Item = TrackSample>,
    {
        let mut history = Self::new(capacity);
        history
            .samples
            .extend(samples.into_iter().take(history.capacity));
        history
    }

    /// Insert a new sample at the front, evicting the oldest if the history is full.
    pub fn push(&mut self, timestamp_s: f64, location: Location) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_back();
        }

        self.samples
            .push_front(TrackSample::new(timestamp_s, location));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&TrackSample> {
        self.samples.front()
    }

    /// Iterate over the samples, most recent first.
    pub fn iter(&self) -> vec_deque::Iter<'_, TrackSample> {
        self.samples.iter()
    }
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a TrackHistory {
    type Item = &'a TrackSample;
    type IntoIter = vec_deque::Iter<'a, TrackSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
