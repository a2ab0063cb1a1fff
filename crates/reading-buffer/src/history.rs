//! Sliding Window Implementation

use health_classifier::Reading;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Default window capacity (the model's sequence length)
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity reading window, oldest dropped first
#[derive(Debug, Clone, Serialize)]
pub struct ReadingHistory {
    /// Readings, oldest first
    readings: VecDeque<Reading>,
    /// Capacity of the window
    capacity: usize,
}

impl ReadingHistory {
    /// Create a window holding at most `capacity` readings
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a reading, evicting the oldest when full
    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Number of readings currently held
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Window capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.readings.len() as f64 / self.capacity as f64
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// Chronological window of exactly `length` readings.
    ///
    /// When fewer readings are held, the front is padded with copies of the
    /// latest reading. Returns `None` when the window is empty.
    pub fn padded_window(&self, length: usize) -> Option<Vec<Reading>> {
        let latest = *self.latest()?;
        let available = self.readings.len().min(length);
        let padding = length - available;
        if padding > 0 {
            debug!("Padding history window with {} copies of latest reading", padding);
        }

        let mut window = Vec::with_capacity(length);
        window.extend(std::iter::repeat(latest).take(padding));
        window.extend(self.readings.iter().skip(self.readings.len() - available).copied());
        Some(window)
    }

    /// Clear the window
    pub fn clear(&mut self) {
        self.readings.clear();
    }
}
