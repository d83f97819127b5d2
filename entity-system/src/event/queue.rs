// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Pending-event queue
//!
//! Events are appended to a single buffer and consumed through a cursor.
//! The buffer is only reset once a drain has consumed everything, so events
//! pushed while draining land behind the cursor's current position and are
//! picked up by the same drain. The backing allocation is kept across
//! cycles to avoid churn.

use tracing::debug;

use crate::error::{Error, Result};

/// Configuration for event queue behavior
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Number of events the queue can hold before its first reallocation
    pub initial_capacity: usize,
    /// Fraction of consumed slots that triggers compaction after a partial
    /// drain, in `(0, 1]`
    pub compaction_ratio: f64,
    /// Whether to log when the queue buffer grows
    pub log_growth: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            initial_capacity: 64,
            compaction_ratio: 0.5,
            log_growth: false,
        }
    }
}

impl QueueConfig {
    /// Create a queue configuration with a custom initial capacity
    pub fn new(initial_capacity: usize) -> Self {
        QueueConfig {
            initial_capacity,
            ..Self::default()
        }
    }

    /// Enable logging for buffer growth
    pub fn with_logging(mut self) -> Self {
        self.log_growth = true;
        self
    }

    /// Set the consumed fraction that triggers compaction
    pub fn with_compaction_ratio(mut self, ratio: f64) -> Self {
        self.compaction_ratio = ratio;
        self
    }

    /// Check that every value is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.compaction_ratio > 0.0 && self.compaction_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "compaction ratio must be in (0, 1], got {}",
                self.compaction_ratio
            )));
        }
        Ok(())
    }
}

/// Counters describing queue activity since creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Events pushed
    pub pushed: usize,
    /// Events handed to listeners
    pub dispatched: usize,
    /// Largest number of events pending at once
    pub peak_pending: usize,
    /// Times the buffer had to reallocate
    pub growths: usize,
    /// Times a fully drained queue was reset to empty
    pub resets: usize,
    /// Events dropped by `clear` before delivery
    pub cleared: usize,
}

impl QueueStats {
    /// Events pushed but not yet dispatched or cleared
    pub fn in_flight(&self) -> usize {
        self.pushed.saturating_sub(self.dispatched + self.cleared)
    }
}

/// FIFO of pending events with a drain cursor
pub struct EventQueue<S> {
    slots: Vec<Option<S>>,
    cursor: usize,
    draining: bool,
    config: QueueConfig,
    stats: QueueStats,
}

impl<S> EventQueue<S> {
    /// Create an empty queue with default configuration
    pub fn new() -> Self {
        Self::build(QueueConfig::default())
    }

    /// Create an empty queue with a validated configuration
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: QueueConfig) -> Self {
        EventQueue {
            slots: Vec::with_capacity(config.initial_capacity),
            cursor: 0,
            draining: false,
            config,
            stats: QueueStats::default(),
        }
    }

    /// Append an event
    pub fn push(&mut self, event: S) {
        if self.slots.len() == self.slots.capacity() {
            self.stats.growths += 1;
            if self.config.log_growth {
                debug!(
                    capacity = self.slots.capacity(),
                    pending = self.pending(),
                    "event queue buffer growing"
                );
            }
        }
        self.slots.push(Some(event));
        self.stats.pushed += 1;
        self.stats.peak_pending = self.stats.peak_pending.max(self.pending());
    }

    /// Take the event at the cursor and advance
    pub fn pop(&mut self) -> Option<S> {
        while self.cursor < self.slots.len() {
            let event = self.slots[self.cursor].take();
            self.cursor += 1;
            if event.is_some() {
                self.stats.dispatched += 1;
                return event;
            }
        }
        None
    }

    /// Number of events not yet consumed
    pub fn pending(&self) -> usize {
        self.slots.len() - self.cursor
    }

    /// Check if no event is pending
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Mark the queue as draining
    ///
    /// Returns `false` if a drain is already in progress.
    pub fn begin_drain(&mut self) -> bool {
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    /// Finish a drain
    ///
    /// A fully consumed queue is reset to empty without freeing its buffer.
    /// After a partial drain the consumed prefix is discarded once it
    /// exceeds the configured compaction ratio.
    pub fn end_drain(&mut self) {
        self.draining = false;

        if self.cursor == self.slots.len() {
            if !self.slots.is_empty() {
                self.stats.resets += 1;
            }
            self.slots.clear();
            self.cursor = 0;
        } else if self.cursor as f64 >= self.slots.len() as f64 * self.config.compaction_ratio {
            self.slots.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    /// Check if a drain is in progress
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.stats.cleared += self.slots[self.cursor..].iter().flatten().count();
        self.slots.clear();
        self.cursor = 0;
    }

    /// Current configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Activity counters
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl<S> Default for EventQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.compaction_ratio, 0.5);
        assert!(!config.log_growth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_config_custom() {
        let config = QueueConfig::new(8).with_logging().with_compaction_ratio(1.0);
        assert_eq!(config.initial_capacity, 8);
        assert!(config.log_growth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_config_rejects_bad_ratio() {
        for ratio in [0.0, -1.0, 1.5, f64::NAN] {
            let config = QueueConfig::default().with_compaction_ratio(ratio);
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
            assert!(EventQueue::<u32>::with_config(config).is_err());
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = EventQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pending(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_during_drain_is_seen() {
        let mut queue = EventQueue::new();
        queue.push(1);

        assert!(queue.begin_drain());
        assert!(!queue.begin_drain());
        assert_eq!(queue.pop(), Some(1));
        queue.push(2);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        queue.end_drain();

        assert!(!queue.is_draining());
        assert_eq!(queue.stats().resets, 1);
    }

    #[test]
    fn test_reset_keeps_buffer() {
        let mut queue = EventQueue::with_config(QueueConfig::new(4)).unwrap();
        for i in 0..4 {
            queue.push(i);
        }
        let growths = queue.stats().growths;

        queue.begin_drain();
        while queue.pop().is_some() {}
        queue.end_drain();

        // Refilling to the same depth must not reallocate
        for i in 0..4 {
            queue.push(i);
        }
        assert_eq!(queue.stats().growths, growths);
    }

    #[test]
    fn test_partial_drain_compacts() {
        let mut queue = EventQueue::with_config(QueueConfig::new(8)).unwrap();
        for i in 0..4 {
            queue.push(i);
        }

        queue.begin_drain();
        assert_eq!(queue.pop(), Some(0));
        queue.end_drain();
        // One of four consumed: below the ratio, nothing moves
        assert_eq!(queue.pending(), 3);

        queue.begin_drain();
        assert_eq!(queue.pop(), Some(1));
        queue.end_drain();
        assert_eq!(queue.pending(), 2);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
    }

    #[test]
    fn test_stats_tracking() {
        let mut queue = EventQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        queue.pop();
        queue.pop();

        let stats = queue.stats();
        assert_eq!(stats.pushed, 5);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.peak_pending, 5);
        assert_eq!(stats.in_flight(), 3);

        queue.clear();
        assert_eq!(queue.stats().cleared, 3);
        assert_eq!(queue.stats().in_flight(), 0);
    }
}
