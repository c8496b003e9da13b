//! Count-based sliding window of call outcomes.

use std::collections::VecDeque;
use std::time::Instant;

/// How a completed attempt is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OutcomeKind {
    /// Completed successfully under the slow-call threshold.
    Success,
    /// Returned an error or timed out.
    Failure,
    /// Completed successfully but took at least the slow-call threshold.
    SlowSuccess,
}

impl OutcomeKind {
    /// Label used for events and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failure => "failure",
            OutcomeKind::SlowSuccess => "slow_success",
        }
    }
}

/// A single recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Classification of the attempt.
    pub kind: OutcomeKind,
    /// When the attempt completed.
    pub timestamp: Instant,
}

impl Outcome {
    /// Creates an outcome stamped with `timestamp`.
    pub fn new(kind: OutcomeKind, timestamp: Instant) -> Self {
        Self { kind, timestamp }
    }

    /// Creates an outcome stamped now.
    pub fn now(kind: OutcomeKind) -> Self {
        Self::new(kind, Instant::now())
    }
}

/// Fixed-capacity ring of the most recent outcomes.
///
/// Recording into a full window evicts the oldest entry. Failure and slow
/// counters are maintained incrementally so every operation is O(1).
/// Rates are percentages in `0.0..=100.0` and are `0.0` while the window is empty.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    entries: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
    slow: usize,
}

impl OutcomeWindow {
    /// Creates an empty window holding at most `capacity` outcomes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "outcome window capacity must be at least 1");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
            slow: 0,
        }
    }

    /// Appends `outcome`, evicting the oldest entry when full.
    pub fn record(&mut self, outcome: Outcome) {
        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                self.forget(evicted.kind);
            }
        }
        match outcome.kind {
            OutcomeKind::Failure => self.failures += 1,
            OutcomeKind::SlowSuccess => self.slow += 1,
            OutcomeKind::Success => {}
        }
        self.entries.push_back(outcome);
    }

    fn forget(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Failure => self.failures -= 1,
            OutcomeKind::SlowSuccess => self.slow -= 1,
            OutcomeKind::Success => {}
        }
    }

    /// Percentage of resident outcomes that are failures.
    pub fn failure_rate(&self) -> f64 {
        self.percent(self.failures)
    }

    /// Percentage of resident outcomes that are slow successes.
    pub fn slow_rate(&self) -> f64 {
        self.percent(self.slow)
    }

    fn percent(&self, count: usize) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            count as f64 * 100.0 / self.entries.len() as f64
        }
    }

    /// Number of resident outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true once `len() == capacity()`.
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Maximum number of resident outcomes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident failures.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Resident slow successes.
    pub fn slow_count(&self) -> usize {
        self.slow
    }

    /// Resident successes, slow ones included.
    pub fn success_count(&self) -> usize {
        self.entries.len() - self.failures
    }

    /// Drops every resident outcome.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures = 0;
        self.slow = 0;
    }

    /// Iterates resident outcomes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.entries.iter()
    }
}
