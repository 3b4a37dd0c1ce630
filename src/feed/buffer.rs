//! Bounded per-symbol bar history

use super::types::Bar;
use std::collections::VecDeque;

/// Fixed-capacity history of bars for one symbol
///
/// Appending when full evicts the oldest bar. Bars arrive in open-time order
/// from the stream; the buffer preserves insertion order.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    bars: VecDeque<Bar>,
}

impl HistoryBuffer {
    /// Create a buffer retaining at most `capacity` bars
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bars: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a bar, evicting the oldest when full
    pub fn push(&mut self, bar: Bar) {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    /// Newest bar, if any
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Last `n` bars, oldest first (fewer if unavailable)
    pub fn window(&self, n: usize) -> Vec<Bar> {
        let skip = self.bars.len().saturating_sub(n);
        self.bars.iter().skip(skip).copied().collect()
    }

    /// Number of bars currently held
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
