//! Sqrt-checkpointing (spec §4.4.2, §5, §9): retain one column every
//! `floor(sqrt(N))` positions, recompute the rest on demand. Shared by
//! the forward and Viterbi passes, which both retain dense `Vec<T>`
//! columns under the same retention rule.

use std::collections::BTreeMap;

/// `k = floor(sqrt(n))`, clamped to at least 1 so the stride never
/// divides by zero for small chromosomes.
pub fn stride(n: usize) -> usize {
    (n as f64).sqrt().floor().max(1.0) as usize
}

pub fn is_checkpoint(t: usize, stride: usize) -> bool {
    t % stride == 0
}

/// Sparse store of columns, keyed by site index, holding only the
/// checkpointed ones plus whatever the caller currently has in flight.
#[derive(Debug, Default)]
pub struct CheckpointStore<T> {
    columns: BTreeMap<usize, T>,
}

impl<T: Clone> CheckpointStore<T> {
    pub fn new() -> Self {
        CheckpointStore {
            columns: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, t: usize, column: T) {
        self.columns.insert(t, column);
    }

    pub fn get(&self, t: usize) -> Option<&T> {
        self.columns.get(&t)
    }

    /// Nearest stored checkpoint at or before `t`. Checkpoint 0 is always
    /// retained, so this is infallible once the store has been built by
    /// a full forward/Viterbi pass.
    pub fn nearest_at_or_before(&self, t: usize) -> Option<(usize, &T)> {
        self.columns.range(..=t).next_back().map(|(k, v)| (*k, v))
    }
}
