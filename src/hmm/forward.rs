//! Forward pass (spec §4.4.2): `F[t][c] = emission(c) * sum_c' F[t-1][c'] *
//! transition(c', c)`, normalised after every column, with sqrt-checkpoint
//! retention so only `O(sqrt(N))` columns are held at once.

use bio::stats::LogProb;

use super::checkpoint::{self, CheckpointStore};
use super::{normalize_column, HmmEngine};
use crate::errors::Result;

pub(crate) type ForwardCheckpoints = CheckpointStore<Vec<LogProb>>;

impl<'a> HmmEngine<'a> {
    /// One forward column. `prev` is `F[t-1]`, or `None` at `t == 0`.
    pub(crate) fn forward_step(&self, t: usize, prev: Option<&[LogProb]>) -> Result<Vec<LogProb>> {
        let indexer = &self.indexers[t];
        let emission = self.emission_at(t);
        let size = indexer.size();
        let mut col = vec![LogProb::ln_zero(); size];

        match prev {
            None => {
                for c in 0..size {
                    let (ai, aj) = indexer.get_alleles(c)?;
                    col[c] = emission.emission(ai, aj);
                }
            }
            Some(prev_col) => {
                let prev_indexer = &self.indexers[t - 1];
                let transition = &self.transitions[t - 1];
                for c in 0..size {
                    let (ai, aj) = indexer.get_alleles(c)?;
                    let (pi, pj) = indexer.get_paths(c)?;
                    let mut terms = Vec::with_capacity(prev_indexer.size());
                    for cp in 0..prev_indexer.size() {
                        let (ppi, ppj) = prev_indexer.get_paths(cp)?;
                        let step = transition.transition(ppi, ppj, pi, pj);
                        terms.push(prev_col[cp] + step);
                    }
                    col[c] = emission.emission(ai, aj) + LogProb::ln_sum_exp(&terms);
                }
            }
        }

        normalize_column(&mut col, t)?;
        Ok(col)
    }

    /// Runs the full forward pass, retaining only the sqrt-checkpointed
    /// columns (spec §4.4.2, §5).
    pub(crate) fn forward_checkpoints(&self) -> Result<ForwardCheckpoints> {
        let mut store = CheckpointStore::new();
        let mut prev: Option<Vec<LogProb>> = None;
        for t in 0..self.len() {
            let col = self.forward_step(t, prev.as_deref())?;
            if checkpoint::is_checkpoint(t, self.checkpoint_stride) {
                store.insert(t, col.clone());
            }
            prev = Some(col);
        }
        Ok(store)
    }

    /// Reconstructs `F[t]` from the nearest stored checkpoint at or
    /// before `t` (spec §4.4.3: "If discarded, reconstruct it by
    /// recomputing forward from the nearest stored checkpoint ≤ t").
    pub(crate) fn forward_column_at(
        &self,
        t: usize,
        checkpoints: &ForwardCheckpoints,
    ) -> Result<Vec<LogProb>> {
        if let Some(col) = checkpoints.get(t) {
            return Ok(col.clone());
        }
        let (start, start_col) = checkpoints
            .nearest_at_or_before(t)
            .expect("checkpoint 0 is always retained by forward_checkpoints");
        let mut col = start_col.clone();
        for s in (start + 1)..=t {
            col = self.forward_step(s, Some(&col))?;
        }
        Ok(col)
    }
}
