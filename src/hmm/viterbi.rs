//! Viterbi pass (spec §4.4.4): same recurrence as forward with sum
//! replaced by max, storing the argmax predecessor into a parallel
//! backtrace column. Tie-break is last-cell-wins (spec §9 open question).

use bio::stats::LogProb;

use super::checkpoint::{self, CheckpointStore};
use super::{normalize_column, HmmEngine};
use crate::errors::Result;

pub(crate) type ViterbiCheckpoints = CheckpointStore<(Vec<LogProb>, Vec<usize>)>;

impl<'a> HmmEngine<'a> {
    /// One Viterbi column plus its backtrace. `prev` is `V[t-1]`.
    fn viterbi_step(&self, t: usize, prev: Option<&[LogProb]>) -> Result<(Vec<LogProb>, Vec<usize>)> {
        let indexer = &self.indexers[t];
        let emission = self.emission_at(t);
        let size = indexer.size();
        let mut col = vec![LogProb::ln_zero(); size];
        let mut backtrace = vec![0usize; size];

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

                    let mut best_val = LogProb::ln_zero();
                    let mut best_cp = 0usize;
                    for cp in 0..prev_indexer.size() {
                        let (ppi, ppj) = prev_indexer.get_paths(cp)?;
                        let step = transition.transition(ppi, ppj, pi, pj);
                        let val = prev_col[cp] + step;
                        // last-cell-wins: `>=` so a tie moves the argmax forward.
                        if val.0 >= best_val.0 {
                            best_val = val;
                            best_cp = cp;
                        }
                    }
                    col[c] = emission.emission(ai, aj) + best_val;
                    backtrace[c] = best_cp;
                }
            }
        }

        normalize_column(&mut col, t)?;
        Ok((col, backtrace))
    }

    pub(crate) fn viterbi_checkpoints(&self) -> Result<ViterbiCheckpoints> {
        let mut store = CheckpointStore::new();
        let mut prev: Option<Vec<LogProb>> = None;
        for t in 0..self.len() {
            let (col, backtrace) = self.viterbi_step(t, prev.as_deref())?;
            if checkpoint::is_checkpoint(t, self.checkpoint_stride) {
                store.insert(t, (col.clone(), backtrace));
            }
            prev = Some(col);
        }
        Ok(store)
    }

    /// Reconstructs `(V[t], backtrace[t])` from the nearest checkpoint at
    /// or before `t` (spec §4.4.4: "If the required backtrace column was
    /// discarded, recompute Viterbi columns from the nearest stored
    /// checkpoint").
    fn viterbi_column_at(
        &self,
        t: usize,
        checkpoints: &ViterbiCheckpoints,
    ) -> Result<(Vec<LogProb>, Vec<usize>)> {
        if let Some((col, backtrace)) = checkpoints.get(t) {
            return Ok((col.clone(), backtrace.clone()));
        }
        let (start, (start_col, _)) = checkpoints
            .nearest_at_or_before(t)
            .expect("checkpoint 0 is always retained by viterbi_checkpoints");
        let mut col = start_col.clone();
        let mut backtrace = Vec::new();
        for s in (start + 1)..=t {
            let (c, b) = self.viterbi_step(s, Some(&col))?;
            col = c;
            backtrace = b;
        }
        Ok((col, backtrace))
    }

    pub(crate) fn viterbi(&self, results: &mut [crate::genotyping_result::GenotypingResult]) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Ok(());
        }

        let checkpoints = self.viterbi_checkpoints()?;
        let (last_col, _) = self.viterbi_column_at(n - 1, &checkpoints)?;

        let mut best_val = LogProb::ln_zero();
        let mut best_cell = 0usize;
        for (cell, value) in last_col.iter().enumerate() {
            if value.0 >= best_val.0 {
                best_val = *value;
                best_cell = cell;
            }
        }

        let mut cur_cell = best_cell;
        for t in (0..n).rev() {
            let indexer = &self.indexers[t];
            let (ai, aj) = indexer.get_alleles(cur_cell)?;
            results[t].add_first_haplotype_allele(ai);
            results[t].add_second_haplotype_allele(aj);

            if t > 0 {
                let (_, backtrace) = self.viterbi_column_at(t, &checkpoints)?;
                cur_cell = backtrace[cur_cell];
            }
        }
        Ok(())
    }
}
