//! Backward pass and posterior accumulation (spec §4.4.3). Only one
//! backward column is ever retained (`B[t+1]` while computing `B[t]`);
//! the matching forward column is reconstructed from the nearest
//! checkpoint on demand.

use bio::stats::LogProb;

use super::normalize_column;
use crate::errors::{Error, Result};
use crate::genotyping_result::GenotypingResult;
use crate::hmm::HmmEngine;

impl<'a> HmmEngine<'a> {
    pub(crate) fn forward_backward(&self, results: &mut [GenotypingResult]) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Ok(());
        }

        let forward_checkpoints = self.forward_checkpoints()?;
        let mut next_backward: Option<Vec<LogProb>> = None;

        for t in (0..n).rev() {
            let indexer = &self.indexers[t];
            let size = indexer.size();
            let mut col = vec![LogProb::ln_zero(); size];

            if t == n - 1 {
                for v in col.iter_mut() {
                    *v = LogProb::ln_one();
                }
            } else {
                let next_indexer = &self.indexers[t + 1];
                let emission_next = self.emission_at(t + 1);
                let transition = &self.transitions[t];
                let b_next = next_backward
                    .as_ref()
                    .expect("backward column for t+1 was computed in the previous iteration");

                for c in 0..size {
                    let (pi, pj) = indexer.get_paths(c)?;
                    let mut terms = Vec::with_capacity(next_indexer.size());
                    for cn in 0..next_indexer.size() {
                        let (ni, nj) = next_indexer.get_paths(cn)?;
                        let (nai, naj) = next_indexer.get_alleles(cn)?;
                        let step = transition.transition(pi, pj, ni, nj);
                        terms.push(step + emission_next.emission(nai, naj) + b_next[cn]);
                    }
                    col[c] = LogProb::ln_sum_exp(&terms);
                }
            }
            normalize_column(&mut col, t)?;

            let forward_col = self.forward_column_at(t, &forward_checkpoints)?;
            let result = &mut results[t];
            for c in 0..size {
                let (ai, aj) = indexer.get_alleles(c)?;
                let posterior = (forward_col[c] + col[c]).exp();
                result.add_to_likelihood(ai, aj, posterior);
            }
            let sum = result.likelihood_sum();
            if !sum.is_finite() || sum <= 0.0 {
                return Err(Error::NormalisationCollapse { column: t });
            }
            result.divide_likelihoods_by(sum);

            next_backward = Some(col);
        }
        Ok(())
    }
}
