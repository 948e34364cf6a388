//! The pair-HMM engine (spec §4.4): forward–backward for genotype
//! posteriors, Viterbi for the most likely phased haplotype-pair
//! trajectory, both over the squared path-pair state space, with
//! sqrt-checkpointing to keep memory sub-linear in the number of sites.

mod backward;
mod checkpoint;
mod forward;
mod viterbi;

#[cfg(test)]
mod tests;

use bio::stats::LogProb;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::column_indexer::ColumnIndexer;
use crate::emission::EmissionProbabilityComputer;
use crate::errors::{Error, Result};
use crate::genotyping_result::GenotypingResult;
use crate::transition::TransitionProbabilityComputer;
use crate::variant::UniqueKmers;

/// Tunables for one `HmmEngine` run. Built the way the teacher crate
/// builds its model configuration in `model/modes/generic.rs`'s
/// `GenericModelBuilder`: a small `Default`-able struct with consuming
/// setter methods, rather than a full `derive_builder` macro (reserved
/// here for the heavier `demo` fixtures, see `src/demo/mod.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmmEngineConfig {
    /// Recombination rate in cM/Mb (spec §4.2).
    pub recombination_rate: f64,
    /// Run forward–backward and populate `GenotypingResult::likelihoods`.
    pub do_genotyping: bool,
    /// Run Viterbi and populate `GenotypingResult::haplotype_{1,2}`.
    pub do_phasing: bool,
    /// Background Poisson mean fraction for zero-expected-copy k-mers
    /// (spec §4.3, §9 open question).
    pub background_fraction: f64,
}

impl Default for HmmEngineConfig {
    fn default() -> Self {
        HmmEngineConfig {
            recombination_rate: 1.26,
            do_genotyping: true,
            do_phasing: true,
            background_fraction: EmissionProbabilityComputer::DEFAULT_BACKGROUND_FRACTION,
        }
    }
}

impl HmmEngineConfig {
    pub fn recombination_rate(mut self, rate: f64) -> Self {
        self.recombination_rate = rate;
        self
    }

    pub fn do_genotyping(mut self, flag: bool) -> Self {
        self.do_genotyping = flag;
        self
    }

    pub fn do_phasing(mut self, flag: bool) -> Self {
        self.do_phasing = flag;
        self
    }

    pub fn background_fraction(mut self, fraction: f64) -> Self {
        self.background_fraction = fraction;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.do_genotyping && !self.do_phasing {
            return Err(Error::InvalidArgument {
                name: "do_genotyping/do_phasing",
                reason: "at least one of genotyping or phasing must be requested".to_string(),
            });
        }
        Ok(())
    }
}

/// Runs the forward–backward and Viterbi passes for one chromosome's
/// sequence of sites. Construction builds the `N` `ColumnIndexer`s and
/// `N-1` `TransitionProbabilityComputer`s once up front (spec §4.4.1);
/// per-column `EmissionProbabilityComputer`s are built lazily since they
/// are cheap and only ever needed one at a time.
pub struct HmmEngine<'a> {
    sites: &'a [UniqueKmers],
    indexers: Vec<ColumnIndexer>,
    transitions: Vec<TransitionProbabilityComputer>,
    config: HmmEngineConfig,
    checkpoint_stride: usize,
}

impl<'a> HmmEngine<'a> {
    /// Builds the engine for one chromosome's site sequence. Fails fast
    /// if any site has zero covering paths or positions are not
    /// strictly increasing (spec §4.4.1, §4.5).
    pub fn new(sites: &'a [UniqueKmers], config: HmmEngineConfig) -> Result<Self> {
        config.validate()?;

        for (column, site) in sites.iter().enumerate() {
            site.validate(column)?;
        }
        for column in 1..sites.len() {
            let prev_pos = sites[column - 1].variant_position;
            let cur_pos = sites[column].variant_position;
            if cur_pos < prev_pos {
                return Err(Error::NonMonotonicPosition {
                    column,
                    prev_pos,
                    cur_pos,
                });
            }
        }

        let indexers: Vec<ColumnIndexer> = sites.iter().map(ColumnIndexer::build).collect();
        let transitions: Vec<TransitionProbabilityComputer> = (1..sites.len())
            .map(|t| {
                TransitionProbabilityComputer::new(
                    sites[t - 1].variant_position,
                    sites[t].variant_position,
                    config.recombination_rate,
                )
            })
            .collect();

        let checkpoint_stride = checkpoint::stride(sites.len());

        Ok(HmmEngine {
            sites,
            indexers,
            transitions,
            config,
            checkpoint_stride,
        })
    }

    fn emission_at(&self, t: usize) -> EmissionProbabilityComputer {
        EmissionProbabilityComputer::build_with_background(
            &self.sites[t],
            &self.indexers[t],
            self.config.background_fraction,
        )
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Overrides the sqrt-checkpoint stride. Used only by tests that
    /// check checkpointing correctness (spec §8 invariant 7): `k=1`
    /// (retain every column) must match `k=floor(sqrt(N))` up to
    /// floating-point reordering.
    #[cfg(test)]
    pub(crate) fn with_checkpoint_stride(mut self, stride: usize) -> Self {
        self.checkpoint_stride = stride.max(1);
        self
    }

    /// Runs the configured passes and returns one `GenotypingResult` per
    /// site, in site order.
    pub fn run(&self) -> Result<Vec<GenotypingResult>> {
        let n = self.sites.len();
        let mut results: Vec<GenotypingResult> = (0..n).map(|_| GenotypingResult::new()).collect();

        if n == 0 {
            return Ok(results);
        }

        if self.sites.iter().all(|s| s.kmers.is_empty()) {
            warn!(
                "chromosome has no k-mer evidence at any of its {} sites; emission degenerates to the path prior",
                n
            );
        }

        if self.config.do_genotyping {
            info!("running forward-backward over {} sites", n);
            self.forward_backward(&mut results)?;
        }
        if self.config.do_phasing {
            info!("running viterbi over {} sites", n);
            self.viterbi(&mut results)?;
        }
        Ok(results)
    }
}

/// Divides every cell by the column's `ln_sum_exp` so it sums to 1
/// (spec §8 invariant 1). Scaling by a shared constant preserves the
/// Viterbi argmax just as well as the forward-sum semantics, so both
/// passes share this routine (spec §4.4.4: "Normalise after each column
/// (preserves argmax, prevents underflow)").
pub(crate) fn normalize_column(col: &mut [LogProb], column: usize) -> Result<()> {
    let norm = LogProb::ln_sum_exp(col);
    if !norm.0.is_finite() {
        return Err(Error::NormalisationCollapse { column });
    }
    for v in col.iter_mut() {
        *v = *v - norm;
    }
    Ok(())
}
