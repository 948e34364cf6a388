//! Per-cell emission probability from observed k-mer multiplicities
//! (spec §4.3). Modeled after the teacher crate's
//! `model/evidence/observation.rs::poisson_pmf`, but computed without a
//! GSL binding: `ln P(m; lambda)` is accumulated directly in log space.

use std::collections::HashMap;

use bio::stats::LogProb;

use crate::column_indexer::ColumnIndexer;
use crate::variant::{AlleleId, UniqueKmers};

/// `ln(m!)` by repeated summation; k-mer multiplicities are small read
/// counts, so this is cheap and avoids pulling in a gamma-function crate
/// for a handful of terms.
fn ln_factorial(m: u32) -> f64 {
    (1..=m as u64).map(|i| (i as f64).ln()).sum()
}

/// Poisson log-probability of observing `count` copies given mean `lambda`.
fn poisson_log_pmf(count: u32, lambda: f64) -> LogProb {
    if lambda <= 0.0 {
        return if count == 0 {
            LogProb::ln_one()
        } else {
            LogProb::ln_zero()
        };
    }
    let ln_p = count as f64 * lambda.ln() - lambda - ln_factorial(count);
    LogProb(ln_p)
}

/// Emission model for one column: either genuinely k-mer-driven, or the
/// uniform degenerate case when the site carries no k-mer evidence (spec
/// §4.3, §9 "Polymorphism": modeled as a tagged variant rather than
/// inheritance).
pub enum EmissionProbabilityComputer {
    Uniform,
    KmerBased {
        /// cache keyed by unordered genotype `(min(a,b), max(a,b))`
        cache: HashMap<(AlleleId, AlleleId), LogProb>,
    },
}

impl EmissionProbabilityComputer {
    /// Background Poisson mean for zero-expected-copy k-mers, as a
    /// fraction of `local_coverage` (spec §9 open question: exposed as a
    /// parameter, default `0.05`).
    pub const DEFAULT_BACKGROUND_FRACTION: f64 = 0.05;

    pub fn build(site: &UniqueKmers, indexer: &ColumnIndexer) -> Self {
        Self::build_with_background(site, indexer, Self::DEFAULT_BACKGROUND_FRACTION)
    }

    pub fn build_with_background(
        site: &UniqueKmers,
        indexer: &ColumnIndexer,
        background_fraction: f64,
    ) -> Self {
        if site.kmers.is_empty() {
            return EmissionProbabilityComputer::Uniform;
        }

        let alleles = site.alleles();
        let mut cache = HashMap::with_capacity(alleles.len() * (alleles.len() + 1) / 2);
        for (idx, &a) in alleles.iter().enumerate() {
            for &b in &alleles[idx..] {
                let mut ln_prob = LogProb::ln_one();
                for kmer in &site.kmers {
                    let expected_count =
                        kmer.allele_mask.contains(a) as u32 + kmer.allele_mask.contains(b) as u32;
                    let lambda = if expected_count == 0 {
                        background_fraction * site.local_coverage
                    } else {
                        expected_count as f64 * site.local_coverage / 2.0
                    };
                    ln_prob = ln_prob + poisson_log_pmf(kmer.multiplicity, lambda);
                }
                cache.insert((a, b), ln_prob);
            }
        }
        let _ = indexer; // indexer shape is implicit in `site.alleles()`
        EmissionProbabilityComputer::KmerBased { cache }
    }

    /// Emission probability for a cell given its ordered genotype.
    pub fn emission(&self, a_i: AlleleId, a_j: AlleleId) -> LogProb {
        match self {
            EmissionProbabilityComputer::Uniform => LogProb::ln_one(),
            EmissionProbabilityComputer::KmerBased { cache } => {
                let key = if a_i <= a_j { (a_i, a_j) } else { (a_j, a_i) };
                *cache.get(&key).unwrap_or(&LogProb::ln_zero())
            }
        }
    }
}
