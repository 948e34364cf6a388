//! Pure translation from a [`GenotypingResult`] to the VCF FORMAT fields
//! `GT`, `GL`, and `PL` (spec §6: "the engine populates their per-site
//! FORMAT fields GT and GL/PL"). No file I/O happens here; actual VCF
//! assembly is left to a thin consumer grounded in the teacher crate's
//! `bcf::Writer` usage (`calling/variants/preprocessing/mod.rs`), kept
//! out of this crate per spec §1.

use crate::genotyping_result::GenotypingResult;
use crate::variant::AlleleId;

/// `GT`/`GL`/`PL` for one site, plus the genotype order `GL`/`PL` are
/// indexed by (VCF 4.2 §1.6.2: genotype index `k*(k+1)/2 + j` for the
/// unordered pair `{j, k}`, `j <= k`).
#[derive(Debug, Clone, PartialEq)]
pub struct FormatFields {
    /// e.g. `"0/1"` (unphased, genotyping only) or `"0|1"` (phased,
    /// Viterbi ran).
    pub gt: String,
    /// Log10-scaled genotype likelihoods, one per entry of
    /// `genotype_order`.
    pub gl: Vec<f64>,
    /// Phred-scaled likelihoods relative to the most likely genotype,
    /// one per entry of `genotype_order`.
    pub pl: Vec<u32>,
    pub genotype_order: Vec<(AlleleId, AlleleId)>,
}

const MISSING_GT: &str = "./.";

/// Builds the VCF-index genotype order `(j, k)` for `j <= k < num_alleles`
/// used by `GL`/`PL` (VCF 4.2 §1.6.2).
fn genotype_order(num_alleles: u16) -> Vec<(AlleleId, AlleleId)> {
    let mut order = Vec::with_capacity(num_alleles as usize * (num_alleles as usize + 1) / 2);
    for k in 0..num_alleles as AlleleId {
        for j in 0..=k {
            order.push((j, k));
        }
    }
    order
}

/// Highest allele id mentioned by `result`'s likelihoods or phased
/// alleles, or `None` if the site carries no genotype information at
/// all (neither genotyping nor phasing ran).
fn max_allele(result: &GenotypingResult) -> Option<AlleleId> {
    let from_likelihoods = result.likelihoods().keys().map(|&(a, b)| a.max(b)).max();
    let from_phase = match (result.haplotype_1(), result.haplotype_2()) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    };
    match (from_likelihoods, from_phase) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Translates one site's `GenotypingResult` into FORMAT fields. `GT` is
/// phased (`|`) whenever `haplotype_1`/`haplotype_2` are set, unphased
/// (`/`) otherwise, taken from the likelihood argmax; both fields are
/// `"./."`/empty when neither pass ran (spec §4.4.5: "otherwise those
/// fields remain unset").
pub fn format_fields(result: &GenotypingResult) -> FormatFields {
    let gt = genotype_call(result);

    let num_alleles: u16 = match max_allele(result) {
        Some(max) => max as u16 + 1,
        None => {
            return FormatFields {
                gt,
                gl: Vec::new(),
                pl: Vec::new(),
                genotype_order: Vec::new(),
            }
        }
    };
    let order = genotype_order(num_alleles);

    let likelihoods = result.likelihoods();
    let raw: Vec<f64> = order
        .iter()
        .map(|&(j, k)| likelihoods.get(&(j, k)).copied().unwrap_or(0.0))
        .collect();

    let gl: Vec<f64> = raw
        .iter()
        .map(|&p| if p > 0.0 { p.log10() } else { f64::NEG_INFINITY })
        .collect();

    let max_likelihood = raw.iter().cloned().fold(0.0_f64, f64::max);
    let pl: Vec<u32> = raw
        .iter()
        .map(|&p| {
            if max_likelihood <= 0.0 || p <= 0.0 {
                if p >= max_likelihood {
                    0
                } else {
                    u32::MAX
                }
            } else {
                (-10.0 * (p / max_likelihood).log10()).round().max(0.0) as u32
            }
        })
        .collect();

    FormatFields {
        gt,
        gl,
        pl,
        genotype_order: order,
    }
}

fn genotype_call(result: &GenotypingResult) -> String {
    if let (Some(a), Some(b)) = (result.haplotype_1(), result.haplotype_2()) {
        return format!("{}|{}", a, b);
    }
    if let Some(((a, b), _)) = result
        .likelihoods()
        .iter()
        .max_by(|(_, x), (_, y)| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal))
    {
        return format!("{}/{}", a, b);
    }
    MISSING_GT.to_string()
}
