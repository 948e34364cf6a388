//! Named interfaces to the engine's out-of-scope collaborators (spec §1,
//! §6, §9 "Polymorphism"): VCF/FASTA parsing, k-mer counting, and
//! unique-k-mer set construction each live behind a trait rather than a
//! concrete dependency, so the engine never has to know whether its
//! evidence came from real reads or a fixture.

use crate::errors::Result;
use crate::variant::{PathId, UniqueKmers, Variant};

/// Yields an ordered list of variant sites per chromosome, plus the
/// allele a given path carries at a given site (spec §6:
/// `allele_on_path`).
pub trait VariantSource {
    fn chromosomes(&self) -> Vec<String>;
    fn variants(&self, chromosome: &str) -> &[Variant];
    fn allele_on_path(&self, chromosome: &str, site: usize, path: PathId) -> Option<u8>;
}

/// Counts a k-mer's multiplicity in the sample's reads (or in the graph,
/// for the unique-k-mer builder's own bookkeeping). The engine never
/// calls this directly; it is consumed by `UniqueKmerBuilder`.
pub trait KmerOracle {
    fn multiplicity(&self, kmer: &[u8]) -> u32;
}

/// Produces the per-site `UniqueKmers` records the engine consumes, given
/// a `VariantSource` and a `KmerOracle`.
pub trait UniqueKmerBuilder {
    fn build(
        &self,
        chromosome: &str,
        source: &dyn VariantSource,
        oracle: &dyn KmerOracle,
    ) -> Result<Vec<UniqueKmers>>;
}
