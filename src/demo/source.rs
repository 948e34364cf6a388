//! Fixtures: a canned variant catalogue (`InMemoryVariantSource`, built
//! with a `derive_builder`-generated owned builder the way the teacher
//! crate builds its heavier fixtures in `testcase.rs`'s `Testcase<T>`),
//! a literal k-mer-count table (`InMemoryKmerOracle`), and a builder
//! that stitches the two into `UniqueKmers` records
//! (`InMemoryUniqueKmerBuilder`).

use std::collections::HashMap;

use derive_builder::Builder;

use crate::errors::{Error, Result};
use crate::traits::{KmerOracle, UniqueKmerBuilder, VariantSource};
use crate::variant::{AlleleMask, KmerObservation, PathId, UniqueKmers, Variant};

/// Canned variant catalogue plus per-path allele assignments.
#[derive(Builder, Debug, Clone, Default)]
#[builder(pattern = "owned", default)]
pub struct InMemoryVariantSource {
    chromosomes: Vec<String>,
    variants: HashMap<String, Vec<Variant>>,
    allele_on_path: HashMap<(String, usize, PathId), u8>,
}

impl InMemoryVariantSource {
    pub fn builder() -> InMemoryVariantSourceBuilder {
        InMemoryVariantSourceBuilder::default()
    }
}

impl InMemoryVariantSourceBuilder {
    /// Registers one chromosome's variant list, appending `chromosome`
    /// to the source's chromosome order the first time it is seen.
    pub fn with_chromosome(mut self, chromosome: impl Into<String>, variants: Vec<Variant>) -> Self {
        let chromosome = chromosome.into();
        let mut chromosomes = self.chromosomes.unwrap_or_default();
        if !chromosomes.contains(&chromosome) {
            chromosomes.push(chromosome.clone());
        }
        self.chromosomes = Some(chromosomes);

        let mut by_chrom = self.variants.unwrap_or_default();
        by_chrom.insert(chromosome, variants);
        self.variants = Some(by_chrom);
        self
    }

    /// Records which allele `path` carries at the site with index
    /// `site` (into the chromosome's variant list) on `chromosome`.
    pub fn with_path_allele(
        mut self,
        chromosome: impl Into<String>,
        site: usize,
        path: PathId,
        allele: u8,
    ) -> Self {
        let mut map = self.allele_on_path.unwrap_or_default();
        map.insert((chromosome.into(), site, path), allele);
        self.allele_on_path = Some(map);
        self
    }
}

impl VariantSource for InMemoryVariantSource {
    fn chromosomes(&self) -> Vec<String> {
        self.chromosomes.clone()
    }

    fn variants(&self, chromosome: &str) -> &[Variant] {
        self.variants
            .get(chromosome)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn allele_on_path(&self, chromosome: &str, site: usize, path: PathId) -> Option<u8> {
        self.allele_on_path
            .get(&(chromosome.to_string(), site, path))
            .copied()
    }
}

/// Literal k-mer multiplicity table. Unknown k-mers count zero, which is
/// the correct answer for a k-mer that genuinely never occurred in the
/// sample's reads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKmerOracle {
    counts: HashMap<Vec<u8>, u32>,
}

impl InMemoryKmerOracle {
    pub fn new(counts: HashMap<Vec<u8>, u32>) -> Self {
        InMemoryKmerOracle { counts }
    }
}

impl KmerOracle for InMemoryKmerOracle {
    fn multiplicity(&self, kmer: &[u8]) -> u32 {
        self.counts.get(kmer).copied().unwrap_or(0)
    }
}

/// The covering paths and k-mer evidence the demo builder should
/// attach to one site. Allele ids are looked up from the `VariantSource`
/// at build time rather than duplicated here.
#[derive(Debug, Clone, Default)]
pub struct DemoSiteSpec {
    pub paths: Vec<PathId>,
    pub kmers: Vec<(Vec<u8>, AlleleMask)>,
    pub local_coverage: f64,
}

/// Builds `UniqueKmers` records by combining a `VariantSource`'s path
/// alleles with an `InMemoryKmerOracle`'s counts, per the site specs
/// registered here.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUniqueKmerBuilder {
    sites: HashMap<String, Vec<DemoSiteSpec>>,
}

impl InMemoryUniqueKmerBuilder {
    pub fn new() -> Self {
        InMemoryUniqueKmerBuilder::default()
    }

    pub fn with_site(mut self, chromosome: impl Into<String>, spec: DemoSiteSpec) -> Self {
        self.sites.entry(chromosome.into()).or_default().push(spec);
        self
    }
}

impl UniqueKmerBuilder for InMemoryUniqueKmerBuilder {
    fn build(
        &self,
        chromosome: &str,
        source: &dyn VariantSource,
        oracle: &dyn KmerOracle,
    ) -> Result<Vec<UniqueKmers>> {
        let specs = self.sites.get(chromosome).ok_or(Error::MissingArgument {
            name: "chromosome",
        })?;
        let variants = source.variants(chromosome);
        if specs.len() != variants.len() {
            return Err(Error::InvalidArgument {
                name: "sites",
                reason: format!(
                    "builder has {} site specs but the source has {} variants for {}",
                    specs.len(),
                    variants.len(),
                    chromosome
                ),
            });
        }

        let mut result = Vec::with_capacity(specs.len());
        for (site, (variant, spec)) in variants.iter().zip(specs.iter()).enumerate() {
            let mut covering_paths = Vec::with_capacity(spec.paths.len());
            for &path in &spec.paths {
                let allele = source
                    .allele_on_path(chromosome, site, path)
                    .ok_or(Error::MissingArgument {
                        name: "allele_on_path",
                    })?;
                covering_paths.push((path, allele));
            }

            let kmers = spec
                .kmers
                .iter()
                .map(|(sequence, mask)| KmerObservation {
                    multiplicity: oracle.multiplicity(sequence),
                    allele_mask: *mask,
                })
                .collect();

            result.push(UniqueKmers::new(
                variant.position,
                covering_paths,
                kmers,
                spec.local_coverage,
            ));
        }
        Ok(result)
    }
}
