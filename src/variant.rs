//! Data types shared at the engine boundary: variant sites, paths, and the
//! per-site unique-k-mer evidence the engine consumes.

/// Small unsigned integer identifying an allele at a site (spec §3).
pub type AlleleId = u8;

/// Unsigned integer identifying a haplotype path across all sites.
pub type PathId = u32;

/// A single variant site as produced by a `VariantSource`: a reference
/// position plus the sequence of alleles observed across samples. The
/// engine itself never inspects `alleles`; it is retained so
/// `allele_on_path` lookups (spec §6) can be served from the same record
/// the `UniqueKmers` were derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub chromosome: String,
    pub position: u64,
    pub alleles: Vec<Vec<u8>>,
}

impl Variant {
    pub fn new(chromosome: impl Into<String>, position: u64, alleles: Vec<Vec<u8>>) -> Self {
        Variant {
            chromosome: chromosome.into(),
            position,
            alleles,
        }
    }
}

/// One observed k-mer at a site: how many times it was counted in the
/// sample's reads, and which alleles of the site it is compatible with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerObservation {
    pub multiplicity: u32,
    pub allele_mask: AlleleMask,
}

/// Bitset over a site's allele ids. Alleles are small (spec: 0..=255), so
/// a single `u64` word covers any realistic site (≤ 64 distinct alleles);
/// sites with more alleles than that are outside what PanGenie-style
/// pangenomes encode per-site and are rejected by `UniqueKmers::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlleleMask(pub u64);

impl AlleleMask {
    pub fn empty() -> Self {
        AlleleMask(0)
    }

    pub fn from_alleles(alleles: impl IntoIterator<Item = AlleleId>) -> Self {
        let mut mask = 0u64;
        for a in alleles {
            mask |= 1u64 << a;
        }
        AlleleMask(mask)
    }

    pub fn contains(&self, allele: AlleleId) -> bool {
        (self.0 >> allele) & 1 == 1
    }
}

/// Per-site evidence record handed to the engine (spec §3): the paths
/// covering the site with their allele, the k-mers unique to the site with
/// observed multiplicity, and the expected per-haplotype coverage used by
/// the emission model.
#[derive(Debug, Clone)]
pub struct UniqueKmers {
    pub variant_position: u64,
    pub covering_paths: Vec<(PathId, AlleleId)>,
    pub kmers: Vec<KmerObservation>,
    pub local_coverage: f64,
}

impl UniqueKmers {
    pub fn new(
        variant_position: u64,
        covering_paths: Vec<(PathId, AlleleId)>,
        kmers: Vec<KmerObservation>,
        local_coverage: f64,
    ) -> Self {
        UniqueKmers {
            variant_position,
            covering_paths,
            kmers,
            local_coverage,
        }
    }

    /// Number of paths covering this site (spec: `P`).
    pub fn path_count(&self) -> usize {
        self.covering_paths.len()
    }

    /// Distinct allele ids observed among the covering paths.
    pub fn alleles(&self) -> Vec<AlleleId> {
        let mut alleles: Vec<AlleleId> = self
            .covering_paths
            .iter()
            .map(|(_, allele)| *allele)
            .collect();
        alleles.sort_unstable();
        alleles.dedup();
        alleles
    }

    /// Validates the invariants spec §3 requires of a site: at least one
    /// covering path, and every allele_mask bit referring to an allele
    /// actually present at the site.
    pub fn validate(&self, column: usize) -> crate::errors::Result<()> {
        if self.covering_paths.is_empty() {
            return Err(crate::errors::Error::NoCoveringPaths { column });
        }
        let present = self.alleles();
        for kmer in &self.kmers {
            for allele in 0u8..=63 {
                if kmer.allele_mask.contains(allele) && !present.contains(&allele) {
                    return Err(crate::errors::Error::UnknownAlleleInMask { column, allele });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allele_mask_round_trips() {
        let mask = AlleleMask::from_alleles([0, 2, 5]);
        assert!(mask.contains(0));
        assert!(!mask.contains(1));
        assert!(mask.contains(2));
        assert!(mask.contains(5));
    }

    #[test]
    fn validate_rejects_empty_paths() {
        let site = UniqueKmers::new(100, vec![], vec![], 20.0);
        assert!(site.validate(0).is_err());
    }

    #[test]
    fn validate_rejects_foreign_allele_mask() {
        let site = UniqueKmers::new(
            100,
            vec![(0, 0), (1, 1)],
            vec![KmerObservation {
                multiplicity: 5,
                allele_mask: AlleleMask::from_alleles([2]),
            }],
            20.0,
        );
        assert!(site.validate(0).is_err());
    }
}
