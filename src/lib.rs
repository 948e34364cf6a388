//! Pair-HMM engine for pangenome-based variant genotyping and haplotype
//! phasing (spec §1). Combines a pangenome of known haplotype paths
//! through a variant graph with unique-k-mer evidence from short reads to
//! produce, per variant site, a genotype-likelihood posterior and a
//! phased haplotype pair.
//!
//! The crate boundary is the small set of traits in [`traits`]
//! (`VariantSource`, `KmerOracle`, `UniqueKmerBuilder`): everything
//! upstream of the engine — VCF/FASTA parsing, read-based k-mer
//! counting, graph traversal — is out of scope (spec §1) and is modeled
//! here only as named interfaces plus one in-memory reference
//! implementation under [`demo`] for tests and the bundled CLIs.

pub mod cli;
pub mod column_indexer;
pub mod demo;
pub mod emission;
pub mod errors;
pub mod format;
pub mod genotyping_result;
pub mod hmm;
pub mod orchestrator;
pub mod traits;
pub mod transition;
pub mod variant;

pub use errors::{Error, Result};
pub use genotyping_result::GenotypingResult;
pub use hmm::{HmmEngine, HmmEngineConfig};
pub use traits::{KmerOracle, UniqueKmerBuilder, VariantSource};
pub use variant::{AlleleId, AlleleMask, KmerObservation, PathId, UniqueKmers, Variant};
