//! In-memory `VariantSource`/`KmerOracle`/`UniqueKmerBuilder` fixtures
//! (spec §9 "Polymorphism" supplement). These back the crate's own tests
//! and the bundled CLIs' `--demo` path, which exercises the engine
//! without a real VCF/FASTA/k-mer-count pipeline behind it.

pub mod source;

pub use source::{
    DemoSiteSpec, InMemoryKmerOracle, InMemoryUniqueKmerBuilder, InMemoryVariantSource,
    InMemoryVariantSourceBuilder,
};
