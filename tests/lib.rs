//! End-to-end integration test: build a small multi-chromosome pangenome
//! through the public `VariantSource`/`KmerOracle`/`UniqueKmerBuilder`
//! traits, run it through the orchestrator (spec §5), and check the
//! per-site FORMAT-field translation (spec §6) on the results.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use pangenie_hmm::demo::{DemoSiteSpec, InMemoryKmerOracle, InMemoryUniqueKmerBuilder, InMemoryVariantSource};
use pangenie_hmm::format::format_fields;
use pangenie_hmm::orchestrator::{self, ChromosomeOutcome};
use pangenie_hmm::variant::{AlleleMask, Variant};
use pangenie_hmm::HmmEngineConfig;

#[test]
fn two_chromosome_pangenome_genotypes_and_phases_end_to_end() {
    let source = InMemoryVariantSource::builder()
        .with_chromosome(
            "chr1",
            vec![
                Variant::new("chr1", 1_000, vec![b"A".to_vec(), b"T".to_vec()]),
                Variant::new("chr1", 5_000, vec![b"C".to_vec(), b"G".to_vec()]),
            ],
        )
        .with_path_allele("chr1", 0, 0, 0)
        .with_path_allele("chr1", 0, 1, 1)
        .with_path_allele("chr1", 1, 0, 0)
        .with_path_allele("chr1", 1, 1, 1)
        .with_chromosome("chr2", vec![Variant::new("chr2", 2_000, vec![b"A".to_vec(), b"T".to_vec()])])
        .with_path_allele("chr2", 0, 0, 0)
        .with_path_allele("chr2", 0, 1, 1)
        .build()
        .unwrap();

    let mut counts = HashMap::new();
    counts.insert(b"chr1-alt-0".to_vec(), 20u32);
    counts.insert(b"chr1-alt-1".to_vec(), 2u32);
    let oracle = InMemoryKmerOracle::new(counts);

    let kmer_builder = InMemoryUniqueKmerBuilder::new()
        .with_site(
            "chr1",
            DemoSiteSpec {
                paths: vec![0, 1],
                kmers: vec![(b"chr1-alt-0".to_vec(), AlleleMask::from_alleles([1]))],
                local_coverage: 20.0,
            },
        )
        .with_site(
            "chr1",
            DemoSiteSpec {
                paths: vec![0, 1],
                kmers: vec![(b"chr1-alt-1".to_vec(), AlleleMask::from_alleles([1]))],
                local_coverage: 20.0,
            },
        )
        .with_site(
            "chr2",
            DemoSiteSpec {
                paths: vec![0, 1],
                kmers: vec![],
                local_coverage: 20.0,
            },
        );

    let config = HmmEngineConfig::default().recombination_rate(1.26);
    let cancelled = AtomicBool::new(false);
    let outcomes = orchestrator::run_all(&source, &oracle, &kmer_builder, &config, 2, &cancelled);

    assert!(!orchestrator::any_failed(&outcomes));
    assert_eq!(outcomes.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>(), vec!["chr1", "chr2"]);

    let (_, chr1_outcome) = &outcomes[0];
    let chr1_results = match chr1_outcome {
        ChromosomeOutcome::Ok(results) => results,
        ChromosomeOutcome::Failed(e) => panic!("chr1 should not fail: {e}"),
    };
    assert_eq!(chr1_results.len(), 2);

    // Strong alt support at site 0 should dominate the homozygous-alt
    // genotype and translate into a GT/PL pair with PL 0 there.
    let fields = format_fields(&chr1_results[0]);
    assert_eq!(fields.pl[fields.genotype_order.iter().position(|&g| g == (1, 1)).unwrap()], 0);
    assert!(fields.gt.contains('|'), "phasing ran, GT should be phased: {}", fields.gt);

    let (_, chr2_outcome) = &outcomes[1];
    let chr2_results = match chr2_outcome {
        ChromosomeOutcome::Ok(results) => results,
        ChromosomeOutcome::Failed(e) => panic!("chr2 should not fail: {e}"),
    };
    // No k-mer evidence at chr2's only site: posterior is the uninformative
    // path prior, {0/0: .25, 0/1: .5, 1/1: .25}.
    let likelihoods = chr2_results[0].likelihoods();
    assert!((likelihoods[&(0, 1)] - 0.5).abs() < 1e-6);
}

#[test]
fn cancellation_is_observed_between_chromosomes() {
    let source = InMemoryVariantSource::builder()
        .with_chromosome("chr1", vec![Variant::new("chr1", 1, vec![b"A".to_vec(), b"T".to_vec()])])
        .with_path_allele("chr1", 0, 0, 0)
        .with_path_allele("chr1", 0, 1, 1)
        .build()
        .unwrap();
    let oracle = InMemoryKmerOracle::new(HashMap::new());
    let kmer_builder = InMemoryUniqueKmerBuilder::new().with_site(
        "chr1",
        DemoSiteSpec {
            paths: vec![0, 1],
            kmers: vec![],
            local_coverage: 20.0,
        },
    );

    let cancelled = AtomicBool::new(true);
    let outcomes = orchestrator::run_all(
        &source,
        &oracle,
        &kmer_builder,
        &HmmEngineConfig::default(),
        1,
        &cancelled,
    );
    assert!(outcomes.is_empty());
}
