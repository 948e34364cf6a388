//! Integration tests for the HMM engine: the scenarios and universal
//! invariants from spec §8.

use assert_approx_eq::assert_approx_eq;
use bio::stats::LogProb;

use super::{HmmEngine, HmmEngineConfig};
use crate::variant::{AlleleMask, KmerObservation, UniqueKmers};

fn site(position: u64, paths: &[(u32, u8)], kmers: Vec<KmerObservation>, coverage: f64) -> UniqueKmers {
    UniqueKmers::new(position, paths.to_vec(), kmers, coverage)
}

fn kmer(multiplicity: u32, alleles: &[u8]) -> KmerObservation {
    KmerObservation {
        multiplicity,
        allele_mask: AlleleMask::from_alleles(alleles.iter().copied()),
    }
}

fn assert_sums_to_one(col: &[LogProb], tol: f64) {
    let sum: f64 = col.iter().map(|p| p.exp()).sum();
    assert_approx_eq!(sum, 1.0, tol);
}

// S1 — single site, two paths, no reads.
#[test]
fn s1_single_site_two_paths_no_reads() {
    let sites = vec![site(100, &[(0, 0), (1, 1)], vec![], 20.0)];
    let engine = HmmEngine::new(&sites, HmmEngineConfig::default()).unwrap();
    let results = engine.run().unwrap();

    let likelihoods = results[0].likelihoods();
    assert_approx_eq!(likelihoods[&(0, 0)], 0.25, 1e-9);
    assert_approx_eq!(likelihoods[&(0, 1)], 0.5, 1e-9);
    assert_approx_eq!(likelihoods[&(1, 1)], 0.25, 1e-9);

    let h1 = results[0].haplotype_1().unwrap();
    let h2 = results[0].haplotype_2().unwrap();
    let het = (h1 == 0 && h2 == 1) || (h1 == 1 && h2 == 0);
    assert!(het, "expected a heterozygous phased call, got ({h1}, {h2})");
}

// S2 — two sites, identical paths, huge distance: p_stay -> 0.5, marginals
// at each site converge to the same {0.25, 0.5, 0.25} split as S1.
#[test]
fn s2_two_sites_huge_distance_gives_uniform_joint() {
    // Distance large enough that p_stay/p_switch are within 1e-6 of 0.5
    // (see src/transition.rs's huge_distance_approaches_uniform test).
    let sites = vec![
        site(1, &[(0, 0), (1, 1)], vec![], 20.0),
        site(3_000_000_000, &[(0, 0), (1, 1)], vec![], 20.0),
    ];
    let config = HmmEngineConfig::default().recombination_rate(1.0);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();

    for result in &results {
        let l = result.likelihoods();
        assert_approx_eq!(l[&(0, 0)], 0.25, 1e-6);
        assert_approx_eq!(l[&(0, 1)], 0.5, 1e-6);
        assert_approx_eq!(l[&(1, 1)], 0.25, 1e-6);
    }
}

// S3 — two sites, identical paths, zero distance: p_stay = 1, so whichever
// path occupies a haplotype slot at site 1 must still occupy it at site 2.
#[test]
fn s3_zero_distance_forces_constant_phase() {
    let sites = vec![
        site(100, &[(0, 0), (1, 1)], vec![], 20.0),
        site(100, &[(0, 0), (1, 1)], vec![], 20.0),
    ];
    let config = HmmEngineConfig::default().recombination_rate(1.0);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();

    assert_eq!(results[0].haplotype_1(), results[1].haplotype_1());
    assert_eq!(results[0].haplotype_2(), results[1].haplotype_2());
}

// S4 — emission-only site: strong single-allele k-mer support concentrates
// the posterior on the matching homozygous genotype.
#[test]
fn s4_emission_only_concentrates_on_supported_genotype() {
    let sites = vec![site(
        100,
        &[(0, 0), (1, 0), (2, 1)],
        vec![kmer(20, &[1])],
        20.0,
    )];
    let engine = HmmEngine::new(&sites, HmmEngineConfig::default()).unwrap();
    let results = engine.run().unwrap();

    assert!(results[0].likelihoods()[&(1, 1)] >= 0.9);
}

// S5 — tri-allelic site: two k-mers, one per alt allele, each matching
// the expected coverage for a heterozygous alt/alt genotype.
#[test]
fn s5_tri_allelic_heterozygous_dominates() {
    let sites = vec![site(
        100,
        &[(0, 0), (1, 1), (2, 2)],
        vec![kmer(10, &[1]), kmer(10, &[2])],
        20.0,
    )];
    let engine = HmmEngine::new(&sites, HmmEngineConfig::default()).unwrap();
    let results = engine.run().unwrap();

    let l = results[0].likelihoods();
    let het = l[&(1, 2)];
    for (&genotype, &value) in l.iter() {
        if genotype != (1, 2) {
            assert!(het > value, "expected {{1,2}} to dominate over {genotype:?}");
        }
    }
}

// S6 — ten-site chain with recombination and alternating strong evidence.
#[test]
fn s6_ten_site_chain_normalises_and_favors_het() {
    let sites: Vec<UniqueKmers> = (0..10u64)
        .map(|i| {
            let supported_allele = if i % 2 == 0 { 0u8 } else { 1u8 };
            site(
                1 + i * 10_000,
                &[(0, 0), (1, 1)],
                vec![kmer(10, &[supported_allele])],
                20.0,
            )
        })
        .collect();
    let config = HmmEngineConfig::default().recombination_rate(1.26);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();

    for result in &results {
        assert!(result.likelihoods()[&(0, 1)] >= 0.8);
        assert!(result.haplotype_1().is_some());
        assert!(result.haplotype_2().is_some());
    }
}

#[test]
fn forward_and_viterbi_columns_sum_to_one() {
    let sites: Vec<UniqueKmers> = (0..6u64)
        .map(|i| site(1 + i * 1000, &[(0, 0), (1, 1), (2, 1)], vec![kmer(8, &[1])], 16.0))
        .collect();
    let config = HmmEngineConfig::default().recombination_rate(0.8);
    let engine = HmmEngine::new(&sites, config).unwrap();

    let forward_checkpoints = engine.forward_checkpoints().unwrap();
    for t in 0..sites.len() {
        let col = engine.forward_column_at(t, &forward_checkpoints).unwrap();
        assert_sums_to_one(&col, 1e-9);
    }

    let viterbi_checkpoints = engine.viterbi_checkpoints().unwrap();
    for t in 0..sites.len() {
        if let Some((col, _)) = viterbi_checkpoints.get(t) {
            assert_sums_to_one(col, 1e-9);
        }
    }
}

#[test]
fn genotyping_result_likelihoods_sum_to_one_when_genotyping_ran() {
    let sites = vec![
        site(1, &[(0, 0), (1, 1)], vec![], 20.0),
        site(5000, &[(0, 0), (1, 1)], vec![kmer(12, &[1])], 20.0),
        site(9000, &[(0, 0), (1, 1)], vec![], 20.0),
    ];
    let config = HmmEngineConfig::default().recombination_rate(1.0);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();

    for result in &results {
        let sum: f64 = result.likelihoods().values().sum();
        assert_approx_eq!(sum, 1.0, 1e-9);
    }
}

// Checkpointing correctness (spec §8 invariant 7): k=1 and
// k=floor(sqrt(N)) must agree up to floating-point reordering.
#[test]
fn checkpointing_stride_does_not_change_results() {
    let sites: Vec<UniqueKmers> = (0..12u64)
        .map(|i| {
            let allele = if i % 3 == 0 { 1u8 } else { 0u8 };
            site(1 + i * 2000, &[(0, 0), (1, 1)], vec![kmer(9, &[allele])], 18.0)
        })
        .collect();
    let config = HmmEngineConfig::default().recombination_rate(1.1);

    let dense = HmmEngine::new(&sites, config.clone())
        .unwrap()
        .with_checkpoint_stride(1);
    let sparse = HmmEngine::new(&sites, config)
        .unwrap()
        .with_checkpoint_stride(super::checkpoint::stride(sites.len()));

    let dense_results = dense.run().unwrap();
    let sparse_results = sparse.run().unwrap();

    for (d, s) in dense_results.iter().zip(sparse_results.iter()) {
        for (genotype, value) in d.likelihoods() {
            let other = s.likelihoods()[genotype];
            assert_approx_eq!(*value, other, 1e-10);
        }
        assert_eq!(d.haplotype_1(), s.haplotype_1());
        assert_eq!(d.haplotype_2(), s.haplotype_2());
    }
}

#[test]
fn genotyping_only_skips_phasing() {
    let sites = vec![site(1, &[(0, 0), (1, 1)], vec![], 20.0)];
    let config = HmmEngineConfig::default().do_phasing(false);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();
    assert!(results[0].haplotype_1().is_none());
    assert!(!results[0].likelihoods().is_empty());
}

#[test]
fn phasing_only_skips_genotyping() {
    let sites = vec![site(1, &[(0, 0), (1, 1)], vec![], 20.0)];
    let config = HmmEngineConfig::default().do_genotyping(false);
    let engine = HmmEngine::new(&sites, config).unwrap();
    let results = engine.run().unwrap();
    assert!(results[0].likelihoods().is_empty());
    assert!(results[0].haplotype_1().is_some());
}

#[test]
fn zero_covering_paths_is_rejected() {
    let sites = vec![site(1, &[], vec![], 20.0)];
    let err = HmmEngine::new(&sites, HmmEngineConfig::default());
    assert!(err.is_err());
}

#[test]
fn non_monotonic_positions_are_rejected() {
    let sites = vec![
        site(100, &[(0, 0), (1, 1)], vec![], 20.0),
        site(50, &[(0, 0), (1, 1)], vec![], 20.0),
    ];
    let err = HmmEngine::new(&sites, HmmEngineConfig::default());
    assert!(err.is_err());
}

#[test]
fn at_least_one_of_genotyping_or_phasing_is_required() {
    let sites = vec![site(1, &[(0, 0), (1, 1)], vec![], 20.0)];
    let config = HmmEngineConfig::default().do_genotyping(false).do_phasing(false);
    assert!(HmmEngine::new(&sites, config).is_err());
}
