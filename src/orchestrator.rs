//! Inter-chromosome scheduling (spec §5): each chromosome gets its own
//! `HmmEngine` instance with no shared mutable state, run on a
//! `rayon::ThreadPoolBuilder` pool sized to
//! `min(hardware_parallelism, chromosome_count)` the way the teacher
//! crate sizes its CNV-calling pool in `cli.rs`
//! (`rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()`),
//! except scoped here rather than global so a library caller can run
//! more than one orchestration in the same process.
//!
//! Cancellation is checked only between chromosomes (spec §5): a worker
//! that observes the flag set before starting a chromosome skips it
//! rather than aborting mid-computation, so partial intra-chromosome
//! results are never published. Results are merged through a single
//! `std::sync::Mutex`-guarded map, written once per worker at the end of
//! its chromosome, then re-assembled in `VariantSource`-provided
//! chromosome order regardless of completion order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use log::{error, info};

use crate::errors::Error;
use crate::genotyping_result::GenotypingResult;
use crate::hmm::{HmmEngine, HmmEngineConfig};
use crate::traits::{KmerOracle, UniqueKmerBuilder, VariantSource};

/// Outcome of running the engine over one chromosome: either its
/// per-site results, or the error that aborted it (spec §7: Structural
/// and Numeric errors abort the chromosome, not the whole run).
pub enum ChromosomeOutcome {
    Ok(Vec<GenotypingResult>),
    Failed(Error),
}

/// Runs every chromosome `source` knows about, in parallel, and returns
/// the outcomes in `source.chromosomes()` order. `num_threads` is
/// clamped to `[1, min(hardware_parallelism, chromosome_count)]` (spec
/// §5: "≤ min(hardware_parallelism, chromosome_count)").
pub fn run_all(
    source: &dyn VariantSource,
    oracle: &dyn KmerOracle,
    kmer_builder: &dyn UniqueKmerBuilder,
    config: &HmmEngineConfig,
    num_threads: usize,
    cancelled: &AtomicBool,
) -> Vec<(String, ChromosomeOutcome)> {
    let chromosomes = source.chromosomes();
    if chromosomes.is_empty() {
        return Vec::new();
    }

    let hardware_parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let pool_size = num_threads.max(1).min(hardware_parallelism).min(chromosomes.len());
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(pool_size).build() {
        Ok(pool) => pool,
        Err(_) => {
            // Fall back to the process's default rayon pool if a
            // dedicated one can't be built (e.g. called from inside an
            // already-active rayon scope); correctness is unaffected.
            return run_sequential(source, oracle, kmer_builder, config, &chromosomes, cancelled);
        }
    };

    let results: Mutex<Vec<(String, ChromosomeOutcome)>> = Mutex::new(Vec::new());

    pool.scope(|scope| {
        for chromosome in &chromosomes {
            let results = &results;
            scope.spawn(move |_| {
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                let outcome = run_one(source, oracle, kmer_builder, config, chromosome);
                results.lock().unwrap().push((chromosome.clone(), outcome));
            });
        }
    });

    let mut by_chromosome = results.into_inner().unwrap();
    order_by_source(&mut by_chromosome, &chromosomes);
    by_chromosome
}

fn run_sequential(
    source: &dyn VariantSource,
    oracle: &dyn KmerOracle,
    kmer_builder: &dyn UniqueKmerBuilder,
    config: &HmmEngineConfig,
    chromosomes: &[String],
    cancelled: &AtomicBool,
) -> Vec<(String, ChromosomeOutcome)> {
    let mut out = Vec::with_capacity(chromosomes.len());
    for chromosome in chromosomes {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        out.push((
            chromosome.clone(),
            run_one(source, oracle, kmer_builder, config, chromosome),
        ));
    }
    out
}

fn run_one(
    source: &dyn VariantSource,
    oracle: &dyn KmerOracle,
    kmer_builder: &dyn UniqueKmerBuilder,
    config: &HmmEngineConfig,
    chromosome: &str,
) -> ChromosomeOutcome {
    let start = Instant::now();
    info!("chromosome {}: starting HMM engine", chromosome);

    let outcome = (|| {
        let sites = kmer_builder.build(chromosome, source, oracle)?;
        let engine = HmmEngine::new(&sites, config.clone())?;
        engine.run()
    })();

    match outcome {
        Ok(results) => {
            info!(
                "chromosome {}: finished {} sites in {:.3}s",
                chromosome,
                results.len(),
                start.elapsed().as_secs_f64()
            );
            ChromosomeOutcome::Ok(results)
        }
        Err(err) => {
            error!("chromosome {}: aborted: {}", chromosome, err);
            ChromosomeOutcome::Failed(err)
        }
    }
}

/// Re-orders `results` (arbitrary completion order) to match `order`
/// (the `VariantSource`'s chromosome order), per spec §5's ordering
/// guarantee. Chromosomes skipped by cancellation are simply absent.
fn order_by_source(results: &mut Vec<(String, ChromosomeOutcome)>, order: &[String]) {
    results.sort_by_key(|(chromosome, _)| {
        order
            .iter()
            .position(|c| c == chromosome)
            .unwrap_or(usize::MAX)
    });
}

/// True if any chromosome in `outcomes` failed; callers use this to pick
/// the process exit code (spec §7: "non-zero process exit if any
/// chromosome failed").
pub fn any_failed(outcomes: &[(String, ChromosomeOutcome)]) -> bool {
    outcomes
        .iter()
        .any(|(_, outcome)| matches!(outcome, ChromosomeOutcome::Failed(_)))
}
