// Copyright 2024 pangenie-hmm contributors.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Process-level surface (spec §6): the two CLIs ("k-mer evidence" and
//! "paths only"), built with `structopt` in the style of the teacher
//! crate's `Varlociraptor` enum in `cli.rs`, but flattened to spec.md's
//! flat flag set since this crate has no subcommand grammar. Both
//! binaries share [`run`]; they differ only in whether `-i` (reads) is
//! a recognised, mandatory flag.
//!
//! Neither binary parses real VCF/FASTA/FASTQ files: that parsing is the
//! `VariantSource`/`KmerOracle` collaborators named in spec §1 and kept
//! out of this crate's scope. The files named by `-r`/`-v`/`-i` are only
//! opened to reproduce the usage-error semantics of a missing or
//! unreadable input (spec §7 `UsageError`); the pangenome and evidence
//! actually run through the engine come from the bundled
//! [`crate::demo`] fixture, logged loudly so nobody mistakes it for a
//! real genotyping run.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use structopt::StructOpt;

use crate::demo::{DemoSiteSpec, InMemoryKmerOracle, InMemoryUniqueKmerBuilder, InMemoryVariantSource};
use crate::format::format_fields;
use crate::hmm::HmmEngineConfig;
use crate::orchestrator::{self, ChromosomeOutcome};
use crate::variant::AlleleMask;
use crate::variant::Variant;

/// Flags common to both CLIs (spec §6).
#[derive(Debug, StructOpt, Clone)]
pub struct CommonOpt {
    /// FASTA reference (required).
    #[structopt(short = "r", long = "reference", parse(from_os_str))]
    pub reference: PathBuf,

    /// Phased multi-sample VCF providing paths (required).
    #[structopt(short = "v", long = "vcf", parse(from_os_str))]
    pub vcf: PathBuf,

    /// Output prefix.
    #[structopt(short = "o", long = "output-prefix", default_value = "result")]
    pub output_prefix: String,

    /// K-mer length.
    #[structopt(short = "k", long = "kmer-length", default_value = "31")]
    pub kmer_length: u32,

    /// Sample name in the output VCF.
    #[structopt(short = "s", long = "sample-name", default_value = "sample")]
    pub sample_name: String,

    /// Worker threads.
    #[structopt(short = "t", long = "threads", default_value = "1")]
    pub threads: usize,

    /// Genotyping only (forward-backward).
    #[structopt(short = "g", long = "genotyping-only")]
    pub genotyping_only: bool,

    /// Phasing only (Viterbi).
    #[structopt(short = "p", long = "phasing-only")]
    pub phasing_only: bool,
}

/// `pangenie-hmm-kmer`: the k-mer-evidence CLI (spec §6, `-i` present).
#[derive(Debug, StructOpt)]
#[structopt(
    name = "pangenie-hmm-kmer",
    about = "Genotype and phase variants using pangenome paths and k-mer evidence from reads."
)]
pub struct KmerOpt {
    #[structopt(flatten)]
    pub common: CommonOpt,

    /// FASTQ/FASTA reads (required, k-mer-evidence mode only).
    #[structopt(short = "i", long = "reads", parse(from_os_str))]
    pub reads: PathBuf,
}

/// `pangenie-hmm-paths`: the paths-only CLI (spec §6, `-i` absent).
#[derive(Debug, StructOpt)]
#[structopt(
    name = "pangenie-hmm-paths",
    about = "Genotype and phase variants using pangenome paths only, no read evidence."
)]
pub struct PathsOpt {
    #[structopt(flatten)]
    pub common: CommonOpt,
}

fn check_readable(flag: &'static str, path: &Path) -> Result<()> {
    File::open(path)
        .map(|_| ())
        .with_context(|| format!("failed to open {} file {}", flag, path.display()))
}

/// Genotyping/phasing mode flags, gated per spec §6 (`-g`/`-p`; at least
/// one of genotyping/phasing is enforced by `HmmEngineConfig::validate`).
fn engine_config(common: &CommonOpt) -> HmmEngineConfig {
    let (do_genotyping, do_phasing) = match (common.genotyping_only, common.phasing_only) {
        (true, true) => (true, true), // both flags given: no restriction, run both
        (true, false) => (true, false),
        (false, true) => (false, true),
        (false, false) => (true, true),
    };
    HmmEngineConfig::default()
        .do_genotyping(do_genotyping)
        .do_phasing(do_phasing)
}

/// Entry point for `pangenie-hmm-kmer`. Returns the process exit code.
pub fn run_kmer(opt: KmerOpt) -> Result<i32> {
    check_readable("-r/--reference", &opt.common.reference)?;
    check_readable("-v/--vcf", &opt.common.vcf)?;
    check_readable("-i/--reads", &opt.reads)?;
    info!(
        "k-mer length {} requested (k-mer counting is out of this crate's scope; demo fixture used)",
        opt.common.kmer_length
    );
    run(&opt.common)
}

/// Entry point for `pangenie-hmm-paths`. Returns the process exit code.
pub fn run_paths(opt: PathsOpt) -> Result<i32> {
    check_readable("-r/--reference", &opt.common.reference)?;
    check_readable("-v/--vcf", &opt.common.vcf)?;
    run(&opt.common)
}

/// Shared orchestration: build the demo pangenome, run every
/// chromosome, write the three output artefacts (spec §6).
fn run(common: &CommonOpt) -> Result<i32> {
    warn!(
        "-r {} and -v {} are not parsed; running the bundled demo pangenome fixture instead \
         (VCF/FASTA parsing is out of this crate's scope, spec §1)",
        common.reference.display(),
        common.vcf.display()
    );

    let (source, oracle, kmer_builder) = demo_fixture();
    let config = engine_config(common);
    let cancelled = AtomicBool::new(false);

    let outcomes = orchestrator::run_all(
        &source,
        &oracle,
        &kmer_builder,
        &config,
        common.threads,
        &cancelled,
    );

    write_path_segments_fasta(common, &source)?;
    write_vcf(
        &format!("{}_genotyping.vcf", common.output_prefix),
        common,
        &outcomes,
        config.do_genotyping,
    )?;
    write_vcf(
        &format!("{}_phasing.vcf", common.output_prefix),
        common,
        &outcomes,
        config.do_phasing,
    )?;

    Ok(if orchestrator::any_failed(&outcomes) { 1 } else { 0 })
}

/// A small, fixed, in-memory pangenome standing in for real VCF/FASTA
/// parsing (spec §1 "[SUPPLEMENT]"): two chromosomes, three biallelic
/// sites each, two paths per site.
fn demo_fixture() -> (InMemoryVariantSource, InMemoryKmerOracle, InMemoryUniqueKmerBuilder) {
    let mut source_builder = InMemoryVariantSource::builder();
    let mut kmer_builder = InMemoryUniqueKmerBuilder::new();

    for chromosome in ["chr1", "chr2"] {
        let variants: Vec<Variant> = (0..3)
            .map(|i| Variant::new(chromosome, 1000 + i * 10_000, vec![b"A".to_vec(), b"T".to_vec()]))
            .collect();
        source_builder = source_builder
            .with_chromosome(chromosome, variants)
            .with_path_allele(chromosome, 0, 0, 0)
            .with_path_allele(chromosome, 0, 1, 1)
            .with_path_allele(chromosome, 1, 0, 0)
            .with_path_allele(chromosome, 1, 1, 1)
            .with_path_allele(chromosome, 2, 0, 0)
            .with_path_allele(chromosome, 2, 1, 1);

        for site in 0..3 {
            kmer_builder = kmer_builder.with_site(
                chromosome,
                DemoSiteSpec {
                    paths: vec![0, 1],
                    kmers: vec![(
                        format!("{}-{}-alt", chromosome, site).into_bytes(),
                        AlleleMask::from_alleles([1]),
                    )],
                    local_coverage: 20.0,
                },
            );
        }
    }

    let source = source_builder.build().expect("demo fixture is internally consistent");
    let mut counts = HashMap::new();
    for chromosome in ["chr1", "chr2"] {
        for site in 0..3 {
            counts.insert(format!("{}-{}-alt", chromosome, site).into_bytes(), 12u32);
        }
    }
    let oracle = InMemoryKmerOracle::new(counts);
    (source, oracle, kmer_builder)
}

/// `<prefix>_path_segments.fasta`: the path-segment sequences backing
/// the demo pangenome. Not engine-visible (spec §6).
fn write_path_segments_fasta(common: &CommonOpt, source: &InMemoryVariantSource) -> Result<()> {
    use bio::io::fasta;

    use crate::traits::VariantSource;

    let path = format!("{}_path_segments.fasta", common.output_prefix);
    let mut writer = fasta::Writer::to_file(&path).with_context(|| format!("failed to create {}", path))?;
    for chromosome in source.chromosomes() {
        for (site, variant) in source.variants(&chromosome).iter().enumerate() {
            for (allele, sequence) in variant.alleles.iter().enumerate() {
                let id = format!("{}_{}_allele{}", chromosome, site, allele);
                writer.write(&id, None, sequence)?;
            }
        }
    }
    Ok(())
}

/// Writes one of `<prefix>_genotyping.vcf` / `<prefix>_phasing.vcf`
/// (spec §6). A minimal hand-assembled VCF body: this crate does not
/// depend on `rust-htslib`, so header/record assembly is done with
/// plain text rather than `bcf::Writer`, keeping the "thin example
/// consumer" light (spec §6 supplement).
fn write_vcf(path: &str, common: &CommonOpt, outcomes: &[(String, ChromosomeOutcome)], pass_ran: bool) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("failed to create {}", path))?;
    writeln!(file, "##fileformat=VCFv4.2")?;
    writeln!(file, "##source=pangenie-hmm")?;
    writeln!(file, "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">")?;
    writeln!(
        file,
        "##FORMAT=<ID=GL,Number=G,Type=Float,Description=\"Log10-scaled genotype likelihoods\">"
    )?;
    writeln!(
        file,
        "##FORMAT=<ID=PL,Number=G,Type=Integer,Description=\"Phred-scaled genotype likelihoods\">"
    )?;
    writeln!(
        file,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
        common.sample_name
    )?;

    for (chromosome, outcome) in outcomes {
        let results = match outcome {
            ChromosomeOutcome::Ok(results) => results,
            ChromosomeOutcome::Failed(_) => continue,
        };
        for (site, result) in results.iter().enumerate() {
            let fields = format_fields(result);
            let (gt, gl, pl) = if pass_ran {
                (
                    fields.gt,
                    fields.gl.iter().map(|v| format!("{:.2}", v)).join(","),
                    fields.pl.iter().join(","),
                )
            } else {
                ("./.".to_string(), String::new(), String::new())
            };
            writeln!(
                file,
                "{}\t{}\t.\tN\t.\t.\tPASS\t.\tGT:GL:PL\t{}:{}:{}",
                chromosome, site, gt, gl, pl
            )?;
        }
    }
    Ok(())
}
