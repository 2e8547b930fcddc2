//! COHORTK - Cohort variant filtering toolkit
//!
//! Reads a genotype matrix from a VCF or BCF, restricts it to a cohort of samples
//! (optionally of a single predicted ancestry and a single contig), masks genotype
//! calls that failed their FT filter and recomputes allele frequencies, counts and
//! Hardy-Weinberg p-values before and after a call rate filter. Rare, fixed and
//! poorly called variants are dropped and the result is written as a bgzipped VCF.
//!
//! ## Running COHORTK
//!
//! ```bash
//! cohortk filter $file -S samples.txt -A ancestry.tsv -a eur --chr chr1 -m 2 -o $outdir
//! ```
//!
//! Intermediate matrices can be kept with `--checkpoint-dir` and a failed run
//! continued with `--resume`.

#[doc(hidden)]
pub mod args;

/// Reading a VCF or BCF into a genotype matrix
pub mod read_vcf;

#[cfg(feature = "clap")]
pub mod clap;
