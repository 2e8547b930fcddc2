/// Subset a VCF to a cohort and export the variants passing the allele statistic filters
pub mod filter;

/// Shortcut to read sample names
pub mod list_samples;
