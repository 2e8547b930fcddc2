use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::pipeline::Stage;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes used when reporting a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing scalar configuration, unresolvable join keys and malformed tables
    Configuration,
    /// The matrix is missing fields or holds values the pipeline cannot use
    Data,
    /// Checkpoint or output locations cannot be read or written
    Resource,
}

#[rustfmt::skip]
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Column {column:?} not found in the header of {path:?}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Malformed table {path:?} at line {line}: {reason}")]
    MalformedTable { path: PathBuf, line: u64, reason: String },

    #[error("Sample {sample} is assigned more than one ancestry in {path:?}")]
    DuplicateAssignment { sample: String, path: PathBuf },

    #[error("Ancestry {ancestry} was requested but no ancestry table was given")]
    MissingAncestryTable { ancestry: String },

    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("The matrix has no {field} field")]
    MissingField { field: String },

    #[error("Sample {sample} appears more than once in the matrix columns")]
    DuplicateSample { sample: String },

    #[error("Genotype grid of shape {shape:?} does not match {n_variants} variants and {n_samples} samples")]
    Shape { shape: (usize, usize), n_variants: usize, n_samples: usize },

    #[error("Genotype at {locus} refers to allele {allele} but the variant has {n_alleles} alleles")]
    AlleleIndex { locus: String, allele: u16, n_alleles: usize },

    #[error("Sample {sample} does not have a diploid genotype at {locus}. Only diploid calls are supported")]
    Ploidy { sample: String, locus: String },

    #[error("Total statistics at {locus} are already frozen")]
    TotalAlreadyFrozen { locus: String },

    #[error("Total statistics at {locus} were never computed")]
    TotalMissing { locus: String },

    #[error("Variant at {locus} has no merged INFO statistics")]
    MergedMissing { locus: String },

    #[error("Io error at {path:?}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("Compression error at {path:?}: {reason}")]
    Compression { path: PathBuf, reason: String },

    #[error("Checkpoint {name} serialization failed: {source}")]
    Checkpoint { name: String, #[source] source: serde_json::Error },

    #[error("Could not build a thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Stage {stage} failed: {source}")]
    Stage { stage: Stage, #[source] source: Box<Error> },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingColumn { .. }
            | Self::MalformedTable { .. }
            | Self::DuplicateAssignment { .. }
            | Self::MissingAncestryTable { .. }
            | Self::Csv(_)
            | Self::Config(_) => ErrorKind::Configuration,

            Self::MissingField { .. }
            | Self::DuplicateSample { .. }
            | Self::Shape { .. }
            | Self::AlleleIndex { .. }
            | Self::Ploidy { .. }
            | Self::TotalAlreadyFrozen { .. }
            | Self::TotalMissing { .. }
            | Self::MergedMissing { .. } => ErrorKind::Data,

            Self::Io { .. }
            | Self::Compression { .. }
            | Self::Checkpoint { .. }
            | Self::ThreadPool(_) => ErrorKind::Resource,

            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// The pipeline stage the error was raised in, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Stage { .. } => self,
            _ => Self::Stage { stage, source: Box::new(self) },
        }
    }
}
