#![allow(
    clippy::too_many_arguments,
    clippy::uninlined_format_args,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    clippy::return_self_not_must_use
)]

// COHORTK - Cohort variant filtering toolkit
// Copyright (C) 2024  Osma S. Rautila
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! COHORTK core
//!
//! Subsets a genotype matrix to a cohort, masks low confidence genotype calls,
//! recomputes per-variant allele statistics and drops rare or poorly called
//! variants before the matrix is exported as a VCF.

pub mod checkpoint;
pub mod error;
pub mod export;
pub mod filters;
pub mod genotype;
pub mod io;
pub mod matrix;
pub mod pipeline;
pub mod samples;
pub mod stats;
pub mod variant;

pub use error::{Error, ErrorKind, Result};
pub use genotype::{Call, FilterStatus, GenotypeCall};
pub use matrix::VariantMatrix;
pub use pipeline::{ExecutionContext, MatrixFilterPipeline, PipelineConfig, PipelineReport, Stage};
pub use samples::{AncestryTable, SampleList, SampleSelector, Scope};
pub use variant::{AlleleSummary, CallStats, Locus, MergedInfo, Variant};
