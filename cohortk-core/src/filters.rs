use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::VariantMatrix;
use crate::variant::{AlleleSummary, Variant};

/// Sites with a minor allele frequency at or below this are monomorphic for the cohort
pub const MIN_AF: f64 = 0.001;

/// Sites with a minor allele frequency at or above this are near fixed
pub const MAX_AF: f64 = 0.999;

/// Row predicates over the merged cohort INFO. Undefined values never pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RowPredicate {
    /// minor AF > value
    MinorAfAbove(f64),
    /// minor AF < value
    MinorAfBelow(f64),
    /// minor AC >= value
    MinorAcAtLeast(u64),
}

impl RowPredicate {
    pub fn test(&self, info: &AlleleSummary) -> bool {
        match (self, info.af, info.ac) {
            (Self::MinorAfAbove(min), Some(af), _) => af > *min,
            (Self::MinorAfBelow(max), Some(af), _) => af < *max,
            (Self::MinorAcAtLeast(min), _, Some(ac)) => ac >= *min,
            _ => false,
        }
    }
}

impl std::fmt::Display for RowPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MinorAfAbove(v) => write!(f, "AF > {v}"),
            Self::MinorAfBelow(v) => write!(f, "AF < {v}"),
            Self::MinorAcAtLeast(v) => write!(f, "AC >= {v}"),
        }
    }
}

/// Conjunction of [`RowPredicate`]s applied in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFilterChain {
    predicates: Vec<RowPredicate>,
}

impl VariantFilterChain {
    /// Drop monomorphic and near fixed sites, then sites with a minor AC below `min_ac`
    pub fn new(min_ac: u64) -> Self {
        Self {
            predicates: vec![
                RowPredicate::MinorAfAbove(MIN_AF),
                RowPredicate::MinorAfBelow(MAX_AF),
                RowPredicate::MinorAcAtLeast(min_ac),
            ],
        }
    }

    pub fn from_predicates(predicates: Vec<RowPredicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[RowPredicate] {
        &self.predicates
    }

    pub fn passes(&self, info: &AlleleSummary) -> bool {
        self.predicates.iter().all(|p| p.test(info))
    }

    /// Apply the predicates one by one. Every variant must carry merged INFO.
    pub fn apply(&self, matrix: VariantMatrix) -> Result<VariantMatrix> {
        if let Some(variant) = matrix.variants().iter().find(|v| v.merged().is_none()) {
            return Err(Error::MergedMissing {
                locus: variant.locus.to_string(),
            });
        }

        let matrix = self.predicates.iter().fold(matrix, |matrix, predicate| {
            let before = matrix.nvariants();
            let matrix = matrix.filter_rows(|v, _| predicate.test(&cohort(v)));
            tracing::debug!(
                "Filter {predicate} removed {} variants",
                before - matrix.nvariants()
            );
            matrix
        });

        Ok(matrix)
    }
}

fn cohort(variant: &Variant) -> AlleleSummary {
    variant
        .merged()
        .map(|m| m.cohort)
        .unwrap_or_default()
}
