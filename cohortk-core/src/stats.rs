use ndarray::ArrayView1;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::genotype::GenotypeCall;
use crate::matrix::VariantMatrix;
use crate::variant::{CallStats, Variant};

/// Hardy-Weinberg exact tests
pub mod hwe;

/// Recompute [`CallStats`] for every variant of the matrix.
///
/// Each row is reduced over all of its columns, rows are processed in parallel.
/// The result is in row order.
pub fn aggregate(matrix: &VariantMatrix) -> Result<Vec<CallStats>> {
    (0..matrix.nvariants())
        .into_par_iter()
        .map(|i| call_stats(matrix.variant(i), matrix.row(i)))
        .collect()
}

/// Allele counts, allele number, genotype class counts and HWE p-values of a single variant
pub fn call_stats(variant: &Variant, calls: ArrayView1<GenotypeCall>) -> Result<CallStats> {
    let n_alleles = variant.n_alleles();
    let mut allele_counts = vec![0u64; n_alleles];

    let (mut n_hom_ref, mut n_het, mut n_hom_var) = (0, 0, 0);

    for call in calls.iter().filter_map(|c| c.gt) {
        for allele in call.alleles {
            let count = allele_counts
                .get_mut(allele as usize)
                .ok_or_else(|| Error::AlleleIndex {
                    locus: variant.locus.to_string(),
                    allele,
                    n_alleles,
                })?;
            *count += 1;
        }

        match (call.is_hom_ref(), call.is_het()) {
            (true, _) => n_hom_ref += 1,
            (false, true) => n_het += 1,
            (false, false) => n_hom_var += 1,
        }
    }

    let n_called = n_hom_ref + n_het + n_hom_var;
    let an = n_called * 2;

    let ac: Vec<u64> = allele_counts.into_iter().skip(1).collect();
    let af = match an {
        0 => vec![],
        an => ac.iter().map(|c| *c as f64 / an as f64).collect(),
    };

    Ok(CallStats {
        ac,
        af,
        an,
        n_hom_ref,
        n_het,
        n_hom_var,
        p_value_hwe: hwe::hardy_weinberg_p(n_hom_ref, n_het, n_hom_var),
        p_value_excess_het: hwe::excess_het_p(n_hom_ref, n_het, n_hom_var),
    })
}
