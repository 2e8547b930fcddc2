use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::genotype::GenotypeCall;
use crate::variant::Variant;

/// Variants (rows) x samples (columns) grid of genotype calls.
///
/// Row and column selection consume the matrix and return a new version, so
/// a version handed to a checkpoint is never changed afterwards.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantMatrix {
    variants: Vec<Variant>,
    samples: Vec<String>,
    calls: Array2<GenotypeCall>,
}

impl VariantMatrix {
    pub fn new(
        variants: Vec<Variant>,
        samples: Vec<String>,
        calls: Array2<GenotypeCall>,
    ) -> Result<Self> {
        if calls.dim() != (variants.len(), samples.len()) {
            return Err(Error::Shape {
                shape: calls.dim(),
                n_variants: variants.len(),
                n_samples: samples.len(),
            });
        }

        let mut seen = HashSet::with_capacity(samples.len());
        for sample in &samples {
            if !seen.insert(sample) {
                return Err(Error::DuplicateSample {
                    sample: sample.clone(),
                });
            }
        }

        Ok(Self {
            variants,
            samples,
            calls,
        })
    }

    /// Build from one `Vec` of calls per variant
    pub fn from_rows(
        variants: Vec<Variant>,
        samples: Vec<String>,
        rows: Vec<Vec<GenotypeCall>>,
    ) -> Result<Self> {
        let shape = (rows.len(), samples.len());
        let calls: Vec<GenotypeCall> = rows.into_iter().flatten().collect();
        let calls = Array2::from_shape_vec(shape, calls).map_err(|_| Error::Shape {
            shape,
            n_variants: variants.len(),
            n_samples: samples.len(),
        })?;
        Self::new(variants, samples, calls)
    }

    pub fn nvariants(&self) -> usize {
        self.variants.len()
    }

    pub fn nsamples(&self) -> usize {
        self.samples.len()
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn variants_mut(&mut self) -> &mut [Variant] {
        &mut self.variants
    }

    pub fn variant(&self, idx: usize) -> &Variant {
        &self.variants[idx]
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn calls(&self) -> &Array2<GenotypeCall> {
        &self.calls
    }

    pub fn call(&self, variant_idx: usize, sample_idx: usize) -> &GenotypeCall {
        &self.calls[[variant_idx, sample_idx]]
    }

    /// All calls of a variant
    pub fn row(&self, idx: usize) -> ArrayView1<GenotypeCall> {
        self.calls.index_axis(Axis(0), idx)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Variant, ArrayView1<GenotypeCall>)> {
        self.variants.iter().zip(self.calls.axis_iter(Axis(0)))
    }

    pub fn into_parts(self) -> (Vec<Variant>, Vec<String>, Array2<GenotypeCall>) {
        (self.variants, self.samples, self.calls)
    }

    /// Keep the sample columns at `indexes`, in the given order
    pub fn select_columns(self, indexes: &[usize]) -> Self {
        let calls = self.calls.select(Axis(1), indexes);
        let samples = indexes.iter().map(|i| self.samples[*i].clone()).collect();

        Self {
            variants: self.variants,
            samples,
            calls,
        }
    }

    /// Keep the variants for which `predicate` holds. Rows are tested in parallel.
    pub fn filter_rows<F>(self, predicate: F) -> Self
    where
        F: Fn(&Variant, ArrayView1<GenotypeCall>) -> bool + Sync + Send,
    {
        let keep: Vec<usize> = (0..self.nvariants())
            .into_par_iter()
            .filter(|i| predicate(&self.variants[*i], self.row(*i)))
            .collect();

        if keep.len() == self.nvariants() {
            return self;
        }

        let calls = self.calls.select(Axis(0), &keep);
        let mut keep = keep.into_iter().peekable();
        let variants = self
            .variants
            .into_iter()
            .enumerate()
            .filter_map(|(i, variant)| match keep.peek() {
                Some(next) if *next == i => {
                    keep.next();
                    Some(variant)
                }
                _ => None,
            })
            .collect();

        Self {
            variants,
            samples: self.samples,
            calls,
        }
    }

    /// Mask low quality calls of every entry
    pub fn mask_genotypes(mut self) -> Self {
        self.calls.par_map_inplace(GenotypeCall::mask);
        self
    }

    /// Hash of the samples, the variant descriptions and every call.
    /// Statistics attached to the variants are left out.
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.samples.hash(&mut hasher);

        for variant in &self.variants {
            variant.locus.hash(&mut hasher);
            variant.alleles.hash(&mut hasher);
            variant.id.hash(&mut hasher);
            variant.was_split.hash(&mut hasher);
        }

        self.calls.dim().hash(&mut hasher);
        self.calls.iter().for_each(|call| call.hash(&mut hasher));

        format!("{:016x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::{Call, FilterStatus};
    use crate::variant::Locus;

    fn variant(pos: u64) -> Variant {
        Variant::new(Locus::new("chr1", pos), vec!["A".into(), "T".into()])
    }

    fn matrix() -> VariantMatrix {
        let samples = vec!["S1".to_string(), "S2".to_string(), "S3".to_string()];
        let variants = (1..=4).map(variant).collect();
        let rows = (0..4u16)
            .map(|i| {
                (0..3u16)
                    .map(|j| GenotypeCall::pass(Call::unphased(0, (i + j) % 2)))
                    .collect()
            })
            .collect();
        VariantMatrix::from_rows(variants, samples, rows).unwrap()
    }

    #[test]
    fn construction_checks() {
        let res = VariantMatrix::from_rows(vec![variant(1)], vec!["S1".into()], vec![]);
        assert!(matches!(res, Err(Error::Shape { .. })));

        let samples = vec!["S1".to_string(), "S1".to_string()];
        let rows = vec![vec![GenotypeCall::missing(), GenotypeCall::missing()]];
        let res = VariantMatrix::from_rows(vec![variant(1)], samples, rows);
        assert!(matches!(res, Err(Error::DuplicateSample { .. })));
    }

    #[test]
    fn select_columns() {
        let matrix = matrix().select_columns(&[2, 0]);
        assert_eq!(matrix.samples(), &["S3".to_string(), "S1".to_string()]);
        assert_eq!(matrix.calls().dim(), (4, 2));
        assert_eq!(matrix.call(1, 0).gt, Some(Call::unphased(0, 1)));
        assert_eq!(matrix.call(1, 1).gt, Some(Call::unphased(0, 1)));
        assert_eq!(matrix.call(0, 0).gt, Some(Call::unphased(0, 0)));
    }

    #[test]
    fn filter_rows_keeps_order() {
        let matrix = matrix().filter_rows(|v, _| v.pos() % 2 == 0);
        let positions: Vec<u64> = matrix.variants().iter().map(Variant::pos).collect();
        assert_eq!(positions, vec![2, 4]);
        assert_eq!(matrix.calls().dim(), (2, 3));
        assert_eq!(matrix.call(0, 0).gt, Some(Call::unphased(0, 1)));
        assert_eq!(matrix.call(1, 0).gt, Some(Call::unphased(0, 1)));
    }

    #[test]
    fn filter_rows_by_calls() {
        let matrix = matrix()
            .filter_rows(|_, row| row.iter().all(|c| c.gt != Some(Call::unphased(0, 0))));
        assert_eq!(matrix.nvariants(), 0);
        assert_eq!(matrix.nsamples(), 3);
    }

    #[test]
    fn mask_genotypes() {
        let samples = vec!["S1".to_string(), "S2".to_string()];
        let rows = vec![vec![
            GenotypeCall::new(Some(Call::unphased(1, 1)), FilterStatus::parse("LowGQ")),
            GenotypeCall::new(Some(Call::unphased(1, 1)), None),
        ]];
        let matrix = VariantMatrix::from_rows(vec![variant(1)], samples, rows)
            .unwrap()
            .mask_genotypes();
        assert_eq!(matrix.call(0, 0).gt, Some(Call::hom_ref()));
        assert_eq!(matrix.call(0, 1).gt, Some(Call::unphased(1, 1)));
    }

    #[test]
    fn fingerprint_follows_the_calls() {
        let original = matrix().fingerprint();
        assert_eq!(original, matrix().fingerprint());
        assert_eq!(original.len(), 16);

        let (mut variants, samples, mut calls) = matrix().into_parts();
        variants[0].info.an = 6;
        let with_stats =
            VariantMatrix::new(variants.clone(), samples.clone(), calls.clone()).unwrap();
        assert_eq!(with_stats.fingerprint(), original);

        calls[[3, 2]] = GenotypeCall::missing();
        let changed = VariantMatrix::new(variants, samples, calls).unwrap();
        assert_ne!(changed.fingerprint(), original);

        let reordered = matrix().select_columns(&[1, 0, 2]);
        assert_ne!(reordered.fingerprint(), original);
    }
}
