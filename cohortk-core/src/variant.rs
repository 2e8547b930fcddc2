use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locus {
    pub contig: String,
    pub pos: u64,
}

impl Locus {
    pub fn new(contig: impl Into<String>, pos: u64) -> Self {
        Self {
            contig: contig.into(),
            pos,
        }
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.contig, self.pos)
    }
}

/// Per-allele call statistics over the current set of samples.
///
/// `ac` and `af` hold one value per alternate allele. `af` is empty when no
/// genotype was called.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub ac: Vec<u64>,
    pub af: Vec<f64>,
    pub an: u64,
    pub n_hom_ref: u64,
    pub n_het: u64,
    pub n_hom_var: u64,
    pub p_value_hwe: Option<f64>,
    pub p_value_excess_het: Option<f64>,
}

impl CallStats {
    pub fn n_called(&self) -> u64 {
        self.n_hom_ref + self.n_het + self.n_hom_var
    }

    /// Smallest alternate allele count
    pub fn minor_ac(&self) -> Option<u64> {
        self.ac.iter().min().copied()
    }

    /// Smallest alternate allele frequency
    pub fn minor_af(&self) -> Option<f64> {
        self.af.iter().copied().reduce(f64::min)
    }

    pub fn summary(&self) -> AlleleSummary {
        AlleleSummary {
            af: self.minor_af(),
            ac: self.minor_ac(),
            an: self.an,
            p_value_hwe: self.p_value_hwe,
            p_value_excess_het: self.p_value_excess_het,
        }
    }
}

/// Minor allele summary of [`CallStats`], the form written to INFO
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlleleSummary {
    pub af: Option<f64>,
    pub ac: Option<u64>,
    pub an: u64,
    pub p_value_hwe: Option<f64>,
    pub p_value_excess_het: Option<f64>,
}

/// INFO after the final recomputation: the frozen totals (ALL_*) next to the cohort values
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedInfo {
    pub total: AlleleSummary,
    pub cohort: AlleleSummary,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub locus: Locus,
    /// REF first, then the alternates
    pub alleles: Vec<String>,
    pub id: Option<String>,
    /// The row was produced by splitting a multiallelic site
    pub was_split: bool,
    /// Working statistics, overwritten by every aggregation
    pub info: CallStats,
    total: Option<AlleleSummary>,
    merged: Option<MergedInfo>,
}

impl Variant {
    pub fn new(locus: Locus, alleles: Vec<String>) -> Self {
        Self {
            locus,
            alleles,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn split(mut self, was_split: bool) -> Self {
        self.was_split = was_split;
        self
    }

    pub fn contig(&self) -> &str {
        &self.locus.contig
    }

    pub fn pos(&self) -> u64 {
        self.locus.pos
    }

    pub fn reference(&self) -> &str {
        self.alleles.first().map_or(".", String::as_str)
    }

    pub fn alts(&self) -> &[String] {
        self.alleles.get(1..).unwrap_or_default()
    }

    pub fn n_alleles(&self) -> usize {
        self.alleles.len()
    }

    /// Statistics of the whole post-filter cohort, frozen before the call rate filter
    pub fn total(&self) -> Option<&AlleleSummary> {
        self.total.as_ref()
    }

    /// Store the total statistics. They can be set exactly once.
    pub fn freeze_total(&mut self, total: AlleleSummary) -> Result<()> {
        if self.total.is_some() {
            return Err(Error::TotalAlreadyFrozen {
                locus: self.locus.to_string(),
            });
        }
        self.total = Some(total);
        Ok(())
    }

    pub fn merged(&self) -> Option<&MergedInfo> {
        self.merged.as_ref()
    }

    /// Copy the frozen totals next to the summary of the current working statistics
    pub fn merge_info(&mut self) -> Result<&MergedInfo> {
        let total = self.total.ok_or_else(|| Error::TotalMissing {
            locus: self.locus.to_string(),
        })?;

        Ok(&*self.merged.insert(MergedInfo {
            total,
            cohort: self.info.summary(),
        }))
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.locus.contig,
            self.locus.pos,
            self.reference(),
            self.alts().join(",")
        )
    }
}
