use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::{get_input, get_tsv_reader};
use crate::matrix::VariantMatrix;

/// Sentinel meaning no restriction, compared case-insensitively
pub const ALL: &str = "ALL";

/// A requested contig or ancestry. `ALL` in any case, an empty value or no value at all
/// select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,
    Only(String),
}

impl Scope {
    pub fn new(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(v) if v.eq_ignore_ascii_case(ALL) => Self::All,
            Some(v) => Self::Only(v.to_string()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(v) => v == value,
        }
    }
}

impl FromStr for Scope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(Some(s)))
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "{ALL}"),
            Self::Only(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered, deduplicated list of wanted sample ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleList {
    ids: IndexSet<String>,
}

impl SampleList {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Headerless file, the id is the first tab-delimited field of each row
    pub fn read(path: &Path) -> Result<Self> {
        let mut rdr = get_tsv_reader(get_input(path)?, false);

        let mut ids = IndexSet::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(id) = record.get(0).map(str::trim).filter(|id| !id.is_empty()) {
                if !ids.insert(id.to_string()) {
                    tracing::debug!("Sample {id} is listed more than once in {path:?}");
                }
            }
        }

        tracing::info!("Read {} sample ids from {path:?}.", ids.len());
        Ok(Self { ids })
    }

    /// Tab-delimited file with a header, ids are read from `key_column`
    pub fn read_keyed(path: &Path, key_column: &str) -> Result<Self> {
        let mut rdr = get_tsv_reader(get_input(path)?, true);
        let key = column_index(rdr.headers()?, key_column, path)?;

        let mut ids = IndexSet::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(id) = record.get(key).map(str::trim).filter(|id| !id.is_empty()) {
                ids.insert(id.to_string());
            }
        }

        tracing::info!("Read {} sample ids from column {key_column} of {path:?}.", ids.len());
        Ok(Self { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }
}

/// Predicted ancestry label per sample id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestryTable {
    labels: IndexMap<String, String>,
}

impl AncestryTable {
    pub fn from_pairs<I, S, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut table = Self::default();
        for (id, label) in pairs {
            table.insert(id.into(), label.into(), Path::new(""))?;
        }
        Ok(table)
    }

    /// Tab-delimited file with a header naming `id_column` and `label_column`
    pub fn read(path: &Path, id_column: &str, label_column: &str) -> Result<Self> {
        let mut rdr = get_tsv_reader(get_input(path)?, true);
        let headers = rdr.headers()?.clone();
        let id_idx = column_index(&headers, id_column, path)?;
        let label_idx = column_index(&headers, label_column, path)?;

        let mut table = Self::default();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);

            let (Some(id), Some(label)) = (record.get(id_idx), record.get(label_idx)) else {
                return Err(Error::MalformedTable {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("expected columns {id_column} and {label_column}"),
                });
            };
            table.insert(id.trim().to_string(), label.trim().to_string(), path)?;
        }

        tracing::info!("Read ancestry predictions for {} samples from {path:?}.", table.len());
        for (label, count) in table.counts() {
            tracing::debug!("Ancestry {label}: {count} samples");
        }

        Ok(table)
    }

    fn insert(&mut self, id: String, label: String, path: &Path) -> Result<()> {
        if self.labels.contains_key(&id) {
            return Err(Error::DuplicateAssignment {
                sample: id,
                path: path.to_path_buf(),
            });
        }
        self.labels.insert(id, label);
        Ok(())
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of samples per label, in order of first appearance
    pub fn counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for label in self.labels.values() {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

fn column_index(headers: &csv::StringRecord, column: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| Error::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

/// Resolves which matrix columns belong to the cohort
#[derive(Debug, Clone, Copy)]
pub struct SampleSelector<'a> {
    samples: &'a SampleList,
    ancestry: Option<&'a AncestryTable>,
    scope: &'a Scope,
}

impl<'a> SampleSelector<'a> {
    pub fn new(samples: &'a SampleList, ancestry: Option<&'a AncestryTable>, scope: &'a Scope) -> Self {
        Self {
            samples,
            ancestry,
            scope,
        }
    }

    /// The listed samples, or their inner join with the ancestry table restricted to
    /// the wanted ancestry. Samples without a prediction are dropped.
    pub fn selection(&self) -> Result<IndexSet<&'a str>> {
        let samples = self.samples;

        let Scope::Only(ancestry) = self.scope else {
            return Ok(samples.iter().map(String::as_str).collect());
        };

        let table = self.ancestry.ok_or_else(|| Error::MissingAncestryTable {
            ancestry: ancestry.clone(),
        })?;

        let unmatched = samples.iter().filter(|id| table.label(id).is_none()).count();
        if unmatched > 0 {
            tracing::debug!("{unmatched} listed samples have no ancestry prediction");
        }

        let selection: IndexSet<&str> = samples
            .iter()
            .filter(|id| table.label(id) == Some(ancestry.as_str()))
            .map(String::as_str)
            .collect();

        tracing::info!(
            "{} of {} listed samples have ancestry {ancestry}.",
            selection.len(),
            samples.len()
        );
        Ok(selection)
    }

    /// Indexes of the selected columns, in matrix order
    pub fn column_indexes(&self, matrix_samples: &[String]) -> Result<Vec<usize>> {
        let selection = self.selection()?;

        let in_matrix: HashSet<&str> = matrix_samples.iter().map(String::as_str).collect();
        for id in selection.iter().filter(|id| !in_matrix.contains(*id)) {
            tracing::warn!("Wanted sample {id} is not in the matrix");
        }

        Ok(matrix_samples
            .iter()
            .enumerate()
            .filter(|(_, s)| selection.contains(s.as_str()))
            .map(|(i, _)| i)
            .collect())
    }

    pub fn apply(&self, matrix: VariantMatrix) -> Result<VariantMatrix> {
        let indexes = self.column_indexes(matrix.samples())?;
        Ok(matrix.select_columns(&indexes))
    }
}
