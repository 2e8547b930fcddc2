use std::path::PathBuf;

use cohortk_core::{PipelineConfig, Scope};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct FilterArgs {
    /// Input VCF or BCF
    pub file: PathBuf,

    /// Samples of the cohort (one ID per row, first column)
    #[cfg_attr(feature = "clap", arg(short = 'S', long))]
    pub samples: PathBuf,

    /// Read the sample IDs from this column of a tab-delimited file with a header
    #[cfg_attr(feature = "clap", arg(long))]
    pub samples_key: Option<String>,

    /// Tab-delimited ancestry predictions with a header
    #[cfg_attr(feature = "clap", arg(short = 'A', long))]
    pub ancestry_table: Option<PathBuf>,

    #[cfg_attr(feature = "clap", arg(long, default_value = "research_id"))]
    pub ancestry_id_column: String,

    #[cfg_attr(feature = "clap", arg(long, default_value = "ancestry_pred"))]
    pub ancestry_label_column: String,

    /// Keep samples of this predicted ancestry, ALL keeps every listed sample
    #[cfg_attr(feature = "clap", arg(short = 'a', long, default_value = "ALL"))]
    pub ancestry: String,

    /// Keep variants on this contig, ALL keeps every contig
    #[cfg_attr(feature = "clap", arg(short = 'c', long = "chr", default_value = "ALL"))]
    pub contig: String,

    /// Minimum minor allele count of an exported variant
    #[cfg_attr(feature = "clap", arg(short = 'm', long, default_value_t = 0))]
    pub min_ac: u64,

    /// Output directory
    #[cfg_attr(feature = "clap", arg(short = 'o', long = "outdir", default_value_os_t = PathBuf::from("./"), value_hint = clap::ValueHint::DirPath))]
    pub output: PathBuf,

    /// Output filename prefix
    #[cfg_attr(feature = "clap", arg(short = 'p', long, default_value = "cohort"))]
    pub prefix: String,

    /// Write intermediate matrices to this directory
    #[cfg_attr(feature = "clap", arg(long))]
    pub checkpoint_dir: Option<PathBuf>,

    /// Continue from the latest checkpoint made with the same settings
    #[cfg_attr(feature = "clap", arg(long, requires = "checkpoint_dir"))]
    pub resume: bool,

    /// Drop variants produced by splitting multiallelic sites
    #[cfg_attr(feature = "clap", arg(long))]
    pub drop_split_multiallelics: bool,

    /// Drop variants where no sample has a called genotype
    #[cfg_attr(feature = "clap", arg(long))]
    pub drop_all_missing: bool,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            samples: PathBuf::new(),
            samples_key: None,
            ancestry_table: None,
            ancestry_id_column: String::from("research_id"),
            ancestry_label_column: String::from("ancestry_pred"),
            ancestry: String::from("ALL"),
            contig: String::from("ALL"),
            min_ac: 0,
            output: PathBuf::from("./"),
            prefix: String::from("cohort"),
            checkpoint_dir: None,
            resume: false,
            drop_split_multiallelics: false,
            drop_all_missing: false,
        }
    }
}

impl FilterArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            contig: Scope::new(Some(&self.contig)),
            ancestry: Scope::new(Some(&self.ancestry)),
            min_ac: self.min_ac,
            drop_split_multiallelics: self.drop_split_multiallelics,
            drop_all_missing: self.drop_all_missing,
        }
    }

    /// `{outdir}/{prefix}`, the exporter appends the extension
    pub fn output_prefix(&self) -> PathBuf {
        self.output.join(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_args() {
        let args = FilterArgs {
            contig: "chr1".into(),
            ancestry: "all".into(),
            min_ac: 2,
            ..Default::default()
        };
        let config = args.pipeline_config();
        assert_eq!(config.contig, Scope::Only("chr1".into()));
        assert_eq!(config.ancestry, Scope::All);
        assert_eq!(config.min_ac, 2);
        assert_eq!(args.output_prefix(), PathBuf::from("./cohort"));
    }
}
