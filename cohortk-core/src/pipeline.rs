use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointName, CheckpointStore, Snapshot};
use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::filters::VariantFilterChain;
use crate::matrix::VariantMatrix;
use crate::samples::{AncestryTable, SampleList, SampleSelector, Scope};
use crate::stats;
use crate::variant::CallStats;

/// Fraction of the cohort that must be called at a variant
pub const CALL_RATE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resume,
    SelectSamples,
    FilterContig,
    DropSplitMultiallelics,
    DropAllMissing,
    Checkpoint(CheckpointName),
    MaskGenotypes,
    FreezeTotals,
    OverwriteInfo,
    FilterCallRate,
    RecomputeInfo,
    MergeInfo,
    VariantFilters,
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Resume => write!(f, "resume"),
            Self::SelectSamples => write!(f, "select-samples"),
            Self::FilterContig => write!(f, "filter-contig"),
            Self::DropSplitMultiallelics => write!(f, "drop-split-multiallelics"),
            Self::DropAllMissing => write!(f, "drop-all-missing"),
            Self::Checkpoint(name) => write!(f, "checkpoint-{name}"),
            Self::MaskGenotypes => write!(f, "mask-genotypes"),
            Self::FreezeTotals => write!(f, "freeze-totals"),
            Self::OverwriteInfo => write!(f, "overwrite-info"),
            Self::FilterCallRate => write!(f, "filter-call-rate"),
            Self::RecomputeInfo => write!(f, "recompute-info"),
            Self::MergeInfo => write!(f, "merge-info"),
            Self::VariantFilters => write!(f, "variant-filters"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// Everything that changes what the pipeline produces. Checkpoints record it and
/// a resumed run only reuses checkpoints with an equal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub contig: Scope,
    pub ancestry: Scope,
    pub min_ac: u64,
    pub drop_split_multiallelics: bool,
    pub drop_all_missing: bool,
}

/// Thread pool the data parallel stages run in
#[derive(Debug)]
pub struct ExecutionContext {
    pool: rayon::ThreadPool,
}

impl ExecutionContext {
    /// `threads = 0` lets rayon pick the number of threads
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

/// Matrix dimensions after a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCounts {
    pub stage: Stage,
    pub nvariants: usize,
    pub nsamples: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageCounts>,
    pub resumed_from: Option<CheckpointName>,
}

impl PipelineReport {
    pub fn counts(&self, stage: Stage) -> Option<&StageCounts> {
        self.stages.iter().find(|c| c.stage == stage)
    }

    fn record(&mut self, stage: Stage, matrix: &VariantMatrix) {
        self.stages.push(StageCounts {
            stage,
            nvariants: matrix.nvariants(),
            nsamples: matrix.nsamples(),
        });
    }
}

pub struct MatrixFilterPipeline<'a> {
    config: PipelineConfig,
    ctx: &'a ExecutionContext,
    checkpoints: Option<&'a dyn CheckpointStore>,
    resume: bool,
}

impl<'a> MatrixFilterPipeline<'a> {
    pub fn new(config: PipelineConfig, ctx: &'a ExecutionContext) -> Self {
        Self {
            config,
            ctx,
            checkpoints: None,
            resume: false,
        }
    }

    pub fn with_checkpoints(mut self, store: &'a dyn CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Continue from the latest usable checkpoint instead of the input matrix
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and hand the result to `exporter`
    pub fn run(
        &self,
        matrix: VariantMatrix,
        samples: &SampleList,
        ancestry: Option<&AncestryTable>,
        exporter: &mut dyn Exporter,
    ) -> Result<PipelineReport> {
        let (matrix, mut report) = self.ctx.install(|| self.process(matrix, samples, ancestry))?;

        let now = Instant::now();
        exporter
            .export(&matrix)
            .map_err(|e| e.in_stage(Stage::Export))?;
        tracing::info!("{}: wrote {} variants in {:?}", Stage::Export, matrix.nvariants(), now.elapsed());
        report.record(Stage::Export, &matrix);

        Ok(report)
    }

    /// Run every stage up to and including the last checkpoint, returning the final matrix
    pub fn process(
        &self,
        matrix: VariantMatrix,
        samples: &SampleList,
        ancestry: Option<&AncestryTable>,
    ) -> Result<(VariantMatrix, PipelineReport)> {
        let selector = SampleSelector::new(samples, ancestry, &self.config.ancestry);
        let mut report = PipelineReport::default();

        let input = match self.checkpoints {
            Some(_) => matrix.fingerprint(),
            None => String::new(),
        };

        let resumed = if self.resume {
            self.latest_checkpoint(&matrix, &input, &selector)
                .map_err(|e| e.in_stage(Stage::Resume))?
        } else {
            None
        };

        let (mut matrix, start) = match resumed {
            Some(snapshot) => {
                report.resumed_from = Some(snapshot.name);
                report.record(Stage::Resume, &snapshot.matrix);
                (snapshot.matrix, Some(snapshot.name))
            }
            None => (matrix, None),
        };

        if start.is_none() {
            matrix = self.initial_filters(matrix, &selector, &mut report)?;
            self.checkpoint(CheckpointName::Filtered, &input, &matrix, &mut report)?;
        }

        if start < Some(CheckpointName::QcStats) {
            matrix = self.qc_stats(matrix, &mut report)?;
            self.checkpoint(CheckpointName::QcStats, &input, &matrix, &mut report)?;
        }

        if start < Some(CheckpointName::SecondFilter) {
            matrix = self.second_filter(matrix, &mut report)?;
            self.checkpoint(CheckpointName::SecondFilter, &input, &matrix, &mut report)?;
        }

        Ok((matrix, report))
    }

    fn initial_filters(
        &self,
        matrix: VariantMatrix,
        selector: &SampleSelector,
        report: &mut PipelineReport,
    ) -> Result<VariantMatrix> {
        let config = &self.config;
        let mut matrix = run_stage(Stage::SelectSamples, matrix, report, |m| selector.apply(m))?;

        if let Scope::Only(contig) = &config.contig {
            matrix = run_stage(Stage::FilterContig, matrix, report, |m| {
                Ok(m.filter_rows(|v, _| v.contig() == contig.as_str()))
            })?;
        }

        if config.drop_split_multiallelics {
            matrix = run_stage(Stage::DropSplitMultiallelics, matrix, report, |m| {
                Ok(m.filter_rows(|v, _| !v.was_split))
            })?;
        }

        if config.drop_all_missing {
            matrix = run_stage(Stage::DropAllMissing, matrix, report, |m| {
                Ok(m.filter_rows(|_, calls| calls.iter().any(|c| !c.is_missing())))
            })?;
        }

        Ok(matrix)
    }

    fn qc_stats(&self, matrix: VariantMatrix, report: &mut PipelineReport) -> Result<VariantMatrix> {
        let matrix = run_stage(Stage::MaskGenotypes, matrix, report, |m| Ok(m.mask_genotypes()))?;

        let mut totals = Vec::new();
        let matrix = run_stage(Stage::FreezeTotals, matrix, report, |mut m| {
            totals = stats::aggregate(&m)?;
            for (variant, stats) in m.variants_mut().iter_mut().zip(&totals) {
                variant.freeze_total(stats.summary())?;
            }
            Ok(m)
        })?;

        run_stage(Stage::OverwriteInfo, matrix, report, |m| Ok(overwrite_info(m, totals)))
    }

    fn second_filter(&self, matrix: VariantMatrix, report: &mut PipelineReport) -> Result<VariantMatrix> {
        let min_an = CALL_RATE * 2.0 * matrix.nsamples() as f64;
        tracing::debug!("Call rate filter requires AN >= {min_an}");

        let matrix = run_stage(Stage::FilterCallRate, matrix, report, |m| {
            Ok(m.filter_rows(|v, _| v.info.an as f64 >= min_an))
        })?;

        let matrix = run_stage(Stage::RecomputeInfo, matrix, report, |m| {
            let stats = stats::aggregate(&m)?;
            Ok(overwrite_info(m, stats))
        })?;

        let matrix = run_stage(Stage::MergeInfo, matrix, report, |mut m| {
            for variant in m.variants_mut() {
                variant.merge_info()?;
            }
            Ok(m)
        })?;

        let chain = VariantFilterChain::new(self.config.min_ac);
        run_stage(Stage::VariantFilters, matrix, report, |m| chain.apply(m))
    }

    fn checkpoint(
        &self,
        name: CheckpointName,
        input: &str,
        matrix: &VariantMatrix,
        report: &mut PipelineReport,
    ) -> Result<()> {
        let Some(store) = self.checkpoints else {
            return Ok(());
        };

        let stage = Stage::Checkpoint(name);
        store
            .write(name, &self.config, input, matrix)
            .map_err(|e| e.in_stage(stage))?;
        report.record(stage, matrix);
        Ok(())
    }

    /// The latest checkpoint made from the same input with this configuration over the same samples
    fn latest_checkpoint(
        &self,
        matrix: &VariantMatrix,
        input: &str,
        selector: &SampleSelector,
    ) -> Result<Option<Snapshot>> {
        let Some(store) = self.checkpoints else {
            tracing::warn!("Resume requested without a checkpoint store, running all stages");
            return Ok(None);
        };

        let selected: Vec<&String> = selector
            .column_indexes(matrix.samples())?
            .into_iter()
            .map(|i| &matrix.samples()[i])
            .collect();

        for name in CheckpointName::ALL.into_iter().rev() {
            let Some(snapshot) = store.read(name)? else {
                continue;
            };

            if snapshot.input != input {
                tracing::warn!("Checkpoint {name} was made from a different input matrix, skipping it");
                continue;
            }

            if snapshot.config != self.config {
                tracing::warn!("Checkpoint {name} was made with a different configuration, skipping it");
                continue;
            }

            if !snapshot.matrix.samples().iter().eq(selected.iter().copied()) {
                tracing::warn!("Checkpoint {name} was made over different samples, skipping it");
                continue;
            }

            tracing::info!("Resuming from checkpoint {name}");
            return Ok(Some(snapshot));
        }

        Ok(None)
    }
}

fn run_stage<F>(stage: Stage, matrix: VariantMatrix, report: &mut PipelineReport, f: F) -> Result<VariantMatrix>
where
    F: FnOnce(VariantMatrix) -> Result<VariantMatrix>,
{
    let now = Instant::now();
    let before = (matrix.nvariants(), matrix.nsamples());

    let matrix = f(matrix).map_err(|e: Error| e.in_stage(stage))?;

    tracing::info!(
        "{stage}: {} -> {} variants, {} -> {} samples in {:?}",
        before.0,
        matrix.nvariants(),
        before.1,
        matrix.nsamples(),
        now.elapsed()
    );
    report.record(stage, &matrix);

    Ok(matrix)
}

fn overwrite_info(mut matrix: VariantMatrix, stats: Vec<CallStats>) -> VariantMatrix {
    for (variant, info) in matrix.variants_mut().iter_mut().zip(stats) {
        variant.info = info;
    }
    matrix
}
