use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};

use cohortk_core::{
    checkpoint::DirCheckpointStore,
    export::{Exporter, VcfExporter},
    AncestryTable, ExecutionContext, MatrixFilterPipeline, PipelineReport, SampleList,
};

use crate::{args::FilterArgs, read_vcf::read_vcf_to_matrix};

pub fn read_samples(args: &FilterArgs) -> Result<SampleList> {
    let samples = match &args.samples_key {
        Some(key) => SampleList::read_keyed(&args.samples, key),
        None => SampleList::read(&args.samples),
    };
    samples.wrap_err(eyre!("Error reading samples from {:?}", args.samples))
}

pub fn read_ancestry(args: &FilterArgs) -> Result<Option<AncestryTable>> {
    let Some(path) = &args.ancestry_table else {
        return Ok(None);
    };

    let table = AncestryTable::read(path, &args.ancestry_id_column, &args.ancestry_label_column)
        .wrap_err(eyre!("Error reading ancestry predictions from {path:?}"))?;
    Ok(Some(table))
}

pub fn run(args: FilterArgs, threads: usize) -> Result<()> {
    let mut exporter = VcfExporter::new(args.output_prefix());
    let report = run_with_exporter(&args, threads, &mut exporter)?;

    tracing::info!(
        "Exported {} variants of {} samples to {:?}",
        report.stages.last().map_or(0, |c| c.nvariants),
        report.stages.last().map_or(0, |c| c.nsamples),
        exporter.path()
    );
    Ok(())
}

pub fn run_with_exporter(
    args: &FilterArgs,
    threads: usize,
    exporter: &mut dyn Exporter,
) -> Result<PipelineReport> {
    let ctx = ExecutionContext::new(threads)?;
    let config = args.pipeline_config();
    tracing::info!("Running with {} threads: {config:?}", ctx.threads());

    let samples = read_samples(args)?;
    let ancestry = read_ancestry(args)?;
    let matrix = read_vcf_to_matrix(&args.file)?;

    let store = args
        .checkpoint_dir
        .as_ref()
        .map(DirCheckpointStore::new)
        .transpose()?;

    let mut pipeline = MatrixFilterPipeline::new(config, &ctx).resume(args.resume);
    if let Some(store) = &store {
        pipeline = pipeline.with_checkpoints(store);
    }

    let report = pipeline.run(matrix, &samples, ancestry.as_ref(), exporter)?;

    if let Some(name) = report.resumed_from {
        tracing::info!("Resumed from checkpoint {name}");
    }
    Ok(report)
}
