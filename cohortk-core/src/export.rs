use std::path::{Path, PathBuf};

use itertools::Itertools;
use ndarray::ArrayView1;

use crate::error::{Error, Result};
use crate::genotype::GenotypeCall;
use crate::io::{append_ext, commit, get_bgzf_writer, get_output, get_vcf_writer, partial_path};
use crate::matrix::VariantMatrix;
use crate::variant::{AlleleSummary, Variant};

/// Final destination of the filtered matrix
pub trait Exporter {
    fn export(&mut self, matrix: &VariantMatrix) -> Result<()>;
}

/// Writes `{prefix}.vcf.bgz`. Nothing is left at the final path if the export fails.
#[derive(Debug, Clone)]
pub struct VcfExporter {
    path: PathBuf,
}

impl VcfExporter {
    pub fn new(prefix: impl AsRef<Path>) -> Self {
        Self {
            path: append_ext("vcf.bgz", prefix.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Exporter for VcfExporter {
    fn export(&mut self, matrix: &VariantMatrix) -> Result<()> {
        let now = std::time::Instant::now();
        let partial = partial_path(&self.path);

        let result = write_vcf(&partial, matrix);
        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        }
        result?;
        commit(&partial, &self.path)?;

        tracing::info!("Wrote {:?} in {:?}", self.path, now.elapsed());
        Ok(())
    }
}

fn write_vcf(path: &Path, matrix: &VariantMatrix) -> Result<()> {
    let write_error = |e: csv::Error| Error::io(path, e.into());

    let mut output = get_output(path)?;
    let mut wrtr = get_vcf_writer(get_bgzf_writer(&mut output));

    let contigs = matrix.variants().iter().map(Variant::contig).unique().collect_vec();
    for line in header(matrix.samples(), &contigs) {
        wrtr.write_record([line]).map_err(write_error)?;
    }

    for (variant, calls) in matrix.rows() {
        let row = VcfRow::new(variant, calls)?;
        wrtr.write_record(Into::<Vec<String>>::into(row)).map_err(write_error)?;
    }

    let writer = wrtr.into_inner().map_err(|e| Error::io(path, e.into_error()))?;
    writer.close().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// One data line of the exported VCF
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRow {
    pub seqid: String,
    pub pos: u64,
    pub varid: String,
    pub reference: String,
    pub alt: String,
    pub quality: String,
    pub filter: String,
    pub info: String,
    pub format: String,
    pub samples: Vec<String>,
}

impl VcfRow {
    pub fn new(variant: &Variant, calls: ArrayView1<GenotypeCall>) -> Result<Self> {
        let merged = variant.merged().ok_or_else(|| Error::MergedMissing {
            locus: variant.locus.to_string(),
        })?;

        let info = [
            info_fields("", &merged.cohort),
            info_fields("ALL_", &merged.total),
        ]
        .concat()
        .join(";");

        let alt = match variant.alts() {
            [] => String::from("."),
            alts => alts.join(","),
        };

        Ok(Self {
            seqid: variant.contig().to_string(),
            pos: variant.pos(),
            varid: variant.id.clone().unwrap_or_else(|| String::from(".")),
            reference: variant.reference().to_string(),
            alt,
            quality: String::from("."),
            filter: String::from("PASS"),
            info,
            format: String::from("GT:FT"),
            samples: calls.iter().map(GenotypeCall::to_vcf_field).collect(),
        })
    }
}

impl From<VcfRow> for Vec<String> {
    fn from(row: VcfRow) -> Vec<String> {
        let mut record = vec![
            row.seqid,
            row.pos.to_string(),
            row.varid,
            row.reference,
            row.alt,
            row.quality,
            row.filter,
            row.info,
            row.format,
        ];
        record.extend(row.samples);
        record
    }
}

fn info_fields(prefix: &str, summary: &AlleleSummary) -> Vec<String> {
    vec![
        format!("{prefix}AF={}", or_dot(summary.af)),
        format!("{prefix}AC={}", or_dot(summary.ac)),
        format!("{prefix}AN={}", summary.an),
        format!("{prefix}p_value_hwe={}", or_dot(summary.p_value_hwe)),
        format!("{prefix}p_value_excess_het={}", or_dot(summary.p_value_excess_het)),
    ]
}

fn or_dot<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| String::from("."), |v| v.to_string())
}

const INFO_FIELDS: [(&str, &str, &str); 5] = [
    ("AF", "Float", "Minor alternate allele frequency"),
    ("AC", "Integer", "Minor alternate allele count"),
    ("AN", "Integer", "Total number of alleles in called genotypes"),
    ("p_value_hwe", "Float", "Hardy-Weinberg equilibrium mid-p value"),
    ("p_value_excess_het", "Float", "Excess heterozygosity mid-p value"),
];

pub fn header<S: AsRef<str>, T: AsRef<str>>(sample_names: &[S], contigs: &[T]) -> Vec<String> {
    let time = chrono::offset::Utc::now();
    let mut header = vec![];

    header.push("##fileformat=VCFv4.2".into());
    header.push(format!("##fileDate={}", time.format("%Y%m%d")));
    header.push(format!("##source=COHORTK v{}", env!("CARGO_PKG_VERSION")));
    header.push("##FILTER=<ID=PASS,Description=\"All filters passed\">".into());

    for (id, kind, description) in INFO_FIELDS {
        header.push(format!(
            "##INFO=<ID={id},Number=1,Type={kind},Description=\"{description}\">"
        ));
    }
    for (id, kind, description) in INFO_FIELDS {
        header.push(format!(
            "##INFO=<ID=ALL_{id},Number=1,Type={kind},Description=\"{description} before the call rate filter\">"
        ));
    }

    header.push("##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">".into());
    header.push("##FORMAT=<ID=FT,Number=1,Type=String,Description=\"Genotype filter\">".into());
    for contig in contigs {
        header.push(format!("##contig=<ID={}>", contig.as_ref()));
    }

    let mut columns = vec!["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT"];
    columns.extend(sample_names.iter().map(|s| s.as_ref()));
    header.push(columns.join("\t"));

    header
}

#[cfg(test)]
mod tests {
    use std::io::BufRead;

    use super::*;
    use crate::genotype::{Call, FilterStatus};
    use crate::variant::{CallStats, Locus};

    fn merged_variant() -> Variant {
        let mut variant =
            Variant::new(Locus::new("chr1", 100), vec!["A".into(), "C".into()]).with_id("rs7");
        variant
            .freeze_total(AlleleSummary {
                af: Some(0.25),
                ac: Some(2),
                an: 8,
                p_value_hwe: Some(0.5),
                p_value_excess_het: None,
            })
            .unwrap();
        variant.info = CallStats {
            ac: vec![1],
            af: vec![0.125],
            an: 8,
            n_hom_ref: 3,
            n_het: 1,
            ..Default::default()
        };
        variant.merge_info().unwrap();
        variant
    }

    fn matrix() -> VariantMatrix {
        repeated_matrix(1)
    }

    fn repeated_matrix(nrows: usize) -> VariantMatrix {
        let row = vec![
            GenotypeCall::pass(Call::unphased(0, 1)),
            GenotypeCall::new(Some(Call::hom_ref()), Some(FilterStatus::Fail("LowGQ".into()))),
        ];
        VariantMatrix::from_rows(
            vec![merged_variant(); nrows],
            vec!["S1".into(), "S2".into()],
            vec![row; nrows],
        )
        .unwrap()
    }

    #[test]
    fn row_fields() {
        let matrix = matrix();
        let row = VcfRow::new(matrix.variant(0), matrix.row(0)).unwrap();
        assert_eq!(row.varid, "rs7");
        assert_eq!(row.info, "AF=0.125;AC=1;AN=8;p_value_hwe=.;p_value_excess_het=.;ALL_AF=0.25;ALL_AC=2;ALL_AN=8;ALL_p_value_hwe=0.5;ALL_p_value_excess_het=.");
        assert_eq!(row.samples, vec!["0/1:PASS", "0/0:LowGQ"]);
    }

    #[test]
    fn unmerged_variant_is_an_error() {
        let variant = Variant::new(Locus::new("chr1", 1), vec!["A".into(), "C".into()]);
        let calls = ndarray::Array1::from(vec![GenotypeCall::missing()]);
        assert!(matches!(VcfRow::new(&variant, calls.view()), Err(Error::MergedMissing { .. })));
    }

    #[test]
    fn header_columns() {
        let header = header(&["S1", "S2"], &["chr1", "chr2"]);
        assert_eq!(header[0], "##fileformat=VCFv4.2");
        assert!(header.contains(&"##contig=<ID=chr2>".to_string()));
        assert!(header.iter().any(|l| l.starts_with("##INFO=<ID=ALL_p_value_excess_het,")));
        assert_eq!(
            header.last().unwrap(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2"
        );
    }

    #[test]
    fn export_to_bgzip() {
        std::fs::create_dir_all("tests/results").unwrap();
        let mut exporter = VcfExporter::new("tests/results/export_unit");
        exporter.export(&matrix()).unwrap();
        assert_eq!(exporter.path(), Path::new("tests/results/export_unit.vcf.bgz"));
        assert!(!partial_path(exporter.path()).exists());

        let file = std::fs::File::open(exporter.path()).unwrap();
        let reader = std::io::BufReader::new(bgzip::BGZFReader::new(file).unwrap());
        let lines: Vec<String> = reader
            .lines()
            .map(|l| l.unwrap())
            .filter(|l| !l.starts_with("##"))
            .map(|l| l.replace('\t', " "))
            .collect();

        insta::assert_snapshot!(lines.join("\n"), @r###"
        #CHROM POS ID REF ALT QUAL FILTER INFO FORMAT S1 S2
        chr1 100 rs7 A C . PASS AF=0.125;AC=1;AN=8;p_value_hwe=.;p_value_excess_het=.;ALL_AF=0.25;ALL_AC=2;ALL_AN=8;ALL_p_value_hwe=0.5;ALL_p_value_excess_het=. GT:FT 0/1:PASS 0/0:LowGQ
        "###);
    }

    #[test]
    fn failed_export_leaves_nothing() {
        let variant = Variant::new(Locus::new("chr1", 1), vec!["A".into(), "C".into()]);
        let rows = vec![vec![GenotypeCall::missing()]];
        let matrix = VariantMatrix::from_rows(vec![variant], vec!["S1".into()], rows).unwrap();

        std::fs::create_dir_all("tests/results").unwrap();
        let mut exporter = VcfExporter::new("tests/results/export_failed");
        let _ = std::fs::remove_file(exporter.path());

        assert!(exporter.export(&matrix).is_err());
        assert!(!exporter.path().exists());
        assert!(!partial_path(exporter.path()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn full_disk_is_a_resource_error() {
        std::fs::create_dir_all("tests/results").unwrap();

        // one row fails when the writer is closed, many rows fail mid-write
        for nrows in [1, 1000] {
            let mut exporter = VcfExporter::new(format!("tests/results/export_full_{nrows}"));
            let partial = partial_path(exporter.path());
            let _ = std::fs::remove_file(exporter.path());
            let _ = std::fs::remove_file(&partial);
            std::os::unix::fs::symlink("/dev/full", &partial).unwrap();

            let err = exporter.export(&repeated_matrix(nrows)).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Resource);
            assert!(matches!(err, Error::Io { .. }));
            assert!(!exporter.path().exists());
            assert!(std::fs::symlink_metadata(&partial).is_err());
        }
    }
}
