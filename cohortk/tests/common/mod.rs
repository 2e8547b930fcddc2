#![allow(dead_code)]
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use cohortk::args::FilterArgs;

pub const OUTDIR: &str = "tests/results";

pub const SAMPLES: [&str; 6] = ["S1", "S2", "S3", "S4", "S5", "S6"];

pub const HEADER: &str = "##fileformat=VCFv4.2
##contig=<ID=chr1,length=10000>
##contig=<ID=chr2,length=10000>
##INFO=<ID=was_split,Number=0,Type=Flag,Description=\"Split from a multiallelic site\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=FT,Number=1,Type=String,Description=\"Genotype filter\">";

pub const RECORDS: [&str; 6] = [
    "chr1\t100\trs1\tA\tG\t.\tPASS\t.\tGT:FT\t0/1:PASS\t0/1:PASS\t0/0:PASS\t0/0:PASS\t1/1:PASS\t0/0:PASS",
    "chr1\t200\t.\tC\tT\t.\tPASS\t.\tGT:FT\t0/1:PASS\t0/0:PASS\t0/0:PASS\t0/0:PASS\t0/0:PASS\t0/1:PASS",
    "chr1\t300\t.\tG\tA\t.\tPASS\t.\tGT:FT\t0|1:PASS\t0/1:LowGQ\t0/0:PASS\t0/0:.\t0/0:PASS\t0/0:PASS",
    "chr1\t400\t.\tT\tC\t.\tPASS\twas_split\tGT:FT\t0/1:PASS\t0/1:PASS\t0/1:PASS\t0/0:PASS\t0/0:PASS\t0/0:PASS",
    "chr1\t500\t.\tA\tC\t.\tPASS\t.\tGT:FT\t0/1:PASS\t./.:.\t0/1:PASS\t0/0:PASS\t0/0:PASS\t0/0:PASS",
    "chr2\t100\t.\tA\tT\t.\tPASS\t.\tGT:FT\t0/1:PASS\t0/1:PASS\t0/1:PASS\t0/0:PASS\t0/0:PASS\t0/0:PASS",
];

pub fn write_vcf(name: &str, header: &str, records: &[&str]) -> PathBuf {
    std::fs::create_dir_all(OUTDIR).unwrap();
    let path = Path::new(OUTDIR).join(name);
    let mut file = std::fs::File::create(&path).unwrap();

    writeln!(file, "{header}").unwrap();
    writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}", SAMPLES.join("\t")).unwrap();
    for record in records {
        writeln!(file, "{record}").unwrap();
    }
    path
}

pub fn test_vcf(name: &str) -> PathBuf {
    write_vcf(name, HEADER, &RECORDS)
}

pub fn write_lines(name: &str, lines: &[&str]) -> PathBuf {
    std::fs::create_dir_all(OUTDIR).unwrap();
    let path = Path::new(OUTDIR).join(name);
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

pub fn filter_args(name: &str) -> FilterArgs {
    FilterArgs {
        file: test_vcf(&format!("{name}.vcf")),
        samples: write_lines(&format!("{name}_samples.txt"), &SAMPLES[..5]),
        output: PathBuf::from(OUTDIR),
        prefix: name.to_string(),
        ..Default::default()
    }
}

/// Data lines of a bgzipped VCF with tabs replaced by spaces
pub fn read_records(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let reader = std::io::BufReader::new(bgzip::BGZFReader::new(file).unwrap());
    reader
        .lines()
        .map(|l| l.unwrap())
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.replace('\t', " "))
        .collect()
}
