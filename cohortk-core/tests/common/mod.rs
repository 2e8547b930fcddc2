#![allow(dead_code)]
use cohortk_core::{
    AncestryTable, Call, FilterStatus, GenotypeCall, Locus, SampleList, Variant, VariantMatrix,
};

pub const OUTDIR: &str = "tests/results";

/// 10 variants x 20 samples. Columns 1-10 are the cohort, the rest only
/// matter for the unfiltered runs.
pub const ROWS: [(&str, u64, &str); 10] = [
    // two het calls in the cohort
    ("chr1", 100, "0/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 1/1 1/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    // a single alt allele
    ("chr1", 200, "0/0 0/0 0/0 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/1 0/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    // monomorphic in the cohort
    ("chr1", 300, "0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/1 1/1 0/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0"),
    // one missing call, fails the call rate
    ("chr1", 400, "0/1 0/1 0/1 ./. 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    // two low quality calls are masked
    ("chr1", 500, "0/1 0/0 0/1:LowGQ 0/0 1/1:LowDP 0/0 0|1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    // fixed for the alternate allele
    ("chr1", 600, "1/1 1/1 1/1 1/1 1/1 1/1 1/1 1/1 1/1 1/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    ("chr2", 700, "0/1 0/1 0/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    ("chr2", 800, "0/1 0/1 0/1 0/1 0/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    ("chr2", 900, "1/1 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
    // undefined FT is never masked
    ("chr2", 1000, "0/1:. 0/1 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0 0/0"),
];

pub fn sample_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("S{i:02}")).collect()
}

/// `0/1`, `1|1`, `./.` or with a filter status after a colon. A bare genotype is PASS.
pub fn parse_call(token: &str) -> GenotypeCall {
    let (gt, ft) = match token.split_once(':') {
        Some((gt, ft)) => (gt, FilterStatus::parse(ft)),
        None => (token, Some(FilterStatus::Pass)),
    };

    let phased = gt.contains('|');
    let alleles: Vec<Option<u16>> = gt.split(['/', '|']).map(|a| a.parse().ok()).collect();
    let gt = match alleles[..] {
        [Some(a), Some(b)] if phased => Some(Call::phased(a, b)),
        [Some(a), Some(b)] => Some(Call::unphased(a, b)),
        _ => None,
    };

    GenotypeCall::new(gt, ft)
}

pub fn create_test_matrix() -> VariantMatrix {
    let variants = ROWS
        .iter()
        .map(|(contig, pos, _)| Variant::new(Locus::new(*contig, *pos), vec!["A".into(), "T".into()]))
        .collect();
    let rows = ROWS
        .iter()
        .map(|(_, _, calls)| calls.split_whitespace().map(parse_call).collect())
        .collect();

    VariantMatrix::from_rows(variants, sample_names(20), rows).unwrap()
}

pub fn cohort() -> SampleList {
    SampleList::from_ids(sample_names(10))
}

/// Odd samples are `eur`, even samples `afr`, S19 and S20 have no prediction
pub fn ancestry_table() -> AncestryTable {
    let pairs = sample_names(18)
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, if i % 2 == 0 { "eur" } else { "afr" }));
    AncestryTable::from_pairs(pairs).unwrap()
}

pub fn outdir(name: &str) -> std::path::PathBuf {
    let dir = std::path::Path::new(OUTDIR).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
