use std::path::Path;

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use rust_htslib::bcf::header::HeaderView;
use rust_htslib::bcf::record::GenotypeAllele;
use rust_htslib::bcf::{Read, Reader, Record};

use cohortk_core::{Call, Error, FilterStatus, GenotypeCall, Locus, Variant, VariantMatrix};

/// INFO flag set on rows produced by splitting a multiallelic site
pub const WAS_SPLIT: &[u8] = b"was_split";

/// INFO field naming the original site of a split row
pub const OLD_MULTIALLELIC: &[u8] = b"OLD_MULTIALLELIC";

pub fn get_samples(header: &HeaderView) -> Result<Vec<String>> {
    header
        .samples()
        .into_iter()
        .map(|sample| Ok(std::str::from_utf8(sample)?.to_string()))
        .collect()
}

/// Both GT and FT must be declared for the calls to be masked
fn check_format_fields(header: &HeaderView) -> Result<()> {
    for field in ["GT", "FT"] {
        if header.format_type(field.as_bytes()).is_err() {
            return Err(Error::MissingField {
                field: field.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct SplitMarkers {
    was_split: bool,
    old_multiallelic: bool,
}

impl SplitMarkers {
    fn new(header: &HeaderView) -> Self {
        Self {
            was_split: header.info_type(WAS_SPLIT).is_ok(),
            old_multiallelic: header.info_type(OLD_MULTIALLELIC).is_ok(),
        }
    }

    fn is_split(&self, record: &Record) -> Result<bool> {
        if self.was_split && record.info(WAS_SPLIT).flag()? {
            return Ok(true);
        }
        if self.old_multiallelic {
            return Ok(record.info(OLD_MULTIALLELIC).string()?.is_some());
        }
        Ok(false)
    }
}

/// Read every record of a VCF or BCF into a [`VariantMatrix`]
pub fn read_vcf_to_matrix(path: &Path) -> Result<VariantMatrix> {
    let now = std::time::Instant::now();
    let mut reader = Reader::from_path(path).wrap_err(eyre!("Error opening {path:?}"))?;
    let header = reader.header().clone();

    check_format_fields(&header)?;
    let samples = get_samples(&header)?;
    let markers = SplitMarkers::new(&header);

    tracing::info!("Input VCF: {path:?}");
    tracing::info!("Reading genotypes of {} samples.", samples.len());

    let (mut variants, mut rows) = (vec![], vec![]);
    let mut gt_buffer = rust_htslib::bcf::record::Buffer::new();

    for record in reader.records() {
        let record = record?;
        let variant = construct_variant(&record, &header, markers)?;

        tracing::trace!("Reading record at {}", variant.locus);

        let gts = record.genotypes_shared_buffer(&mut gt_buffer)?;
        let fts = record.format(b"FT").string().ok();

        let row = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let ft = fts.as_ref().and_then(|fts| fts.get(i)).copied();
                genotype_call(&gts.get(i), ft).ok_or_else(|| {
                    eyre!(Error::Ploidy {
                        sample: sample.clone(),
                        locus: variant.locus.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<GenotypeCall>>>()?;

        variants.push(variant);
        rows.push(row);
    }

    let matrix = VariantMatrix::from_rows(variants, samples, rows)?;
    tracing::info!(
        "Constructed a genotype matrix of {} variants and {} samples in {:?}",
        matrix.nvariants(),
        matrix.nsamples(),
        now.elapsed()
    );
    Ok(matrix)
}

fn construct_variant(record: &Record, header: &HeaderView, markers: SplitMarkers) -> Result<Variant> {
    let rid = record.rid().ok_or_else(|| eyre!("Record without a contig"))?;
    let contig = std::str::from_utf8(header.rid2name(rid)?)?;

    // HTSlib is 0-based so add 1
    let pos = (record.pos() + 1) as u64;

    let alleles = record
        .alleles()
        .into_iter()
        .map(|a| Ok(std::str::from_utf8(a)?.to_string()))
        .collect::<Result<Vec<String>>>()?;

    let mut variant = Variant::new(Locus::new(contig, pos), alleles).split(markers.is_split(record)?);

    let id = record.id();
    if id != b"." {
        variant = variant.with_id(std::str::from_utf8(&id)?);
    }

    Ok(variant)
}

/// `None` if a non-missing call is not diploid
fn genotype_call(alleles: &[GenotypeAllele], ft: Option<&[u8]>) -> Option<GenotypeCall> {
    let ft = ft
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(FilterStatus::parse);

    let gt = match alleles {
        [a, b] => match (a.index(), b.index()) {
            (Some(a), Some(b)) if matches!(alleles[1], GenotypeAllele::Phased(_)) => {
                Some(Call::phased(a as u16, b as u16))
            }
            (Some(a), Some(b)) => Some(Call::unphased(a as u16, b as u16)),
            _ => None,
        },
        alleles if alleles.iter().all(|a| a.index().is_none()) => None,
        _ => return None,
    };

    Some(GenotypeCall::new(gt, ft))
}
