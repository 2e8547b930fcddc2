use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};

use cohortk_core::{checkpoint::read_snapshot, SampleList};

#[doc(hidden)]
fn return_double_extension_filetype(path: &Path, e1: &str) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no stem"))?;
    let e2 = Path::new(&stem)
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no other filetype"))?;
    Ok(format!("{e2}.{e1}"))
}

pub fn get_sample_names(path: &Path) -> Result<Vec<String>> {
    let extension: &str = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("No filetype in path"))?;

    let extension = match extension {
        "gz" | "bgz" => return_double_extension_filetype(path, extension)?,
        _ => extension.to_string(),
    };

    let ids = match extension.as_str() {
        "vcf.gz" | "vcf.bgz" | "vcf" | "bcf" => {
            use rust_htslib::bcf::{Read, Reader};
            let bcf = Reader::from_path(path).wrap_err(eyre!("Error opening {path:?}"))?;
            crate::read_vcf::get_samples(bcf.header())?
        }
        "json.gz" => read_snapshot(path)?.matrix.samples().to_vec(),
        "txt" | "tsv" | "txt.gz" | "tsv.gz" => SampleList::read(path)?.iter().cloned().collect(),
        _ => return Err(eyre!("filetype not supported for: {}", extension)),
    };
    Ok(ids)
}

#[doc(hidden)]
pub fn run(path: PathBuf) -> Result<()> {
    let ids = get_sample_names(&path)?;
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
