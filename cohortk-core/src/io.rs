use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Reader, ReaderBuilder, Writer, WriterBuilder};

use crate::error::{Error, Result};

/// Open a possibly compressed file for reading, `-` reads stdin
pub fn get_input(path: &Path) -> Result<Box<dyn io::Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin()));
    }

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let (reader, _format) = niffler::get_reader(Box::new(file)).map_err(|e| {
        Error::Compression {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    Ok(reader)
}

/// Create or truncate a file for writing
pub fn get_output(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::io(path, e))
}

/// Tab-split table reader. Quotes are ordinary characters in sample ids.
pub fn get_tsv_reader<R: io::Read>(input: R, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(!has_headers)
        .quoting(false)
        .from_reader(input)
}

pub fn get_vcf_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .double_quote(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(output)
}

/// Passes writes through until the first error, then discards everything.
///
/// `BGZFWriter` flushes again when dropped and panics if that flush fails, so
/// the error is returned once and later writes succeed without touching `inner`.
#[derive(Debug)]
pub struct FusedWriter<W> {
    inner: W,
    failed: bool,
}

impl<W: io::Write> FusedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, failed: false }
    }
}

impl<W: io::Write> io::Write for FusedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed {
            return Ok(buf.len());
        }
        let res = self.inner.write(buf);
        self.failed = res.is_err();
        res
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failed {
            return Ok(());
        }
        let res = self.inner.flush();
        self.failed = res.is_err();
        res
    }
}

pub fn get_bgzf_writer<W: io::Write>(output: W) -> bgzip::BGZFWriter<FusedWriter<W>> {
    bgzip::BGZFWriter::new(FusedWriter::new(output), bgzip::Compression::default())
}

pub fn append_ext(ext: impl AsRef<OsStr>, path: &Path) -> PathBuf {
    let mut os_string: OsString = path.into();
    os_string.push(".");
    os_string.push(ext.as_ref());
    os_string.into()
}

/// Sibling path used while a file is being written, renamed into place when done
pub fn partial_path(path: &Path) -> PathBuf {
    append_ext("partial", path)
}

pub fn commit(partial: &Path, path: &Path) -> Result<()> {
    std::fs::rename(partial, path).map_err(|e| Error::io(path, e))
}
