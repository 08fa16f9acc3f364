use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tcount_core::models::{IntervalSummary, SUMMARY_HEADER};
use tcount_io::Sample;

use crate::consts::{COUNT_FORMAT_VERSION, MINUS_TRACK_SUFFIX, PLUS_TRACK_SUFFIX, TABLE_SUFFIX, TCOUNT_VERSION};

///
/// Paths of the three files written for one sample.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutputs {
    pub table: PathBuf,
    pub plus_track: PathBuf,
    pub minus_track: PathBuf,
}

impl SampleOutputs {
    pub fn new(out_dir: &Path, sample_name: &str) -> Self {
        SampleOutputs {
            table: out_dir.join(format!("{sample_name}{TABLE_SUFFIX}")),
            plus_track: out_dir.join(format!("{sample_name}{PLUS_TRACK_SUFFIX}")),
            minus_track: out_dir.join(format!("{sample_name}{MINUS_TRACK_SUFFIX}")),
        }
    }
}

///
/// Comment line opening every per-interval table: tool version, table
/// format version and the sample's name, type and time.
///
pub fn header_comment(sample: &Sample) -> String {
    format!(
        "#tcount v{}\t{}\tsample info:\t{}\t{}\t{}",
        TCOUNT_VERSION, COUNT_FORMAT_VERSION, sample.name, sample.kind, sample.time
    )
}

/// Buffered file writer, creating missing parent directories.
pub fn create_output_file(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

///
/// Writes the per-interval table of one sample, one row per interval in
/// the order they are handed in.
///
pub struct SummaryWriter<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> SummaryWriter<W> {
    /// Writes the comment and column header immediately.
    pub fn new(mut writer: W, sample: &Sample) -> io::Result<Self> {
        writeln!(writer, "{}", header_comment(sample))?;
        writeln!(writer, "{}", SUMMARY_HEADER)?;
        Ok(SummaryWriter { writer, rows: 0 })
    }

    pub fn write(&mut self, summary: &IntervalSummary) -> io::Result<()> {
        writeln!(self.writer, "{}", summary.as_string())?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
