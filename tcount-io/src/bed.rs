use std::io::BufRead;
use std::path::Path;

use tcount_core::models::GenomicInterval;
use tcount_core::utils::get_dynamic_reader;

use crate::error::{Result, TcountIoError};

///
/// Lazy, ordered stream of stranded intervals from a BED6 source.
///
/// Header lines (`#`, `track`, `browser`) and blank lines are skipped. Every
/// other line must carry `chrom start end`; the name (column 4) defaults to an
/// empty string and the strand (column 6) is mandatory.
///
pub struct BedIntervals<R: BufRead> {
    reader: R,
    line_number: usize,
    buf: String,
}

impl BedIntervals<std::io::BufReader<Box<dyn std::io::Read>>> {
    ///
    /// Open a (optionally gzipped) BED file.
    ///
    /// # Arguments
    /// - path: path to the bed file on disk
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Ok(BedIntervals::new(reader))
    }
}

impl<R: BufRead> BedIntervals<R> {
    pub fn new(reader: R) -> Self {
        BedIntervals {
            reader,
            line_number: 0,
            buf: String::with_capacity(256),
        }
    }
}

/// Parse one BED line. `Ok(None)` for lines that carry no interval.
pub fn parse_bed_line(line: &str, line_number: usize) -> Result<Option<GenomicInterval>> {
    let trimmed = line.trim_end_matches(['\n', '\r']);

    if trimmed.trim().is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
    {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split('\t').collect();
    if fields.len() < 3 {
        return Err(TcountIoError::BedParse {
            line: line_number,
            reason: format!("expected at least 3 fields, found {}", fields.len()),
        });
    }

    let start = fields[1]
        .trim()
        .parse::<i64>()
        .map_err(|e| TcountIoError::BedParse {
            line: line_number,
            reason: format!("cannot parse start '{}': {}", fields[1], e),
        })?;
    let stop = fields[2]
        .trim()
        .parse::<i64>()
        .map_err(|e| TcountIoError::BedParse {
            line: line_number,
            reason: format!("cannot parse end '{}': {}", fields[2], e),
        })?;

    let name = fields.get(3).map(|s| s.trim()).unwrap_or("");
    let strand = fields.get(5).map(|s| s.trim());

    let interval = GenomicInterval::new(fields[0].trim(), start, stop, strand, name)?;

    Ok(Some(interval))
}

impl<R: BufRead> Iterator for BedIntervals<R> {
    type Item = Result<GenomicInterval>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    match parse_bed_line(&self.buf, self.line_number) {
                        Ok(Some(interval)) => return Some(Ok(interval)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
