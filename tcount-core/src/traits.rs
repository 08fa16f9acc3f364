use anyhow::Result;

use crate::models::{GenomicInterval, ReadRecord};

///
/// Random access to upper-cased reference bases.
///
pub trait ReferenceSource {
    ///
    /// Bases of `chrom` over `[start, stop)`, clipped to the chromosome end.
    /// `None` when the chromosome is not part of the reference.
    ///
    fn fetch(&self, chrom: &str, start: u64, stop: u64) -> Option<&[u8]>;

    fn contains(&self, chrom: &str) -> bool;
}

/// Stream of classified reads for one interval.
pub type ReadIter<'a> = Box<dyn Iterator<Item = Result<ReadRecord>> + 'a>;

///
/// Anything that can hand out classified reads overlapping an interval:
/// direction, reference span, mismatches flagged as conversions or not,
/// multimapper status and the converted-read verdict.
///
pub trait ReadSource {
    fn reads_in_interval<'a>(&'a mut self, interval: &GenomicInterval) -> Result<ReadIter<'a>>;
}

