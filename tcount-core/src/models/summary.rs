use std::fmt::{self, Display};

use crate::models::interval::{GenomicInterval, Strand};

/// Column header of the per-interval table, matching [IntervalSummary::as_string].
pub const SUMMARY_HEADER: &str = "chromosome\tstart\tend\tname\tlength\tstrand\tconversionRate\treadsCPM\tconvertibleBaseCount\tcoverageOnConvertible\tconversionsOnConvertible\treadCount\tconvertedReadCount\tmultimapCount";

/// Number of tab-separated fields in one summary row.
pub const SUMMARY_FIELDS: usize = 14;

///
/// Conversion statistics for one annotated interval.
///
#[derive(PartialEq, Debug, Clone)]
pub struct IntervalSummary {
    pub chrom: String,
    pub start: u64,
    pub stop: u64,
    pub strand: Strand,
    pub name: String,
    /// T count on `+`, A count on `-`
    pub convertible_base_count: u64,
    pub reads_cpm: f64,
    pub coverage_on_convertible: u64,
    pub conversions_on_convertible: u64,
    pub conversion_rate: f64,
    pub read_count: u64,
    pub converted_read_count: u64,
    pub multimapper_count: u64,
}

impl IntervalSummary {
    ///
    /// All-zero summary for an interval with no reads on its annotated strand.
    ///
    pub fn empty(interval: &GenomicInterval) -> Self {
        IntervalSummary {
            chrom: interval.chrom.clone(),
            start: interval.start,
            stop: interval.stop,
            strand: interval.strand,
            name: interval.name.clone(),
            convertible_base_count: 0,
            reads_cpm: 0.0,
            coverage_on_convertible: 0,
            conversions_on_convertible: 0,
            conversion_rate: 0.0,
            read_count: 0,
            converted_read_count: 0,
            multimapper_count: 0,
        }
    }

    pub fn length(&self) -> u64 {
        self.stop - self.start
    }

    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.stop,
            self.name,
            self.length(),
            self.strand,
            self.conversion_rate,
            self.reads_cpm,
            self.convertible_base_count,
            self.coverage_on_convertible,
            self.conversions_on_convertible,
            self.read_count,
            self.converted_read_count,
            self.multimapper_count
        )
    }
}

impl Display for IntervalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
