use std::fmt::{self, Display};

use anyhow::Result;
use log::{debug, warn};

use tcount_core::models::{Direction, GenomicInterval, IntervalSummary, ReadRecord, Strand};
use tcount_core::stats::{mean, per_million, rate};
use tcount_core::traits::{ReadSource, ReferenceSource};

use crate::bedgraph::BedgraphAccumulator;

///
/// Sample-wide settings of the interval scan.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateParams {
    /// denominator of the reads-per-million normalization
    pub total_mapped_reads: u64,
    /// drop conversions of reads that do not reach the conversion threshold
    pub strict_conversions: bool,
}

impl Default for AggregateParams {
    fn default() -> Self {
        AggregateParams {
            total_mapped_reads: 0,
            strict_conversions: true,
        }
    }
}

///
/// Non-fatal observations made while scanning an interval.
///
#[derive(Debug, Clone, PartialEq)]
pub enum CountDiagnostic {
    /// More reads map to the strand opposite to the annotation.
    StrandMismatch {
        name: String,
        strand: Strand,
        matching_reads: u64,
        opposite_reads: u64,
    },
}

impl Display for CountDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountDiagnostic::StrandMismatch {
                name,
                strand,
                matching_reads,
                opposite_reads,
            } => write!(
                f,
                "{name} ({strand}): {opposite_reads} reads on the opposite strand, {matching_reads} on the annotated one"
            ),
        }
    }
}

/// Read tallies for one alignment direction.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DirectionCounts {
    pub reads: u64,
    pub converted_reads: u64,
    pub multimappers: u64,
}

impl DirectionCounts {
    fn add(&mut self, read: &ReadRecord) {
        self.reads += 1;
        if read.is_converted {
            self.converted_reads += 1;
        }
        if read.is_multimapper {
            self.multimappers += 1;
        }
    }
}

///
/// Per-offset read depth and conversion depth over one interval.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PositionArrays {
    pub coverage: Vec<u32>,
    pub conversions: Vec<u32>,
}

impl PositionArrays {
    pub fn new(len: usize) -> Self {
        PositionArrays {
            coverage: vec![0; len],
            conversions: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.coverage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coverage.is_empty()
    }

    /// Offsets outside `[0, len)` are ignored.
    pub fn add_read(&mut self, read: &ReadRecord) {
        for mismatch in read.mismatches.iter().filter(|m| m.is_conversion) {
            if let Some(idx) = self.index(mismatch.reference_position) {
                self.conversions[idx] += 1;
            }
        }

        let len = self.len() as i64;
        let first = read.start_ref_pos.max(0);
        let last = read.end_ref_pos.min(len);
        for offset in first..last {
            self.coverage[offset as usize] += 1;
        }
    }

    /// Percentage of covering reads converted at `idx`, `0.0` when uncovered.
    pub fn position_rate(&self, idx: usize) -> f64 {
        match self.coverage[idx] {
            0 => 0.0,
            cov => self.conversions[idx] as f64 * 100.0 / cov as f64,
        }
    }

    fn index(&self, offset: i64) -> Option<usize> {
        (offset >= 0 && offset < self.len() as i64).then_some(offset as usize)
    }
}

///
/// Everything learned about one interval. `summary` is the table row; the
/// rest is kept for callers that want to inspect the scan.
///
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalOutcome {
    pub summary: IntervalSummary,
    pub arrays: PositionArrays,
    pub forward: DirectionCounts,
    pub reverse: DirectionCounts,
    /// covered positions holding the convertible base
    pub covered_convertible_count: u64,
    /// mean per-position rate over covered convertible positions
    pub mean_position_rate: f64,
    pub diagnostic: Option<CountDiagnostic>,
}

///
/// Count the convertible base of `strand` in the forward reference sequence.
///
pub fn convertible_base_count(bases: &[u8], strand: Strand) -> u64 {
    let target = strand.convertible_base();
    bases.iter().filter(|b| **b == target).count() as u64
}

///
/// Scan one interval: fold its reads into coverage and conversion arrays,
/// reconcile strand, and write covered convertible positions to `bedgraph`.
///
/// # Arguments
/// - interval: interval being scanned
/// - reference: upper-case reference bases of the interval, `None` if the chromosome is unknown
/// - reads: classified reads overlapping the interval
/// - params: sample-wide settings
/// - bedgraph: genome-wide per-base rate accumulator of the sample
///
/// # Returns
/// - the interval outcome, or the first error produced by the read stream
pub fn aggregate_interval<I>(
    interval: &GenomicInterval,
    reference: Option<&[u8]>,
    reads: I,
    params: &AggregateParams,
    bedgraph: &mut BedgraphAccumulator,
) -> Result<IntervalOutcome>
where
    I: IntoIterator<Item = Result<ReadRecord>>,
{
    let bases = reference.unwrap_or_default();
    let convertible_count = convertible_base_count(bases, interval.strand);

    let mut arrays = PositionArrays::new(interval.len());
    let mut forward = DirectionCounts::default();
    let mut reverse = DirectionCounts::default();

    for read in reads {
        let mut read = read?;

        if params.strict_conversions && !read.is_converted {
            read.clear_conversions();
        }

        match read.direction {
            Direction::Forward => forward.add(&read),
            Direction::Reverse => reverse.add(&read),
        }

        arrays.add_read(&read);
    }

    let (matching, opposite) = match interval.strand {
        Strand::Plus => (forward, reverse),
        Strand::Minus => (reverse, forward),
    };

    let diagnostic = (opposite.reads > matching.reads).then(|| {
        let diagnostic = CountDiagnostic::StrandMismatch {
            name: interval.name.clone(),
            strand: interval.strand,
            matching_reads: matching.reads,
            opposite_reads: opposite.reads,
        };
        warn!("Strand mismatch for {diagnostic}");
        diagnostic
    });

    if matching.reads == 0 {
        debug!("No reads on the annotated strand of {}", interval.name);
        return Ok(IntervalOutcome {
            summary: IntervalSummary::empty(interval),
            arrays,
            forward,
            reverse,
            covered_convertible_count: 0,
            mean_position_rate: 0.0,
            diagnostic,
        });
    }

    let target = interval.strand.convertible_base();
    let mut covered_rates: Vec<f64> = Vec::new();
    let mut coverage_on_convertible = 0u64;
    let mut conversions_on_convertible = 0u64;

    for idx in 0..arrays.len() {
        if arrays.coverage[idx] == 0 || bases.get(idx) != Some(&target) {
            continue;
        }
        let position_rate = arrays.position_rate(idx);

        covered_rates.push(position_rate);
        coverage_on_convertible += arrays.coverage[idx] as u64;
        conversions_on_convertible += arrays.conversions[idx] as u64;

        bedgraph.insert(
            &interval.chrom,
            interval.start + idx as u64,
            interval.strand,
            position_rate,
        );
    }

    let summary = IntervalSummary {
        convertible_base_count: convertible_count,
        reads_cpm: per_million(matching.reads, params.total_mapped_reads),
        coverage_on_convertible,
        conversions_on_convertible,
        conversion_rate: rate(conversions_on_convertible, coverage_on_convertible),
        read_count: matching.reads,
        converted_read_count: matching.converted_reads,
        multimapper_count: matching.multimappers,
        ..IntervalSummary::empty(interval)
    };

    Ok(IntervalOutcome {
        summary,
        arrays,
        forward,
        reverse,
        covered_convertible_count: covered_rates.len() as u64,
        mean_position_rate: mean(&covered_rates, false),
        diagnostic,
    })
}

///
/// Scans the intervals of one sample in order and owns the sample's bedgraph
/// accumulator until every interval is done.
///
pub struct IntervalAggregator {
    params: AggregateParams,
    bedgraph: BedgraphAccumulator,
    diagnostics: Vec<CountDiagnostic>,
}

impl IntervalAggregator {
    pub fn new(params: AggregateParams) -> Self {
        IntervalAggregator {
            params,
            bedgraph: BedgraphAccumulator::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn params(&self) -> &AggregateParams {
        &self.params
    }

    pub fn bedgraph(&self) -> &BedgraphAccumulator {
        &self.bedgraph
    }

    pub fn diagnostics(&self) -> &[CountDiagnostic] {
        &self.diagnostics
    }

    ///
    /// Fetch the reference and reads of `interval` and scan it.
    ///
    pub fn count_interval<S>(
        &mut self,
        interval: &GenomicInterval,
        reference: &dyn ReferenceSource,
        source: &mut S,
    ) -> Result<IntervalSummary>
    where
        S: ReadSource + ?Sized,
    {
        let bases = reference.fetch(&interval.chrom, interval.start, interval.stop);
        if bases.is_none() {
            debug!("{} is not in the reference", interval.chrom);
        }

        let reads = source.reads_in_interval(interval)?;
        let outcome = aggregate_interval(interval, bases, reads, &self.params, &mut self.bedgraph)?;

        if let Some(diagnostic) = outcome.diagnostic {
            self.diagnostics.push(diagnostic);
        }

        Ok(outcome.summary)
    }

    /// Hand over the accumulated tracks and diagnostics once every interval is scanned.
    pub fn finish(self) -> (BedgraphAccumulator, Vec<CountDiagnostic>) {
        (self.bedgraph, self.diagnostics)
    }
}
