use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use tcount_core::models::GenomicInterval;
use tcount_core::traits::{ReadSource, ReferenceSource};
use tcount_io::{
    BamReadSource, BedIntervals, ClassifierParams, FastaReference, KnownSites, Sample,
    count_mapped_reads, estimate_max_read_length,
};

use crate::aggregate::{AggregateParams, CountDiagnostic, IntervalAggregator};
use crate::bedgraph::BedgraphAccumulator;
use crate::config::CountConfig;
use crate::error::{CountError, CountResult};
use crate::writing::{SampleOutputs, SummaryWriter, create_output_file};

///
/// What a finished sample run produced.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    pub sample: String,
    pub intervals: usize,
    pub total_mapped_reads: u64,
    pub max_read_length: u32,
    pub diagnostics: Vec<CountDiagnostic>,
    pub outputs: SampleOutputs,
}

///
/// Fail when an expected BAM version is configured and the BAM carries a
/// different one, or none at all.
///
pub fn check_bam_version(found: Option<&str>, expected: Option<&str>) -> CountResult<()> {
    match (expected, found) {
        (None, _) => Ok(()),
        (Some(expected), Some(found)) if expected == found => Ok(()),
        (Some(expected), found) => Err(CountError::VersionMismatch {
            found: found.unwrap_or("none").to_string(),
            expected: expected.to_string(),
        }),
    }
}

///
/// Load `<dir>/<sample>_snp.vcf` when it exists.
///
pub fn known_sites_for(sample: &Sample, dir: Option<&Path>) -> Result<Option<KnownSites>> {
    let Some(dir) = dir else {
        return Ok(None);
    };

    let path = dir.join(format!("{}_snp.vcf", sample.name));
    if !path.exists() {
        warn!("No known sites for {} at {:?}", sample.name, path);
        return Ok(None);
    }

    let sites = KnownSites::from_vcf(&path)?;
    info!("Masking {} known sites for {}", sites.len(), sample.name);
    Ok(Some(sites))
}

fn interval_spinner(sample: &str, show_progress: bool) -> Result<ProgressBar> {
    if !show_progress {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} intervals, {per_sec})")?,
    );
    pb.set_message(format!("Counting {sample}"));
    Ok(pb)
}

///
/// Scan every interval in order, writing one table row per interval, and
/// return the sample's bedgraph tracks and diagnostics.
///
/// # Arguments
/// - intervals: the annotated intervals, in output order
/// - reference: reference bases of the sample's genome
/// - source: classified reads of the sample
/// - params: sample-wide scan settings
/// - table: per-interval table of the sample
/// - progress: spinner advanced once per interval
pub fn count_intervals<I, E, S, W>(
    intervals: I,
    reference: &dyn ReferenceSource,
    source: &mut S,
    params: AggregateParams,
    table: &mut SummaryWriter<W>,
    progress: &ProgressBar,
) -> Result<(BedgraphAccumulator, Vec<CountDiagnostic>)>
where
    I: IntoIterator<Item = std::result::Result<GenomicInterval, E>>,
    anyhow::Error: From<E>,
    S: ReadSource + ?Sized,
    W: Write,
{
    let mut aggregator = IntervalAggregator::new(params);

    for interval in intervals {
        let interval = interval?;
        let summary = aggregator
            .count_interval(&interval, reference, source)
            .with_context(|| format!("Failed to count interval {}", interval.name))?;
        table.write(&summary)?;
        progress.inc(1);
    }

    Ok(aggregator.finish())
}

///
/// Count one sample end to end: check the BAM, scan all intervals of `bed`,
/// then write the table and both bedgraph tracks into `out_dir`.
///
/// # Arguments
/// - sample: the sample to count
/// - bed: BED file of annotated intervals
/// - reference: reference genome shared by all samples
/// - config: resolved run settings
/// - out_dir: output directory
/// - show_progress: draw a spinner while intervals are scanned
pub fn count_sample(
    sample: &Sample,
    bed: &Path,
    reference: &FastaReference,
    config: &CountConfig,
    out_dir: &Path,
    show_progress: bool,
) -> Result<SampleReport> {
    info!("Counting sample {} from {:?}", sample.name, sample.bam);

    let max_read_length = match config.max_read_length {
        Some(length) => length,
        None => estimate_max_read_length(&sample.bam)
            .with_context(|| format!("Failed to estimate read length of {:?}", sample.bam))?,
    };
    info!("Using max read length {} for {}", max_read_length, sample.name);

    let known_sites = known_sites_for(sample, config.known_sites_dir.as_deref())?;

    let classifier = ClassifierParams {
        min_base_quality: config.min_base_quality,
        conversion_threshold: config.conversion_threshold,
        max_read_length,
    };
    let mut source = BamReadSource::open(&sample.bam, reference, known_sites, classifier)?;
    check_bam_version(
        source.artifact_version().as_deref(),
        config.bam_version.as_deref(),
    )?;

    let total_mapped_reads = count_mapped_reads(&sample.bam)?;
    info!("{} mapped reads in {}", total_mapped_reads, sample.name);

    let params = AggregateParams {
        total_mapped_reads,
        strict_conversions: config.strict_conversions,
    };

    let outputs = SampleOutputs::new(out_dir, &sample.name);
    let file = create_output_file(&outputs.table)
        .with_context(|| format!("Failed to create {:?}", outputs.table))?;
    let mut table = SummaryWriter::new(file, sample)?;

    let intervals = BedIntervals::from_path(bed)?;
    let progress = interval_spinner(&sample.name, show_progress)?;

    let (bedgraph, diagnostics) =
        count_intervals(intervals, reference, &mut source, params, &mut table, &progress)?;

    let rows = table.rows();
    table.finish()?;
    bedgraph
        .write_tracks(&outputs.plus_track, &outputs.minus_track)
        .with_context(|| format!("Failed to write bedgraph tracks of {}", sample.name))?;

    progress.finish_with_message(format!("Counted {} intervals of {}", rows, sample.name));
    debug!("{} bedgraph positions for {}", bedgraph.len(), sample.name);
    info!(
        "Finished {}: {} intervals, {} strand mismatches",
        sample.name,
        rows,
        diagnostics.len()
    );

    Ok(SampleReport {
        sample: sample.name.clone(),
        intervals: rows,
        total_mapped_reads,
        max_read_length,
        diagnostics,
        outputs,
    })
}
