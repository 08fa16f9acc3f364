use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use log::{info, warn};

use tcount_count::{CountConfig, count_samples};
use tcount_io::{FastaReference, resolve_samples};

use super::cli::DEFAULT_OUT;

///
/// Settings of the run: the config file when given, overridden by flags.
///
pub fn resolve_config(matches: &ArgMatches) -> Result<CountConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CountConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to read config file: {}", path))?,
        None => CountConfig::default(),
    };

    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }
    if let Some(threshold) = matches.get_one::<u32>("conversion-threshold") {
        config.conversion_threshold = *threshold;
    }
    if let Some(quality) = matches.get_one::<u8>("min-base-quality") {
        config.min_base_quality = *quality;
    }
    if let Some(length) = matches.get_one::<u32>("max-read-length") {
        config.max_read_length = Some(*length);
    }
    if matches.get_flag("all-conversions") {
        config.strict_conversions = false;
    }
    if let Some(version) = matches.get_one::<String>("bam-version") {
        config.bam_version = Some(version.clone());
    }
    if let Some(dir) = matches.get_one::<String>("known-sites") {
        config.known_sites_dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}

pub fn run_count(matches: &ArgMatches) -> Result<()> {
    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("inputs")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let bed = matches
        .get_one::<String>("bed")
        .ok_or_else(|| anyhow!("A BED file of intervals is required."))?;

    let reference = matches
        .get_one::<String>("reference")
        .ok_or_else(|| anyhow!("A reference FASTA is required."))?;

    let default_out = DEFAULT_OUT.to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_out);

    let sample_index = matches.get_one::<usize>("sample-index").copied();
    let show_progress = !matches.get_flag("quiet");

    let config = resolve_config(matches)?;
    let samples = resolve_samples(&inputs, sample_index)?;
    let reference = Arc::new(FastaReference::from_path(Path::new(reference))?);

    let results = count_samples(
        &samples,
        Path::new(bed),
        reference,
        &config,
        Path::new(output),
        show_progress,
    )?;

    let mut failed = 0;
    for sample in &results {
        match &sample.result {
            Ok(report) => {
                if !report.diagnostics.is_empty() {
                    warn!(
                        "{}: {} intervals with more reads on the opposite strand",
                        report.sample,
                        report.diagnostics.len()
                    );
                }
                info!("{} -> {:?}", report.sample, report.outputs.table);
            }
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} samples failed", failed, results.len()));
    }

    Ok(())
}
