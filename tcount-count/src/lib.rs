//! # Conversion counting for tcount.
//!
//! Scans annotated intervals of each sample, folding classified reads into
//! per-interval conversion statistics and genome-wide per-base conversion-rate
//! tracks, and rolls the per-interval tables up to gene level.
//!
//! Samples are counted independently on a `rayon` pool; a failing sample does
//! not stop the others.
//!
pub mod aggregate;
pub mod bedgraph;
pub mod config;
pub mod consts;
pub mod error;
pub mod merge;
pub mod rollup;
pub mod sample;
pub mod writing;

#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use rayon::prelude::*;

use tcount_io::{FastaReference, Sample};

pub use aggregate::*;
pub use bedgraph::*;
pub use config::*;
pub use error::*;
pub use merge::{merge_tables, table_sample_name};
pub use rollup::{GeneRollup, RollupDiagnostic, collapse};
pub use sample::*;

///
/// Outcome of one sample of a multi-sample run.
///
#[derive(Debug)]
pub struct SampleResult {
    pub sample: String,
    pub result: Result<SampleReport>,
}

///
/// Count every sample on a pool of `config.threads` workers. The reference is
/// shared read-only; each worker owns its BAM reader and accumulators.
///
/// # Arguments
/// - samples: samples to count
/// - bed: BED file of annotated intervals
/// - reference: reference genome
/// - config: resolved run settings
/// - out_dir: output directory
/// - show_progress: draw a spinner per sample
///
/// # Returns
/// - one result per sample, in input order
pub fn count_samples(
    samples: &[Sample],
    bed: &Path,
    reference: Arc<FastaReference>,
    config: &CountConfig,
    out_dir: &Path,
    show_progress: bool,
) -> Result<Vec<SampleResult>> {
    if samples.is_empty() {
        return Err(CountError::Input("no samples to count".to_string()).into());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.max(1))
        .build()?;

    info!(
        "Counting {} samples on {} threads",
        samples.len(),
        config.threads.max(1)
    );

    let results = pool.install(|| {
        samples
            .par_iter()
            .map(|sample| {
                let reference = Arc::clone(&reference);
                let result =
                    count_sample(sample, bed, &reference, config, out_dir, show_progress);
                if let Err(e) = &result {
                    error!("Sample {} failed: {:#}", sample.name, e);
                }
                SampleResult {
                    sample: sample.name.clone(),
                    result,
                }
            })
            .collect()
    });

    Ok(results)
}
