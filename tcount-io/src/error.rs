use std::io;
use thiserror::Error;

use tcount_core::errors::IntervalError;

/// Error type for tcount-io operations.
#[derive(Error, Debug)]
pub enum TcountIoError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An annotation line could not be turned into a countable interval.
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// A BED line is missing fields or has non-numeric coordinates.
    #[error("Malformed BED line {line}: {reason}")]
    BedParse { line: usize, reason: String },

    /// Sample sheet with an unsupported extension or too few columns.
    #[error("Invalid sample file {path}: {reason}")]
    SampleSheet { path: String, reason: String },

    /// 1-based sample index outside of the sample list.
    #[error("Sample index ({index}) out of range, {count} samples available. Indices start at 1")]
    SampleIndex { index: usize, count: usize },

    /// Malformed line in a known-sites (VCF) file.
    #[error("Malformed known-sites line {line}: {reason}")]
    KnownSites { line: usize, reason: String },

    /// Reads in a BAM file differ too much in length to pick a window size.
    #[error(
        "Difference between minimum ({min}) and maximum ({max}) read length is > {limit}. Please specify the maximum read length explicitly"
    )]
    ReadLengthSpread { min: usize, max: usize, limit: usize },
}

/// Result type alias for tcount-io operations.
pub type Result<T> = std::result::Result<T, TcountIoError>;
