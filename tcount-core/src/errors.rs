use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntervalError {
    #[error("Input BED file does not contain stranded intervals: {0}")]
    MissingStrand(String),

    #[error("Negative start coordinate found. Please check the following entry: {0}")]
    NegativeStart(String),

    #[error("Interval end lies before its start: {0}")]
    InvalidCoordinates(String),
}
