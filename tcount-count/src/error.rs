use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountError {
    #[error(
        "BAM version mismatch: expected {expected}, found {found}. Re-run the mapping stage with a matching version"
    )]
    VersionMismatch { found: String, expected: String },

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Column {column} is out of range, summary tables have {fields} columns")]
    ColumnOutOfRange { column: usize, fields: usize },

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type CountResult<T> = std::result::Result<T, CountError>;
