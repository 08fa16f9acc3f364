use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ArgMatches;

use tcount_count::merge_tables;

use super::cli::{DEFAULT_COLUMN, DEFAULT_OUT};

pub fn run_merge(matches: &ArgMatches) -> Result<()> {
    let tables: Vec<PathBuf> = matches
        .get_many::<PathBuf>("tables")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let default_out = DEFAULT_OUT.to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_out);

    let column = matches
        .get_one::<usize>("column")
        .copied()
        .unwrap_or(DEFAULT_COLUMN);

    merge_tables(&tables, column, Path::new(output))
}
