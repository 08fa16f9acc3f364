use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ArgMatches;
use log::warn;

use tcount_count::collapse;
use tcount_count::consts::ROLLUP_SUFFIX;
use tcount_count::table_sample_name;

/// `<dir>/<sample>_collapsed.tsv`, next to the table unless `out_dir` is set.
pub fn rollup_path(table: &Path, out_dir: Option<&Path>) -> PathBuf {
    let dir = out_dir
        .or_else(|| table.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}{}", table_sample_name(table), ROLLUP_SUFFIX))
}

pub fn run_collapse(matches: &ArgMatches) -> Result<()> {
    let tables: Vec<PathBuf> = matches
        .get_many::<PathBuf>("tables")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let out_dir = matches.get_one::<String>("output").map(Path::new);

    for table in &tables {
        let output = rollup_path(table, out_dir);
        let skipped = collapse(table, &output)?;
        if !skipped.is_empty() {
            warn!("{} rows of {:?} were skipped", skipped.len(), table);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use tcount_core::models::SUMMARY_HEADER;

    use crate::build_parser;

    #[rstest]
    #[case("out/s1_tcount.tsv", None, "out/s1_collapsed.tsv")]
    #[case("out/s1_tcount.tsv", Some("genes"), "genes/s1_collapsed.tsv")]
    #[case("s1_tcount.tsv", None, "s1_collapsed.tsv")]
    fn test_rollup_path(#[case] table: &str, #[case] out_dir: Option<&str>, #[case] expected: &str) {
        assert_eq!(
            rollup_path(Path::new(table), out_dir.map(Path::new)),
            PathBuf::from(expected)
        );
    }

    #[rstest]
    fn test_run_collapse() {
        let tempdir = tempfile::tempdir().unwrap();
        let table = tempdir.path().join("s1_tcount.tsv");
        std::fs::write(
            &table,
            format!("{SUMMARY_HEADER}\nchr1\t0\t10\tgeneA\t10\t+\t0.5\t0\t4\t8\t4\t2\t2\t0\n"),
        )
        .unwrap();

        let matches =
            build_parser().get_matches_from(vec!["tcount", "collapse", table.to_str().unwrap()]);
        let (_, sub) = matches.subcommand().unwrap();
        run_collapse(sub).unwrap();

        let written = std::fs::read_to_string(tempdir.path().join("s1_collapsed.tsv")).unwrap();
        assert_eq!(
            written.lines().nth(1),
            Some("geneA\t10\t1000000\t0.5\t4\t8\t4\t2\t2\t0")
        );
    }
}
