mod collapse;
mod count;
mod merge;

use anyhow::Result;
use clap::{ArgAction, ArgMatches, Command, arg};
use log::Level;
use simple_logger::init_with_level;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "tcount";
    pub const BIN_NAME: &str = "tcount";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Count T>C conversions of metabolically labeled RNA over annotated 3' UTRs.")
        .subcommand_required(true)
        .arg(
            arg!(--verbose "Log debug messages")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--quiet "Only log warnings and errors, hide progress spinners")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(count::cli::create_count_cli())
        .subcommand(collapse::cli::create_collapse_cli())
        .subcommand(merge::cli::create_merge_cli())
}

fn log_level(matches: &ArgMatches) -> Level {
    if matches.get_flag("verbose") {
        Level::Debug
    } else if matches.get_flag("quiet") {
        Level::Warn
    } else {
        Level::Info
    }
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_with_level(log_level(&matches))?;

    match matches.subcommand() {
        //
        // COUNT
        //
        Some((count::cli::COUNT_CMD, matches)) => {
            count::handlers::run_count(matches)?;
        }

        //
        // GENE ROLL-UP
        //
        Some((collapse::cli::COLLAPSE_CMD, matches)) => {
            collapse::handlers::run_collapse(matches)?;
        }

        //
        // MULTI-SAMPLE MERGE
        //
        Some((merge::cli::MERGE_CMD, matches)) => {
            merge::handlers::run_merge(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(vec!["tcount", "collapse", "t.tsv"], Level::Info)]
    #[case(vec!["tcount", "--verbose", "collapse", "t.tsv"], Level::Debug)]
    #[case(vec!["tcount", "collapse", "t.tsv", "--quiet"], Level::Warn)]
    fn test_log_level(#[case] args: Vec<&str>, #[case] expected: Level) {
        let matches = build_parser().get_matches_from(args);
        assert_eq!(log_level(&matches), expected);
    }

    #[rstest]
    fn test_parser_is_valid() {
        build_parser().debug_assert();
    }
}
