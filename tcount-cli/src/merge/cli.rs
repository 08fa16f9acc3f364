use clap::{Arg, Command, arg, value_parser};

pub const MERGE_CMD: &str = "merge";
pub const DEFAULT_OUT: &str = "merged.csv";
pub const DEFAULT_COLUMN: usize = 6;

pub fn create_merge_cli() -> Command {
    Command::new(MERGE_CMD)
        .about("Put one column of several per-interval tables side by side.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("tables")
                .help("Per-interval tables written by `tcount count`")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(arg!(-o --output <output> "Merged table"))
        .arg(
            arg!(-c --column <column> "Zero-based column to collect, conversionRate by default")
                .value_parser(value_parser!(usize)),
        )
}
