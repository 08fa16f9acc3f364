use clap::{Arg, Command, arg, value_parser};

pub const COLLAPSE_CMD: &str = "collapse";

pub fn create_collapse_cli() -> Command {
    Command::new(COLLAPSE_CMD)
        .about("Sum per-interval tables into per-gene totals.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("tables")
                .help("Per-interval tables written by `tcount count`")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(arg!(-o --output <output> "Output directory, defaults to the directory of each table"))
}
