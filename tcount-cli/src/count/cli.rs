use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const COUNT_CMD: &str = "count";
pub const DEFAULT_OUT: &str = ".";

pub fn create_count_cli() -> Command {
    Command::new(COUNT_CMD)
        .about("Count conversions per interval for each sample and write per-base conversion-rate tracks.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("inputs")
                .help("Indexed BAM files, or a single .tsv/.csv sample sheet")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(arg!(-b --bed <bed> "BED file of stranded 3' UTR intervals").required(true))
        .arg(arg!(-r --reference <reference> "Reference FASTA the reads were mapped against").required(true))
        .arg(arg!(-o --output <output> "Output directory"))
        .arg(arg!(--config <config> "TOML file with run settings"))
        .arg(arg!(-t --threads <threads> "Number of samples counted in parallel").value_parser(value_parser!(usize)))
        .arg(
            arg!(-c --"conversion-threshold" <threshold> "Conversions needed for a read to count as converted")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(-q --"min-base-quality" <quality> "Minimum base quality of a counted mismatch")
                .value_parser(value_parser!(u8)),
        )
        .arg(
            arg!(-l --"max-read-length" <length> "Maximum read length, estimated from each BAM when omitted")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"all-conversions" "Count conversions of reads below the conversion threshold too")
                .action(ArgAction::SetTrue),
        )
        .arg(arg!(--"bam-version" <version> "Required bam_version of the input BAM files"))
        .arg(arg!(-s --"known-sites" <dir> "Directory with <sample>_snp.vcf files of known polymorphisms"))
        .arg(
            arg!(-i --"sample-index" <index> "Only count this sample of the sample sheet (1-based)")
                .value_parser(value_parser!(usize)),
        )
}
