pub const TCOUNT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bumped whenever the layout of the per-interval table changes.
pub const COUNT_FORMAT_VERSION: &str = "format:1";

pub const TABLE_SUFFIX: &str = "_tcount.tsv";
pub const PLUS_TRACK_SUFFIX: &str = "_tcount_plus.bedgraph";
pub const MINUS_TRACK_SUFFIX: &str = "_tcount_minus.bedgraph";

pub const ROLLUP_SUFFIX: &str = "_collapsed.tsv";

pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_CONVERSION_THRESHOLD: u32 = 1;
pub const DEFAULT_MIN_BASE_QUALITY: u8 = 27;

pub const MERGE_DELIMITER: char = ';';
