use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CONVERSION_THRESHOLD, DEFAULT_MIN_BASE_QUALITY, DEFAULT_THREADS};
use crate::error::CountError;

///
/// Settings of a counting run, usually read from a TOML file and then
/// overridden by command-line flags. Every field is optional in the file.
///
/// ```toml
/// threads = 4
/// conversion_threshold = 2
/// min_base_quality = 27
/// max_read_length = 100
/// strict_conversions = true
/// bam_version = "0.2.4"
/// known_sites_dir = "snp/"
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CountConfig {
    pub threads: usize,
    /// conversions needed before a read counts as converted
    pub conversion_threshold: u32,
    pub min_base_quality: u8,
    /// estimated from each BAM when unset
    pub max_read_length: Option<u32>,
    pub strict_conversions: bool,
    /// expected `bam_version:` comment of the input BAMs
    pub bam_version: Option<String>,
    /// directory holding `<sample>_snp.vcf` files
    pub known_sites_dir: Option<PathBuf>,
}

impl Default for CountConfig {
    fn default() -> Self {
        CountConfig {
            threads: DEFAULT_THREADS,
            conversion_threshold: DEFAULT_CONVERSION_THRESHOLD,
            min_base_quality: DEFAULT_MIN_BASE_QUALITY,
            max_read_length: None,
            strict_conversions: true,
            bam_version: None,
            known_sites_dir: None,
        }
    }
}

impl TryFrom<&Path> for CountConfig {
    type Error = CountError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = read_to_string(path)?;
        let config: CountConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
