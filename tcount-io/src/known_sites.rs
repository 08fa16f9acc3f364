use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use tcount_core::models::Strand;
use tcount_core::utils::get_dynamic_reader;

use crate::error::{Result, TcountIoError};

///
/// Positions of known polymorphisms that look like conversions. A `T>C` site
/// masks conversions on forward reads (`+`), an `A>G` site masks them on
/// reverse reads (`-`). Positions are 0-based.
///
#[derive(Debug, Default, Clone)]
pub struct KnownSites {
    sites: HashSet<(String, u64, Strand)>,
}

impl KnownSites {
    ///
    /// Read the conversion-like variants of a VCF file. Only the first five
    /// columns are looked at; every other variant is ignored.
    ///
    /// # Arguments
    /// - path: path to a (optionally gzipped) VCF file
    pub fn from_vcf(path: &Path) -> anyhow::Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Ok(KnownSites::from_reader(reader)?)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut sites = HashSet::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(TcountIoError::KnownSites {
                    line: index + 1,
                    reason: format!("expected at least 5 fields, found {}", fields.len()),
                });
            }

            let position = fields[1]
                .parse::<u64>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| TcountIoError::KnownSites {
                    line: index + 1,
                    reason: format!("invalid position '{}'", fields[1]),
                })?;

            let reference = fields[3].to_ascii_uppercase();
            let alternates = fields[4].to_ascii_uppercase();
            let strand = match reference.as_str() {
                "T" if alternates.split(',').any(|a| a == "C") => Strand::Plus,
                "A" if alternates.split(',').any(|a| a == "G") => Strand::Minus,
                _ => continue,
            };

            sites.insert((fields[0].to_string(), position - 1, strand));
        }

        Ok(KnownSites { sites })
    }

    pub fn insert(&mut self, chrom: &str, position: u64, strand: Strand) {
        self.sites.insert((chrom.to_string(), position, strand));
    }

    pub fn is_known(&self, chrom: &str, position: u64, strand: Strand) -> bool {
        self.sites.contains(&(chrom.to_string(), position, strand))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
