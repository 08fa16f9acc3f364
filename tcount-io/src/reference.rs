use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use noodles::fasta;

use tcount_core::traits::ReferenceSource;
use tcount_core::utils::get_dynamic_reader;

///
/// In-memory, upper-cased reference genome keyed by sequence name.
///
/// Loaded once per run and shared read-only between sample workers.
///
#[derive(Debug, Default, Clone)]
pub struct FastaReference {
    sequences: HashMap<String, Vec<u8>>,
}

impl FastaReference {
    ///
    /// Load every record of a (optionally gzipped) FASTA file.
    ///
    /// # Arguments
    /// - path: path to the FASTA file
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut reader = fasta::io::Reader::new(reader);

        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record =
                result.with_context(|| format!("Failed to read FASTA record from {:?}", path))?;
            let name = String::from_utf8_lossy(record.name()).to_string();
            let bases = record.sequence().as_ref().to_ascii_uppercase();
            sequences.insert(name, bases);
        }

        info!(
            "Loaded {} reference sequences from {}",
            sequences.len(),
            path.display()
        );

        Ok(FastaReference { sequences })
    }

    pub fn from_sequences<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        FastaReference {
            sequences: sequences
                .into_iter()
                .map(|(name, bases)| (name.into(), bases.to_ascii_uppercase()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl ReferenceSource for FastaReference {
    fn fetch(&self, chrom: &str, start: u64, stop: u64) -> Option<&[u8]> {
        let bases = self.sequences.get(chrom)?;
        let stop = (stop as usize).min(bases.len());
        let start = (start as usize).min(stop);
        Some(&bases[start..stop])
    }

    fn contains(&self, chrom: &str) -> bool {
        self.sequences.contains_key(chrom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn reference() -> FastaReference {
        let path = std::env::current_dir()
            .unwrap()
            .join("../tests/data/ref.fa");
        FastaReference::from_path(&path).unwrap()
    }

    #[rstest]
    fn test_reads_all_records(reference: FastaReference) {
        assert_eq!(reference.len(), 2);
        assert!(reference.contains("chr1"));
        assert!(!reference.contains("chr1 test chromosome"));
    }

    #[rstest]
    fn test_fetch_is_upper_cased(reference: FastaReference) {
        assert_eq!(reference.fetch("chr1", 0, 6), Some(&b"ACGTTT"[..]));
    }

    #[rstest]
    fn test_fetch_clips_to_chromosome_end(reference: FastaReference) {
        assert_eq!(reference.fetch("chr2", 12, 100), Some(&b"TTTT"[..]));
        assert_eq!(reference.fetch("chr2", 50, 100), Some(&b""[..]));
    }

    #[rstest]
    fn test_fetch_missing_chromosome(reference: FastaReference) {
        assert_eq!(reference.fetch("chrX", 0, 10), None);
    }
}
