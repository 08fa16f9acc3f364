use std::collections::BTreeMap;
use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tcount_core::models::Strand;

/// One covered convertible base of a strand track.
#[derive(Debug, Clone, PartialEq)]
pub struct BedgraphEntry<'a> {
    pub chrom: &'a str,
    pub position: u64,
    pub rate: f64,
}

///
/// Genome-wide per-base conversion rates of one sample, keyed by
/// `(chromosome, position, strand)`.
///
/// A repeated key keeps the last rate written. Output is ordered by chromosome,
/// then position, so tracks are reproducible between runs.
///
#[derive(Debug, Default, Clone)]
pub struct BedgraphAccumulator {
    rates: BTreeMap<(String, u64, Strand), f64>,
}

impl BedgraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chrom: &str, position: u64, strand: Strand, rate: f64) {
        self.rates.insert((chrom.to_string(), position, strand), rate);
    }

    pub fn get(&self, chrom: &str, position: u64, strand: Strand) -> Option<f64> {
        self.rates
            .get(&(chrom.to_string(), position, strand))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entries of one strand in chromosome/position order.
    pub fn entries(&self, strand: Strand) -> impl Iterator<Item = BedgraphEntry<'_>> {
        self.rates
            .iter()
            .filter(move |((_, _, s), _)| *s == strand)
            .map(|((chrom, position, _), rate)| BedgraphEntry {
                chrom: chrom.as_str(),
                position: *position,
                rate: *rate,
            })
    }

    /// Write one strand as `chrom  position  position+1  rate` rows.
    pub fn write_strand<W: Write>(&self, strand: Strand, writer: &mut W) -> io::Result<()> {
        for entry in self.entries(strand) {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                entry.chrom,
                entry.position,
                entry.position + 1,
                entry.rate
            )?;
        }
        Ok(())
    }

    ///
    /// Write the plus- and minus-strand tracks to their files.
    ///
    /// # Arguments
    /// - plus: output path of the `+` strand track
    /// - minus: output path of the `-` strand track
    pub fn write_tracks(&self, plus: &Path, minus: &Path) -> io::Result<()> {
        for (strand, path) in [(Strand::Plus, plus), (Strand::Minus, minus)] {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let mut buf = BufWriter::new(File::create(path)?);
            self.write_strand(strand, &mut buf)?;
            buf.flush()?;
        }
        Ok(())
    }
}
