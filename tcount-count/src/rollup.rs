use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use tcount_core::models::{SUMMARY_FIELDS, SUMMARY_HEADER};
use tcount_core::stats::{per_million, rate};
use tcount_core::utils::get_dynamic_reader;

use crate::writing::create_output_file;

pub const ROLLUP_HEADER: &str = "gene_name\tlength\treadsCPM\tconversionRate\treferenceConvertibleBaseCount\tcoverageOnConvertibleBases\tconversionsOnConvertibleBases\treadCount\tconvertedReadCount\tmultimapperCount";

// column indices in a per-interval table row
const NAME: usize = 3;
const LENGTH: usize = 4;
const CONVERTIBLE: usize = 8;
const COVERAGE: usize = 9;
const CONVERSIONS: usize = 10;
const READS: usize = 11;
const CONVERTED_READS: usize = 12;
const MULTIMAPPERS: usize = 13;

///
/// A table row the roll-up could not use.
///
#[derive(Debug, Clone, PartialEq)]
pub enum RollupDiagnostic {
    MalformedRow { line: usize, fields: usize },
    UnparsableRow { line: usize, reason: String },
}

impl Display for RollupDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollupDiagnostic::MalformedRow { line, fields } => write!(
                f,
                "line {line}: expected {SUMMARY_FIELDS} fields, found {fields}"
            ),
            RollupDiagnostic::UnparsableRow { line, reason } => write!(f, "line {line}: {reason}"),
        }
    }
}

/// Summed per-transcript counters of one gene.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GeneAggregate {
    pub length: u64,
    pub convertible_base_count: u64,
    pub coverage_on_convertible: u64,
    pub conversions_on_convertible: u64,
    pub read_count: u64,
    pub converted_read_count: u64,
    pub multimapper_count: u64,
}

impl GeneAggregate {
    fn add(&mut self, other: &GeneAggregate) {
        self.length += other.length;
        self.convertible_base_count += other.convertible_base_count;
        self.coverage_on_convertible += other.coverage_on_convertible;
        self.conversions_on_convertible += other.conversions_on_convertible;
        self.read_count += other.read_count;
        self.converted_read_count += other.converted_read_count;
        self.multimapper_count += other.multimapper_count;
    }
}

/// One normalized output row.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRow {
    pub gene: String,
    pub reads_cpm: f64,
    pub conversion_rate: f64,
    pub totals: GeneAggregate,
}

impl GeneRow {
    pub fn as_string(&self) -> String {
        let t = &self.totals;
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.gene,
            t.length,
            self.reads_cpm,
            self.conversion_rate,
            t.convertible_base_count,
            t.coverage_on_convertible,
            t.conversions_on_convertible,
            t.read_count,
            t.converted_read_count,
            t.multimapper_count
        )
    }
}

fn parse_count(fields: &[&str], idx: usize) -> std::result::Result<u64, String> {
    let value = fields[idx]
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("cannot parse column {idx} '{}': {e}", fields[idx]))?;
    Ok(value.max(0) as u64)
}

///
/// Sums per-transcript table rows into per-gene totals. Rows are consumed
/// one at a time; normalization waits for [GeneRollup::rows] because the
/// total read count is only known after the last row.
///
#[derive(Debug, Default, Clone)]
pub struct GeneRollup {
    genes: BTreeMap<String, GeneAggregate>,
    total_read_count: u64,
    diagnostics: Vec<RollupDiagnostic>,
}

impl GeneRollup {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Consume every row of a per-interval table.
    ///
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut rollup = GeneRollup::new();
        for (idx, line) in reader.lines().enumerate() {
            rollup.add_line(idx + 1, &line?);
        }
        Ok(rollup)
    }

    ///
    /// Add one table line. Comment, blank and header lines are skipped;
    /// malformed rows are recorded as diagnostics and left out.
    ///
    pub fn add_line(&mut self, line_number: usize, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() || line.starts_with('#') || line == SUMMARY_HEADER {
            return;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != SUMMARY_FIELDS {
            self.report(RollupDiagnostic::MalformedRow {
                line: line_number,
                fields: fields.len(),
            });
            return;
        }

        match Self::parse_row(&fields) {
            Ok(row) => {
                self.total_read_count += row.read_count;
                self.genes
                    .entry(fields[NAME].trim().to_string())
                    .or_default()
                    .add(&row);
            }
            Err(reason) => self.report(RollupDiagnostic::UnparsableRow {
                line: line_number,
                reason,
            }),
        }
    }

    fn parse_row(fields: &[&str]) -> std::result::Result<GeneAggregate, String> {
        Ok(GeneAggregate {
            length: parse_count(fields, LENGTH)?,
            convertible_base_count: parse_count(fields, CONVERTIBLE)?,
            coverage_on_convertible: parse_count(fields, COVERAGE)?,
            conversions_on_convertible: parse_count(fields, CONVERSIONS)?,
            read_count: parse_count(fields, READS)?,
            converted_read_count: parse_count(fields, CONVERTED_READS)?,
            multimapper_count: parse_count(fields, MULTIMAPPERS)?,
        })
    }

    fn report(&mut self, diagnostic: RollupDiagnostic) {
        warn!("Skipping row, {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn total_read_count(&self) -> u64 {
        self.total_read_count
    }

    pub fn gene(&self, name: &str) -> Option<&GeneAggregate> {
        self.genes.get(name)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn diagnostics(&self) -> &[RollupDiagnostic] {
        &self.diagnostics
    }

    /// Normalized rows sorted by gene name.
    pub fn rows(&self) -> Vec<GeneRow> {
        self.genes
            .iter()
            .map(|(gene, totals)| GeneRow {
                gene: gene.clone(),
                reads_cpm: per_million(totals.read_count, self.total_read_count),
                conversion_rate: rate(
                    totals.conversions_on_convertible,
                    totals.coverage_on_convertible,
                ),
                totals: *totals,
            })
            .collect()
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", ROLLUP_HEADER)?;
        for row in self.rows() {
            writeln!(writer, "{}", row.as_string())?;
        }
        Ok(())
    }
}

///
/// Roll a per-interval table up to gene level.
///
/// # Arguments
/// - input: per-interval table, optionally gzipped
/// - output: gene-level table to write
///
/// # Returns
/// - the rows that were skipped
pub fn collapse(input: &Path, output: &Path) -> Result<Vec<RollupDiagnostic>> {
    let reader = get_dynamic_reader(input)
        .with_context(|| format!("Failed to open table: {:?}", input))?;
    let rollup = GeneRollup::from_reader(reader)?;

    let mut writer = create_output_file(output)
        .with_context(|| format!("Failed to create {:?}", output))?;
    rollup.write(&mut writer)?;
    writer.flush()?;

    info!(
        "Collapsed {:?} into {} genes ({} rows skipped)",
        input,
        rollup.len(),
        rollup.diagnostics().len()
    );

    Ok(rollup.diagnostics)
}
