use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use tcount_core::models::{SUMMARY_FIELDS, SUMMARY_HEADER};
use tcount_core::utils::{get_dynamic_reader, sample_name_from_path};

use crate::consts::{MERGE_DELIMITER, TABLE_SUFFIX};
use crate::error::CountError;
use crate::writing::create_output_file;

// chromosome, start, end and name lead every merged row
const KEY_FIELDS: usize = 4;

///
/// Sample name of a per-interval table, its file name without the table suffix.
///
pub fn table_sample_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    match file_name.strip_suffix(TABLE_SUFFIX) {
        Some(name) => name.to_string(),
        None => sample_name_from_path(path),
    }
}

fn data_rows<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line == SUMMARY_HEADER {
            continue;
        }
        rows.push(line.split('\t').map(str::to_string).collect());
    }
    Ok(rows)
}

///
/// Join one column of several per-interval tables side by side. Rows are
/// aligned by position; tables that run out early contribute empty cells.
///
/// # Arguments
/// - tables: `(sample name, table reader)` pairs, in output column order
/// - column: index of the column to collect
/// - writer: destination of the `;`-separated table
pub fn merge_readers<R: BufRead, W: Write>(
    tables: Vec<(String, R)>,
    column: usize,
    writer: &mut W,
) -> Result<()> {
    if column >= SUMMARY_FIELDS {
        return Err(CountError::ColumnOutOfRange {
            column,
            fields: SUMMARY_FIELDS,
        }
        .into());
    }

    let mut names = Vec::with_capacity(tables.len());
    let mut columns = Vec::with_capacity(tables.len());
    for (name, reader) in tables {
        names.push(name);
        columns.push(data_rows(reader)?);
    }

    let delimiter = MERGE_DELIMITER.to_string();
    let mut header = vec!["chr", "start", "end", "gene"];
    header.extend(names.iter().map(String::as_str));
    writeln!(writer, "{}", header.join(&delimiter))?;

    let depth = columns.iter().map(Vec::len).max().unwrap_or(0);
    for idx in 0..depth {
        let mut cells: Vec<&str> = Vec::with_capacity(KEY_FIELDS + columns.len());

        let lead = columns.first().and_then(|rows| rows.get(idx));
        for key in 0..KEY_FIELDS {
            cells.push(lead.and_then(|row| row.get(key)).map_or("", String::as_str));
        }
        for rows in &columns {
            let cell = rows.get(idx).and_then(|row| row.get(column));
            cells.push(cell.map_or("", String::as_str));
        }

        writeln!(writer, "{}", cells.join(&delimiter))?;
    }

    Ok(())
}

///
/// Merge column `column` of the per-interval tables into `output`.
///
pub fn merge_tables(tables: &[PathBuf], column: usize, output: &Path) -> Result<()> {
    let mut readers = Vec::with_capacity(tables.len());
    for path in tables {
        let reader = get_dynamic_reader(path)
            .with_context(|| format!("Failed to open table: {:?}", path))?;
        readers.push((table_sample_name(path), reader));
    }

    let mut writer = create_output_file(output)
        .with_context(|| format!("Failed to create {:?}", output))?;
    merge_readers(readers, column, &mut writer)?;
    writer.flush()?;

    info!("Merged column {} of {} tables into {:?}", column, tables.len(), output);
    Ok(())
}
