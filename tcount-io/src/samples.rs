use std::io::BufRead;
use std::path::{Path, PathBuf};

use tcount_core::utils::{get_dynamic_reader, sample_name_from_path};

use crate::error::{Result, TcountIoError};

///
/// One sequencing sample: its alignment file plus the descriptive metadata
/// echoed into the header of every table written for it.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub bam: PathBuf,
    pub name: String,
    pub kind: String,
    pub time: String,
}

impl Sample {
    ///
    /// A sample named after its BAM file, without type or time information.
    ///
    pub fn from_bam(bam: &Path) -> Self {
        Sample {
            bam: bam.to_path_buf(),
            name: sample_name_from_path(bam),
            kind: String::new(),
            time: String::new(),
        }
    }
}

///
/// Read a sample sheet. Rows are `bam, name, type, time`, tab-separated in a
/// `.tsv` file or comma-separated in a `.csv` file. Any other extension, or a
/// row with fewer than four columns, is an error.
///
/// # Arguments
/// - path: path to the sample sheet
pub fn read_sample_sheet(path: &Path) -> anyhow::Result<Vec<Sample>> {
    let separator = sample_sheet_separator(path)?;
    let reader = get_dynamic_reader(path)?;
    Ok(parse_sample_sheet(reader, separator, path)?)
}

fn sample_sheet_separator(path: &Path) -> Result<char> {
    let file_name = path.to_string_lossy();
    if file_name.ends_with(".tsv") {
        Ok('\t')
    } else if file_name.ends_with(".csv") {
        Ok(',')
    } else {
        Err(TcountIoError::SampleSheet {
            path: file_name.to_string(),
            reason: "unknown file extension, expected .tsv or .csv".to_string(),
        })
    }
}

fn parse_sample_sheet<R: BufRead>(reader: R, separator: char, path: &Path) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.len() <= 1 {
            continue;
        }

        let cols: Vec<&str> = line.split(separator).map(|c| c.trim()).collect();
        if cols.len() < 4 {
            return Err(TcountIoError::SampleSheet {
                path: path.display().to_string(),
                reason: format!("expected 4 columns, found {} in '{}'", cols.len(), line),
            });
        }

        samples.push(Sample {
            bam: PathBuf::from(cols[0]),
            name: cols[1].to_string(),
            kind: cols[2].to_string(),
            time: cols[3].to_string(),
        });
    }

    Ok(samples)
}

///
/// Resolve the samples of a run from the command line inputs: either a single
/// sample sheet or a list of BAM files. A 1-based `index` keeps only that sample.
///
pub fn resolve_samples(inputs: &[PathBuf], index: Option<usize>) -> anyhow::Result<Vec<Sample>> {
    let samples = match inputs {
        [single] if sample_sheet_separator(single).is_ok() => read_sample_sheet(single)?,
        _ => inputs.iter().map(|bam| Sample::from_bam(bam)).collect(),
    };

    match index {
        None => Ok(samples),
        Some(index) if index == 0 || index > samples.len() => Err(TcountIoError::SampleIndex {
            index,
            count: samples.len(),
        }
        .into()),
        Some(index) => Ok(vec![samples[index - 1].clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data")
            .join(file_name)
    }

    #[rstest]
    fn test_read_sample_sheet() {
        let samples = read_sample_sheet(&get_test_path("samples.tsv")).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].name, "pulse");
        assert_eq!(samples[1].kind, "pulse");
        assert_eq!(samples[1].time, "60");
        assert_eq!(samples[0].bam, PathBuf::from("data/ctrl.bam"));
    }

    #[rstest]
    fn test_short_sample_sheet_row_is_fatal() {
        let result = read_sample_sheet(&get_test_path("samples_short.csv"));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_bam_inputs_become_samples() {
        let inputs = vec![PathBuf::from("a/ctrl.bam"), PathBuf::from("b/pulse.bam")];
        let samples = resolve_samples(&inputs, None).unwrap();
        assert_eq!(samples[0].name, "ctrl");
        assert_eq!(samples[1].kind, "");
    }

    #[rstest]
    #[case(Some(0))]
    #[case(Some(3))]
    fn test_sample_index_out_of_range(#[case] index: Option<usize>) {
        let inputs = vec![PathBuf::from("ctrl.bam"), PathBuf::from("pulse.bam")];
        assert!(resolve_samples(&inputs, index).is_err());
    }

    #[rstest]
    fn test_sample_index_selects_one() {
        let inputs = vec![PathBuf::from("ctrl.bam"), PathBuf::from("pulse.bam")];
        let samples = resolve_samples(&inputs, Some(2)).unwrap();
        assert_eq!(samples, vec![Sample::from_bam(Path::new("pulse.bam"))]);
    }
}
