//! Classified reads from an indexed BAM file.
//!
//! Each alignment overlapping an interval is walked along its CIGAR against the
//! reference: aligned bases that disagree with the reference become mismatches,
//! and the ones matching the labelling chemistry (T>C on forward reads, A>G on
//! reverse reads) are flagged as conversions unless a known polymorphism sits there.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use noodles::bam;
use noodles::bgzf;
use noodles::core::Region;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;

use tcount_core::models::{Direction, GenomicInterval, Mismatch, ReadRecord, Strand};
use tcount_core::traits::{ReadIter, ReadSource, ReferenceSource};

use crate::error::TcountIoError;
use crate::known_sites::KnownSites;

/// Header comment prefix carrying the version of the filtered alignment artifact.
pub const BAM_VERSION_COMMENT: &str = "bam_version:";

/// Records inspected when estimating the maximum read length.
pub const READ_LENGTH_SAMPLE_SIZE: usize = 10_000;

/// Largest tolerated spread between the shortest and longest sampled read.
pub const MAX_READ_LENGTH_SPREAD: usize = 100;

/// Thresholds applied while classifying reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    /// minimum base quality for a mismatch to be reported
    pub min_base_quality: u8,
    /// conversions needed for a read to count as converted
    pub conversion_threshold: u32,
    /// widens the reference window around each interval
    pub max_read_length: u32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        ClassifierParams {
            min_base_quality: 27,
            conversion_threshold: 1,
            max_read_length: 100,
        }
    }
}

/// CIGAR operation reduced to how it moves along the read and the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentOp {
    /// M, = and X: consumes read and reference
    Aligned(usize),
    /// I and S: consumes the read only
    ReadOnly(usize),
    /// D and N: consumes the reference only
    ReferenceOnly(usize),
    /// H and P
    Neither,
}

impl From<(Kind, usize)> for AlignmentOp {
    fn from((kind, len): (Kind, usize)) -> Self {
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => AlignmentOp::Aligned(len),
            Kind::Insertion | Kind::SoftClip => AlignmentOp::ReadOnly(len),
            Kind::Deletion | Kind::Skip => AlignmentOp::ReferenceOnly(len),
            Kind::HardClip | Kind::Pad => AlignmentOp::Neither,
        }
    }
}

///
/// One alignment, decoded but not yet compared to the reference.
///
#[derive(Debug, Clone)]
pub struct Alignment {
    pub direction: Direction,
    /// 0-based position of the first aligned reference base
    pub reference_start: u64,
    pub ops: Vec<AlignmentOp>,
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
    pub hit_count: Option<i64>,
}

///
/// Everything needed to classify the reads of one interval.
///
pub struct ClassifyContext<'a> {
    pub chrom: String,
    pub interval_start: u64,
    /// reference bases and the genomic position of the first one
    pub window: Option<(u64, &'a [u8])>,
    pub known_sites: Option<&'a KnownSites>,
    pub params: ClassifierParams,
}

impl ClassifyContext<'_> {
    fn reference_base(&self, position: u64) -> Option<u8> {
        let (window_start, bases) = self.window?;
        let offset = position.checked_sub(window_start)? as usize;
        bases.get(offset).copied()
    }

    fn is_known_site(&self, position: u64, strand: Strand) -> bool {
        self.known_sites
            .is_some_and(|sites| sites.is_known(&self.chrom, position, strand))
    }
}

fn is_nucleotide(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

fn is_conversion(direction: Direction, reference_base: u8, read_base: u8) -> bool {
    match direction {
        Direction::Forward => reference_base == b'T' && read_base == b'C',
        Direction::Reverse => reference_base == b'A' && read_base == b'G',
    }
}

///
/// Compare one alignment to the reference and produce its classified read.
///
/// # Arguments
/// - alignment: decoded alignment
/// - context: interval, reference window, known sites and thresholds
pub fn classify_alignment(alignment: &Alignment, context: &ClassifyContext) -> ReadRecord {
    let conversion_strand = match alignment.direction {
        Direction::Forward => Strand::Plus,
        Direction::Reverse => Strand::Minus,
    };

    let mut mismatches = Vec::new();
    let mut conversion_count = 0u32;
    let mut reference_position = alignment.reference_start;
    let mut read_position = 0usize;

    for op in alignment.ops.iter() {
        match *op {
            AlignmentOp::Aligned(len) => {
                for i in 0..len {
                    let genomic = reference_position + i as u64;
                    let Some(read_base) = alignment.bases.get(read_position + i) else {
                        break;
                    };
                    let read_base = read_base.to_ascii_uppercase();
                    let Some(reference_base) = context.reference_base(genomic) else {
                        continue;
                    };

                    if read_base == reference_base
                        || !is_nucleotide(read_base)
                        || !is_nucleotide(reference_base)
                    {
                        continue;
                    }

                    let passes_quality = alignment
                        .qualities
                        .get(read_position + i)
                        .is_none_or(|q| *q >= context.params.min_base_quality);
                    if !passes_quality {
                        continue;
                    }

                    let conversion = is_conversion(alignment.direction, reference_base, read_base);
                    if conversion && context.is_known_site(genomic, conversion_strand) {
                        continue;
                    }

                    if conversion {
                        conversion_count += 1;
                    }
                    mismatches.push(Mismatch {
                        reference_position: genomic as i64 - context.interval_start as i64,
                        is_conversion: conversion,
                    });
                }
                reference_position += len as u64;
                read_position += len;
            }
            AlignmentOp::ReadOnly(len) => read_position += len,
            AlignmentOp::ReferenceOnly(len) => reference_position += len as u64,
            AlignmentOp::Neither => {}
        }
    }

    ReadRecord {
        direction: alignment.direction,
        start_ref_pos: alignment.reference_start as i64 - context.interval_start as i64,
        end_ref_pos: reference_position as i64 - context.interval_start as i64,
        mismatches,
        is_multimapper: alignment.hit_count.is_some_and(|n| n > 1),
        conversion_count,
        is_converted: conversion_count >= context.params.conversion_threshold,
    }
}

///
/// Decode a BAM record. `Ok(None)` for unmapped records.
///
pub fn decode_record(record: &bam::Record) -> Result<Option<Alignment>> {
    let flags = record.flags();
    if flags.is_unmapped() {
        return Ok(None);
    }

    let Some(start) = record.alignment_start().transpose()? else {
        return Ok(None);
    };

    let mut ops = Vec::new();
    for op in record.cigar().iter() {
        let op = op?;
        ops.push(AlignmentOp::from((op.kind(), op.len())));
    }

    let hit_count = match record.data().get(&Tag::ALIGNMENT_HIT_COUNT).transpose()? {
        Some(value) => value.as_int(),
        None => None,
    };

    Ok(Some(Alignment {
        direction: if flags.is_reverse_complemented() {
            Direction::Reverse
        } else {
            Direction::Forward
        },
        reference_start: (start.get() - 1) as u64,
        ops,
        bases: record.sequence().iter().collect(),
        qualities: record.quality_scores().as_ref().to_vec(),
        hit_count,
    }))
}

///
/// Read source over an indexed BAM file.
///
pub struct BamReadSource<'r> {
    reader: bam::io::IndexedReader<bgzf::Reader<File>>,
    header: sam::Header,
    reference: &'r dyn ReferenceSource,
    known_sites: Option<KnownSites>,
    params: ClassifierParams,
}

impl<'r> BamReadSource<'r> {
    ///
    /// Open a coordinate-sorted BAM file with its `.bai` index.
    ///
    /// # Arguments
    /// - path: path to the BAM file
    /// - reference: reference the reads were aligned against
    /// - known_sites: polymorphisms to exclude from conversion counting
    /// - params: classification thresholds
    pub fn open(
        path: &Path,
        reference: &'r dyn ReferenceSource,
        known_sites: Option<KnownSites>,
        params: ClassifierParams,
    ) -> Result<Self> {
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .with_context(|| format!("Failed to open indexed BAM file: {:?}", path))?;
        let header = reader.read_header()?;

        Ok(BamReadSource {
            reader,
            header,
            reference,
            known_sites,
            params,
        })
    }

    ///
    /// Version tag of the filtered alignment artifact, from a `@CO bam_version:<v>` header line.
    ///
    pub fn artifact_version(&self) -> Option<String> {
        let comments = self
            .header
            .comments()
            .iter()
            .map(|comment| String::from_utf8_lossy(comment).to_string());
        bam_version_from_comments(comments)
    }
}

pub fn bam_version_from_comments<I, S>(comments: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    comments.into_iter().find_map(|comment| {
        comment
            .as_ref()
            .trim()
            .strip_prefix(BAM_VERSION_COMMENT)
            .map(|v| v.trim().to_string())
    })
}

impl ReadSource for BamReadSource<'_> {
    fn reads_in_interval<'a>(&'a mut self, interval: &GenomicInterval) -> Result<ReadIter<'a>> {
        if interval.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let region: Region = interval
            .region_string()
            .parse()
            .with_context(|| format!("Invalid region for interval {}", interval.name))?;

        let padding = self.params.max_read_length as u64;
        let window_start = interval.start.saturating_sub(padding);
        let window = self
            .reference
            .fetch(&interval.chrom, window_start, interval.stop + padding)
            .map(|bases| (window_start, bases));

        let context = ClassifyContext {
            chrom: interval.chrom.clone(),
            interval_start: interval.start,
            window,
            known_sites: self.known_sites.as_ref(),
            params: self.params,
        };

        let query = match self.reader.query(&self.header, &region) {
            Ok(query) => query,
            Err(err) => {
                debug!("Region {} not found in BAM, no reads: {}", region, err);
                return Ok(Box::new(std::iter::empty()));
            }
        };

        Ok(Box::new(query.filter_map(move |result| {
            let record = match result {
                Ok(record) => record,
                Err(err) => return Some(Err(err.into())),
            };
            match decode_record(&record) {
                Ok(Some(alignment)) => Some(Ok(classify_alignment(&alignment, &context))),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        })))
    }
}

///
/// Number of mapped, primary, non-supplementary records in a BAM file.
///
pub fn count_mapped_reads(path: &Path) -> Result<u64> {
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("Failed to open BAM file: {:?}", path))?;
    reader.read_header()?;

    let mut mapped = 0u64;
    for result in reader.records() {
        let record = result?;
        let flags = record.flags();
        if !flags.is_unmapped() && !flags.is_secondary() && !flags.is_supplementary() {
            mapped += 1;
        }
    }

    Ok(mapped)
}

///
/// Longest read among the first mapped records of a BAM file. Fails when
/// the sampled lengths are too far apart for a single window size.
///
pub fn estimate_max_read_length(path: &Path) -> Result<u32> {
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("Failed to open BAM file: {:?}", path))?;
    reader.read_header()?;

    let mut lengths = Vec::with_capacity(READ_LENGTH_SAMPLE_SIZE);
    for result in reader.records() {
        let record = result?;
        if record.flags().is_unmapped() {
            continue;
        }
        lengths.push(record.sequence().len());
        if lengths.len() >= READ_LENGTH_SAMPLE_SIZE {
            break;
        }
    }

    Ok(max_read_length_from(&lengths)?)
}

pub fn max_read_length_from(lengths: &[usize]) -> Result<u32, TcountIoError> {
    let min = lengths.iter().copied().min().unwrap_or(0);
    let max = lengths.iter().copied().max().unwrap_or(0);

    if max - min > MAX_READ_LENGTH_SPREAD {
        return Err(TcountIoError::ReadLengthSpread {
            min,
            max,
            limit: MAX_READ_LENGTH_SPREAD,
        });
    }

    Ok(max as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    // reference window starting at genomic position 100
    const WINDOW: &[u8] = b"ACGTTTAAAGTC";

    fn context<'a>(known_sites: Option<&'a KnownSites>) -> ClassifyContext<'a> {
        ClassifyContext {
            chrom: "chr1".to_string(),
            interval_start: 102,
            window: Some((100, WINDOW)),
            known_sites,
            params: ClassifierParams {
                min_base_quality: 20,
                conversion_threshold: 1,
                max_read_length: 10,
            },
        }
    }

    fn alignment(direction: Direction, bases: &[u8], ops: Vec<AlignmentOp>) -> Alignment {
        Alignment {
            direction,
            reference_start: 100,
            ops,
            bases: bases.to_vec(),
            qualities: vec![30; bases.len()],
            hit_count: Some(1),
        }
    }

    #[rstest]
    fn test_forward_t_to_c_is_a_conversion() {
        // ref ACGTTTAA, read has C at genomic 104
        let read = alignment(Direction::Forward, b"ACGTCTAA", vec![AlignmentOp::Aligned(8)]);
        let record = classify_alignment(&read, &context(None));

        assert_eq!(record.start_ref_pos, -2);
        assert_eq!(record.end_ref_pos, 6);
        assert_eq!(
            record.mismatches,
            vec![Mismatch {
                reference_position: 2,
                is_conversion: true
            }]
        );
        assert_eq!(record.conversion_count, 1);
        assert!(record.is_converted);
        assert!(!record.is_multimapper);
    }

    #[rstest]
    fn test_reverse_reads_convert_a_to_g() {
        // genomic 106 is A, read shows G; genomic 104 T>C is not a conversion on reverse reads
        let read = alignment(Direction::Reverse, b"ACGTCTGA", vec![AlignmentOp::Aligned(8)]);
        let record = classify_alignment(&read, &context(None));

        assert_eq!(record.mismatches.len(), 2);
        assert_eq!(record.conversion_count, 1);
        assert!(record.mismatches.iter().any(|m| m.reference_position == 4 && m.is_conversion));
        assert!(record.mismatches.iter().any(|m| m.reference_position == 2 && !m.is_conversion));
    }

    #[rstest]
    fn test_low_quality_mismatch_is_dropped() {
        let mut read = alignment(Direction::Forward, b"ACGTCTAA", vec![AlignmentOp::Aligned(8)]);
        read.qualities[4] = 5;
        let record = classify_alignment(&read, &context(None));
        assert!(record.mismatches.is_empty());
        assert!(!record.is_converted);
    }

    #[rstest]
    fn test_known_site_masks_conversion() {
        let mut sites = KnownSites::default();
        sites.insert("chr1", 104, Strand::Plus);
        let read = alignment(Direction::Forward, b"ACGTCTAA", vec![AlignmentOp::Aligned(8)]);
        let record = classify_alignment(&read, &context(Some(&sites)));
        assert_eq!(record.conversion_count, 0);
        assert!(record.mismatches.is_empty());
    }

    #[rstest]
    fn test_cigar_moves_read_and_reference() {
        // 2M 1I 2M 3D 2M: deletion widens the span, insertion shifts the read
        let read = alignment(
            Direction::Forward,
            b"ACNGTAA",
            vec![
                AlignmentOp::Aligned(2),
                AlignmentOp::ReadOnly(1),
                AlignmentOp::Aligned(2),
                AlignmentOp::ReferenceOnly(3),
                AlignmentOp::Aligned(2),
            ],
        );
        let record = classify_alignment(&read, &context(None));
        assert_eq!(record.end_ref_pos - record.start_ref_pos, 9);
        assert!(record.mismatches.is_empty());
    }

    #[rstest]
    fn test_multimapper_from_hit_count() {
        let mut read = alignment(Direction::Forward, b"ACGT", vec![AlignmentOp::Aligned(4)]);
        read.hit_count = Some(3);
        assert!(classify_alignment(&read, &context(None)).is_multimapper);
    }

    #[rstest]
    fn test_bam_version_from_comments() {
        let comments = vec!["produced by mapper", "bam_version: 3"];
        assert_eq!(bam_version_from_comments(comments), Some("3".to_string()));
        assert_eq!(bam_version_from_comments(Vec::<String>::new()), None);
    }

    #[rstest]
    fn test_max_read_length_from() {
        assert_eq!(max_read_length_from(&[48, 50, 51]).unwrap(), 51);
        assert!(max_read_length_from(&[20, 150]).is_err());
    }

    mod indexed_bam {
        use super::*;
        use pretty_assertions::assert_eq;

        use std::num::NonZeroUsize;

        use noodles::core::Position;
        use noodles::csi::binning_index::Indexer;
        use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
        use noodles::sam::alignment::Record as _;
        use noodles::sam::alignment::RecordBuf;
        use noodles::sam::alignment::io::Write as _;
        use noodles::sam::alignment::record::Flags;
        use noodles::sam::alignment::record::cigar::Op;
        use noodles::sam::alignment::record_buf::data::field::Value;
        use noodles::sam::alignment::record_buf::{QualityScores, Sequence};
        use noodles::sam::header::record::value::{Map, map::ReferenceSequence};

        use crate::reference::FastaReference;

        // chr1 of tests/data/ref.fa
        const CHR1: &[u8] = b"ACGTTTTTTTTTTTACGAAAAAAAAAAC";

        fn mapped(name: &str, start: usize, bases: &[u8], flags: Flags, hits: u8) -> RecordBuf {
            RecordBuf::builder()
                .set_name(name)
                .set_flags(flags)
                .set_reference_sequence_id(0)
                .set_alignment_start(Position::try_from(start).unwrap())
                .set_cigar([Op::new(Kind::Match, bases.len())].into_iter().collect())
                .set_sequence(Sequence::from(bases.to_vec()))
                .set_quality_scores(QualityScores::from(vec![40; bases.len()]))
                .set_data(
                    [(Tag::ALIGNMENT_HIT_COUNT, Value::UInt8(hits))]
                        .into_iter()
                        .collect(),
                )
                .build()
        }

        // coordinate-sorted BAM with a .bai next to it
        fn write_indexed_bam(path: &Path, comments: &[&str], records: &[RecordBuf]) {
            let mut builder = sam::Header::builder().add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::try_from(CHR1.len()).unwrap()),
            );
            for comment in comments {
                builder = builder.add_comment(*comment);
            }
            let header = builder.build();

            let mut writer = bam::io::Writer::new(File::create(path).unwrap());
            writer.write_header(&header).unwrap();
            for record in records {
                writer.write_alignment_record(&header, record).unwrap();
            }
            writer.try_finish().unwrap();
            drop(writer);

            let mut reader = bam::io::Reader::new(File::open(path).unwrap());
            reader.read_header().unwrap();

            let mut indexer = Indexer::default();
            let mut record = bam::Record::default();
            let mut chunk_start = reader.get_ref().virtual_position();
            while reader.read_record(&mut record).unwrap() != 0 {
                let chunk_end = reader.get_ref().virtual_position();
                let context = match (
                    record.reference_sequence_id().transpose().unwrap(),
                    record.alignment_start().transpose().unwrap(),
                    record.alignment_end().transpose().unwrap(),
                ) {
                    (Some(id), Some(start), Some(end)) => {
                        Some((id, start, end, !record.flags().is_unmapped()))
                    }
                    _ => None,
                };
                indexer
                    .add_record(context, Chunk::new(chunk_start, chunk_end))
                    .unwrap();
                chunk_start = chunk_end;
            }

            let index = indexer.build(header.reference_sequences().len());
            bam::bai::write(format!("{}.bai", path.display()), &index).unwrap();
        }

        #[fixture]
        fn reference() -> FastaReference {
            FastaReference::from_sequences([("chr1", CHR1.to_vec())])
        }

        #[fixture]
        fn bam_dir() -> tempfile::TempDir {
            let tempdir = tempfile::tempdir().unwrap();
            write_indexed_bam(
                &tempdir.path().join("pulse.bam"),
                &["bam_version:0.2.4"],
                &[
                    // T>C at chr1:6, second hit of a multimapper
                    mapped("fwd", 5, b"TTCTTTTTTT", Flags::default(), 2),
                    // A>G at chr1:21
                    mapped("rev", 18, b"AAAAGAAAAA", Flags::REVERSE_COMPLEMENTED, 1),
                ],
            );
            tempdir
        }

        fn params() -> ClassifierParams {
            ClassifierParams {
                max_read_length: 10,
                ..ClassifierParams::default()
            }
        }

        #[rstest]
        fn test_reads_in_interval_from_bam(bam_dir: tempfile::TempDir, reference: FastaReference) {
            let path = bam_dir.path().join("pulse.bam");
            let mut source = BamReadSource::open(&path, &reference, None, params()).unwrap();

            let utr_a = GenomicInterval::new("chr1", 4, 14, Some("+"), "utrA").unwrap();
            let reads: Vec<ReadRecord> = source
                .reads_in_interval(&utr_a)
                .unwrap()
                .map(|r| r.unwrap())
                .collect();
            assert_eq!(
                reads,
                vec![ReadRecord {
                    direction: Direction::Forward,
                    start_ref_pos: 0,
                    end_ref_pos: 10,
                    mismatches: vec![Mismatch {
                        reference_position: 2,
                        is_conversion: true
                    }],
                    is_multimapper: true,
                    conversion_count: 1,
                    is_converted: true,
                }]
            );

            let utr_b = GenomicInterval::new("chr1", 17, 27, Some("-"), "utrB").unwrap();
            let reads: Vec<ReadRecord> = source
                .reads_in_interval(&utr_b)
                .unwrap()
                .map(|r| r.unwrap())
                .collect();
            assert_eq!(reads.len(), 1);
            assert_eq!(reads[0].direction, Direction::Reverse);
            assert_eq!((reads[0].start_ref_pos, reads[0].end_ref_pos), (0, 10));
            assert_eq!(
                reads[0].mismatches,
                vec![Mismatch {
                    reference_position: 4,
                    is_conversion: true
                }]
            );
            assert!(!reads[0].is_multimapper);
        }

        #[rstest]
        fn test_zero_length_interval_has_no_reads(
            bam_dir: tempfile::TempDir,
            reference: FastaReference,
        ) {
            let path = bam_dir.path().join("pulse.bam");
            let mut source = BamReadSource::open(&path, &reference, None, params()).unwrap();

            let point = GenomicInterval::new("chr1", 8, 8, Some("+"), "point").unwrap();
            assert_eq!(source.reads_in_interval(&point).unwrap().count(), 0);
        }

        #[rstest]
        fn test_unknown_chromosome_has_no_reads(
            bam_dir: tempfile::TempDir,
            reference: FastaReference,
        ) {
            let path = bam_dir.path().join("pulse.bam");
            let mut source = BamReadSource::open(&path, &reference, None, params()).unwrap();

            let elsewhere = GenomicInterval::new("chrX", 0, 10, Some("+"), "utrC").unwrap();
            assert_eq!(source.reads_in_interval(&elsewhere).unwrap().count(), 0);
        }

        #[rstest]
        fn test_bam_file_statistics(bam_dir: tempfile::TempDir, reference: FastaReference) {
            let path = bam_dir.path().join("pulse.bam");

            assert_eq!(count_mapped_reads(&path).unwrap(), 2);
            assert_eq!(estimate_max_read_length(&path).unwrap(), 10);

            let source = BamReadSource::open(&path, &reference, None, params()).unwrap();
            assert_eq!(source.artifact_version(), Some("0.2.4".to_string()));
        }

        #[rstest]
        fn test_open_without_index_fails(reference: FastaReference) {
            let tempdir = tempfile::tempdir().unwrap();
            let path = tempdir.path().join("missing.bam");
            assert!(BamReadSource::open(&path, &reference, None, params()).is_err());
        }
    }
}
