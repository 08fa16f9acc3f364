//! Small indexed BAM files for tests.

use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use noodles::bam;
use noodles::core::Position;
use noodles::csi::binning_index::Indexer;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::sam;
use noodles::sam::alignment::Record as _;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::{Op, op::Kind};
use noodles::sam::alignment::record_buf::{QualityScores, Sequence};
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};

// length of chr1 in tests/data/ref.fa
const CHR1_LENGTH: usize = 28;

fn mapped(name: &str, start: usize, bases: &[u8], flags: Flags) -> RecordBuf {
    RecordBuf::builder()
        .set_name(name)
        .set_flags(flags)
        .set_reference_sequence_id(0)
        .set_alignment_start(Position::try_from(start).unwrap())
        .set_cigar([Op::new(Kind::Match, bases.len())].into_iter().collect())
        .set_sequence(Sequence::from(bases.to_vec()))
        .set_quality_scores(QualityScores::from(vec![40; bases.len()]))
        .build()
}

///
/// Write `<dir>/<name>.bam` and its `.bai` against chr1 of `tests/data/ref.fa`:
/// one forward read over utrA with a T>C at chr1:6 and one reverse read over
/// utrB with an A>G at chr1:21.
///
pub fn write_pulse_bam(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.bam"));
    let header = sam::Header::builder()
        .add_reference_sequence(
            "chr1",
            Map::<ReferenceSequence>::new(NonZeroUsize::try_from(CHR1_LENGTH).unwrap()),
        )
        .add_comment("bam_version:0.2.4")
        .build();

    let records = [
        mapped("fwd", 5, b"TTCTTTTTTT", Flags::default()),
        mapped("rev", 18, b"AAAAGAAAAA", Flags::REVERSE_COMPLEMENTED),
    ];

    let mut writer = bam::io::Writer::new(File::create(&path).unwrap());
    writer.write_header(&header).unwrap();
    for record in &records {
        writer.write_alignment_record(&header, record).unwrap();
    }
    writer.try_finish().unwrap();
    drop(writer);

    let mut reader = bam::io::Reader::new(File::open(&path).unwrap());
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

    path
}
