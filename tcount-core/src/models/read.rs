/// Orientation of an alignment relative to the reference.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub enum Direction {
    Forward,
    Reverse,
}

///
/// A read base that disagrees with the reference. `reference_position` is an
/// offset from the start of the interval being scanned and may fall outside it.
///
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Mismatch {
    pub reference_position: i64,
    /// T>C on a forward read or A>G on a reverse read
    pub is_conversion: bool,
}

///
/// One classified read overlapping an interval. Coordinates are offsets from
/// the interval start; `[start_ref_pos, end_ref_pos)` is the aligned reference span.
///
#[derive(PartialEq, Debug, Clone)]
pub struct ReadRecord {
    pub direction: Direction,
    pub start_ref_pos: i64,
    pub end_ref_pos: i64,
    pub mismatches: Vec<Mismatch>,
    pub is_multimapper: bool,
    pub conversion_count: u32,
    /// enough conversions to count as a converted (newly synthesized) read
    pub is_converted: bool,
}

impl ReadRecord {
    ///
    /// Drop every conversion-related observation while keeping the span, so
    /// the read still contributes coverage.
    ///
    pub fn clear_conversions(&mut self) {
        self.conversion_count = 0;
        self.mismatches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_clear_conversions_keeps_span() {
        let mut read = ReadRecord {
            direction: Direction::Forward,
            start_ref_pos: -3,
            end_ref_pos: 47,
            mismatches: vec![Mismatch {
                reference_position: 4,
                is_conversion: true,
            }],
            is_multimapper: false,
            conversion_count: 1,
            is_converted: false,
        };

        read.clear_conversions();

        assert_eq!(read.conversion_count, 0);
        assert!(read.mismatches.is_empty());
        assert_eq!((read.start_ref_pos, read.end_ref_pos), (-3, 47));
    }
}
