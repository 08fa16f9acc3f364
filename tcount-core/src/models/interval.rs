use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::IntervalError;

/// Annotated strand of an interval.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    ///
    /// Reference base that can show a conversion on this strand: `T` on the
    /// plus strand, `A` on the minus strand (reads there report A>G).
    ///
    pub fn convertible_base(&self) -> u8 {
        match self {
            Strand::Plus => b'T',
            Strand::Minus => b'A',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        }
    }
}

impl FromStr for Strand {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            other => Err(IntervalError::MissingStrand(other.to_string())),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// A stranded, named interval on the reference, 0-based and half-open.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub stop: u64,
    pub strand: Strand,
    pub name: String,
}

impl GenomicInterval {
    ///
    /// Build an interval from raw annotation fields, rejecting the inputs that
    /// cannot be counted: a missing strand, a negative start, or a stop before the start.
    ///
    /// # Arguments
    /// - chrom: chromosome name
    /// - start: 0-based start
    /// - stop: exclusive end
    /// - strand: `+`/`-`, or `None` when the annotation has no strand column
    /// - name: interval name
    pub fn new(
        chrom: &str,
        start: i64,
        stop: i64,
        strand: Option<&str>,
        name: &str,
    ) -> Result<Self, IntervalError> {
        let describe = || format!("{}\t{}\t{}\t{}", chrom, start, stop, name);

        let strand = match strand {
            Some(s) => Strand::from_str(s).map_err(|_| IntervalError::MissingStrand(describe()))?,
            None => return Err(IntervalError::MissingStrand(describe())),
        };

        if start < 0 {
            return Err(IntervalError::NegativeStart(describe()));
        }
        if stop < start {
            return Err(IntervalError::InvalidCoordinates(describe()));
        }

        Ok(GenomicInterval {
            chrom: chrom.to_string(),
            start: start as u64,
            stop: stop as u64,
            strand,
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        (self.stop - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }

    ///
    /// 1-based, inclusive `chr:start-end` notation used for region queries.
    ///
    pub fn region_string(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start + 1, self.stop)
    }

    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.chrom, self.start, self.stop, self.name, self.strand
        )
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
