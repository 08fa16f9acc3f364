pub mod interval;
pub mod read;
pub mod summary;

// re-export for cleaner imports
pub use self::interval::{GenomicInterval, Strand};
pub use self::read::{Direction, Mismatch, ReadRecord};
pub use self::summary::{IntervalSummary, SUMMARY_FIELDS, SUMMARY_HEADER};
