//! # Input utilities for tcount.
//!
//! Everything the counting engine reads from disk goes through this crate:
//! stranded BED annotations, the FASTA reference, per-sample known polymorphic
//! sites, sample sheets, and BAM alignments turned into classified reads.
//!
pub mod bam;
pub mod bed;
pub mod error;
pub mod known_sites;
pub mod reference;
pub mod samples;

// re-expose core functions
pub use bam::*;
pub use bed::*;
pub use error::*;
pub use known_sites::*;
pub use reference::*;
pub use samples::*;
