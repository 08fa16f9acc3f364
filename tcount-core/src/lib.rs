//! # tcount-core
//!
//! Shared data model for counting nucleotide conversions over stranded genomic
//! intervals: annotated intervals, classified reads, per-interval summaries and
//! the traits that let the counting engine consume reads and reference bases
//! without caring where they come from.
pub mod errors;
pub mod models;
pub mod stats;
pub mod traits;
pub mod utils;

// re-export for cleaner imports
pub use errors::*;
pub use models::*;
pub use traits::*;
