//! Corpus indexing and slide extraction.
//!
//! The index is built once from an explicit, ordered list of root
//! directories and is immutable afterwards; it never mutates the corpus and
//! can be shared read-only across compose calls.

pub mod extract;
pub mod index;

pub use extract::{Extraction, SlideExtractor};
pub use index::{CorpusIndex, HymnLocation, IndexOptions, IndexRecord};
