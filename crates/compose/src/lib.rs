//! Deck composition: drives the index and extractor per request entry and
//! assembles the ordered output deck, the summary slide, and the generation
//! log.

pub mod composer;
pub mod slides;
pub mod summary;

pub use composer::{Composer, ComposerConfig, Composition};
