//! Core domain types, request parsing, text classification, and title
//! heuristics for church service deck assembly.

pub mod classify;
pub mod error;
pub mod genlog;
pub mod heuristic;
pub mod normalize;
pub mod request;
pub mod types;

pub use classify::{classify_text, Classification, LabelVocabulary};
pub use error::{Error, Result};
pub use genlog::GenerationLog;
pub use heuristic::{derive_title, TitleOptions};
pub use normalize::title_key;
pub use request::ServiceRequest;
pub use types::{
    EmbeddedImage, ExtractedContent, HymnIdentifier, RequestEntry, Role, SectionLabel,
    SummaryEntry, TextBlock, NOT_FOUND_MARKER,
};
