//! PPTX backend: reading archival decks and writing the generated deck.
//!
//! Both directions go through the same two building blocks the OOXML format
//! is made of: a ZIP container (`zip`) and XML parts (`quick-xml`).

pub mod reader;
pub mod writer;

pub use reader::{PptxReader, RawPicture, RawSlide, RawTextFrame, SlideDeck};
pub use writer::{Align, DeckBuilder, MediaRef, Paragraph, Run, ShapeSpec, SlideSpec};
