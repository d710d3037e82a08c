//! Slide extraction: resolved source slides -> content-neutral values.
//!
//! The index holds references (file path + slide indices); the extractor
//! opens the source file only at extraction time and copies everything it
//! needs — text by classified block, images by byte value — so composition
//! never depends on the corpus staying mounted.

use hymn_core::classify::{classify_text, Classification, LabelVocabulary};
use hymn_core::{EmbeddedImage, ExtractedContent, Result, Role, TextBlock};
use hymn_pptx::reader::{PptxReader, RawSlide};

use crate::index::HymnLocation;

/// Result of extracting one hymn's slide span.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Usable content slides, in adjacency order.
    pub slides: Vec<ExtractedContent>,
    /// Slides skipped for having no classifiable text (archival intro/divider
    /// art that must not leak into the generated deck).
    pub skipped: usize,
}

/// Extracts content-neutral slide values from the corpus.
#[derive(Debug, Clone, Default)]
pub struct SlideExtractor {
    vocabulary: LabelVocabulary,
}

impl SlideExtractor {
    pub fn new(vocabulary: LabelVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Extract every content slide of a resolved hymn.
    pub fn extract(&self, location: &HymnLocation) -> Result<Extraction> {
        let deck = PptxReader::new().open(&location.file)?;
        let mut extraction = Extraction::default();

        for &idx in &location.content_slides {
            let Some(slide) = deck.slides.get(idx) else {
                log::warn!(
                    "{}: slide {} out of range, corpus changed since indexing?",
                    location.file.display(),
                    idx + 1
                );
                continue;
            };
            match self.extract_slide(slide) {
                Some(content) => extraction.slides.push(content),
                None => extraction.skipped += 1,
            }
        }

        Ok(extraction)
    }

    /// Extract one slide, or `None` for a skip (no classifiable lyric text).
    fn extract_slide(&self, slide: &RawSlide) -> Option<ExtractedContent> {
        let mut content = ExtractedContent::default();

        for frame in &slide.texts {
            let role = match classify_text(&frame.text, &self.vocabulary) {
                Classification::Number(_) => Role::Number,
                Classification::Label => Role::Label,
                Classification::Lyric => Role::Lyric,
                Classification::Unclassifiable => continue,
            };
            content.blocks.push(TextBlock {
                role,
                text: frame.text.clone(),
                x: frame.x,
                y: frame.y,
                cx: frame.cx,
                cy: frame.cy,
            });
        }

        if !content.has_lyrics() {
            return None;
        }

        for pic in &slide.pictures {
            content.images.push(EmbeddedImage {
                bytes: pic.bytes.clone(),
                ext: pic.ext.clone(),
                x: pic.x,
                y: pic.y,
                cx: pic.cx,
                cy: pic.cy,
            });
        }

        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hymn_pptx::writer::{DeckBuilder, Paragraph, Run, ShapeSpec, SlideSpec, SLIDE_WIDTH};
    use std::fs;
    use tempfile::TempDir;

    fn lyric_box(text: &str, y: i64) -> ShapeSpec {
        ShapeSpec::TextBox {
            x: 91_440,
            y,
            cx: SLIDE_WIDTH / 2,
            cy: 500_000,
            paragraphs: vec![Paragraph::left(vec![Run::new(text, "Segoe UI", 23)])],
            word_wrap: true,
        }
    }

    #[test]
    fn extracts_classified_blocks_and_images() {
        let dir = TempDir::new().unwrap();
        let mut deck = DeckBuilder::new();

        let mut slide = SlideSpec::new();
        slide.push(lyric_box("Opening Hymn No 313", 100_000));
        slide.push(lyric_box("yeshuveppole aakuvaan ennennum", 900_000));
        let media = deck.add_media(vec![1, 2, 3, 4], "png");
        slide.push(ShapeSpec::Picture {
            media,
            x: 10,
            y: 20,
            cx: 30,
            cy: 40,
        });
        deck.add_slide(slide);

        let path = dir.path().join("src.pptx");
        fs::write(&path, deck.finish().unwrap()).unwrap();

        let location = HymnLocation {
            file: path,
            title_slide: 0,
            content_slides: vec![0],
        };
        let extraction = SlideExtractor::default().extract(&location).unwrap();

        assert_eq!(extraction.slides.len(), 1);
        assert_eq!(extraction.skipped, 0);
        let content = &extraction.slides[0];
        assert_eq!(content.blocks[0].role, Role::Label);
        assert_eq!(content.blocks[1].role, Role::Lyric);
        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].bytes, vec![1, 2, 3, 4]);
        assert_eq!(content.images[0].cy, 40);
    }

    #[test]
    fn image_only_slides_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut deck = DeckBuilder::new();

        // Slide 0: divider art only.
        let media = deck.add_media(vec![9, 9, 9], "jpeg");
        let mut art = SlideSpec::new();
        art.push(ShapeSpec::Picture {
            media,
            x: 0,
            y: 0,
            cx: 100,
            cy: 100,
        });
        deck.add_slide(art);

        // Slide 1: real content.
        let mut lyric = SlideSpec::new();
        lyric.push(lyric_box("daivame nin sannidhiyil", 500_000));
        deck.add_slide(lyric);

        let path = dir.path().join("mixed.pptx");
        fs::write(&path, deck.finish().unwrap()).unwrap();

        let location = HymnLocation {
            file: path,
            title_slide: 0,
            content_slides: vec![0, 1],
        };
        let extraction = SlideExtractor::default().extract(&location).unwrap();

        assert_eq!(extraction.skipped, 1);
        assert_eq!(extraction.slides.len(), 1);
        assert_eq!(
            extraction.slides[0].first_lyric(),
            Some("daivame nin sannidhiyil")
        );
    }

    #[test]
    fn footer_counters_are_dropped() {
        let dir = TempDir::new().unwrap();
        let mut deck = DeckBuilder::new();
        let mut slide = SlideSpec::new();
        slide.push(lyric_box("irul neengi nilkkum", 500_000));
        slide.push(lyric_box("Communion 2: 1 of 7", 6_000_000));
        deck.add_slide(slide);

        let path = dir.path().join("footer.pptx");
        fs::write(&path, deck.finish().unwrap()).unwrap();

        let location = HymnLocation {
            file: path,
            title_slide: 0,
            content_slides: vec![0],
        };
        let extraction = SlideExtractor::default().extract(&location).unwrap();
        assert_eq!(extraction.slides[0].blocks.len(), 1);
        assert_eq!(extraction.slides[0].blocks[0].text, "irul neengi nilkkum");
    }
}
