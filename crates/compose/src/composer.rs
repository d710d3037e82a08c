//! The composer: request entries in, finished deck out.

use chrono::NaiveDate;
use hymn_core::classify::LabelVocabulary;
use hymn_core::heuristic::{derive_title, TitleOptions};
use hymn_core::{
    GenerationLog, HymnIdentifier, RequestEntry, Result, SectionLabel, ServiceRequest,
    SummaryEntry, NOT_FOUND_MARKER,
};
use hymn_corpus::{CorpusIndex, Extraction, IndexRecord, SlideExtractor};
use hymn_pptx::writer::{DeckBuilder, MediaRef};
use std::fs;
use std::path::PathBuf;

use crate::slides;
use crate::summary::summary_slide;

/// Composition options, enumerated by the calling collaborator.
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    /// Fixed illustrative image for the first Communion entry.
    pub communion_image: Option<PathBuf>,
    /// QR code image for every Offertory entry.
    pub qr_image: Option<PathBuf>,
    /// Caption printed under the QR code (giving reference number).
    pub qr_caption: Option<String>,
    pub title: TitleOptions,
    pub vocabulary: LabelVocabulary,
}

/// The finished product of one compose call.
#[derive(Debug)]
pub struct Composition {
    /// The output deck as PPTX bytes.
    pub deck: Vec<u8>,
    /// Ordered human-readable account of what happened.
    pub log: GenerationLog,
    /// Summary entries, one per non-Message request entry.
    pub summary: Vec<SummaryEntry>,
}

/// Drives the index and extractor per entry and assembles the output deck.
///
/// The index is borrowed read-only; each compose call owns its in-progress
/// deck exclusively, so concurrent callers just need separate `compose`
/// invocations over a shared index.
pub struct Composer<'a> {
    index: &'a CorpusIndex,
    config: ComposerConfig,
    extractor: SlideExtractor,
}

impl<'a> Composer<'a> {
    pub fn new(index: &'a CorpusIndex, config: ComposerConfig) -> Self {
        let extractor = SlideExtractor::new(config.vocabulary.clone());
        Self {
            index,
            config,
            extractor,
        }
    }

    /// Compose a parsed service request.
    pub fn compose_request(&self, request: &ServiceRequest) -> Result<Composition> {
        self.compose(&request.entries, request.service_date.as_deref())
    }

    /// Compose a deck from ordered entries.
    ///
    /// Per-entry misses never abort the run: a hymn that cannot be resolved
    /// still gets its title slide and is flagged in the log and summary. The
    /// summary slide is always emitted last, whatever the entry order.
    pub fn compose(
        &self,
        entries: &[RequestEntry],
        service_date: Option<&str>,
    ) -> Result<Composition> {
        let mut deck = DeckBuilder::new();
        let mut log = GenerationLog::new();
        let mut summary: Vec<SummaryEntry> = Vec::new();

        let normalized_date = service_date.map(normalize_service_date);

        // Media is read once up front, but only for sections the request
        // actually uses.
        let wants_qr = entries.iter().any(|e| e.section == SectionLabel::Offertory);
        let wants_communion = entries.iter().any(|e| e.section == SectionLabel::Communion);
        let qr_media = wants_qr
            .then(|| self.load_media(&mut deck, self.config.qr_image.as_deref(), "QR code", &mut log))
            .flatten();
        let communion_media = wants_communion
            .then(|| {
                self.load_media(
                    &mut deck,
                    self.config.communion_image.as_deref(),
                    "Communion image",
                    &mut log,
                )
            })
            .flatten();
        let mut communion_insert_pending = true;

        for entry in entries {
            if entry.is_message() {
                deck.add_slide(slides::message_slide());
                log.note("Message: title slide added");
                continue;
            }

            let record = entry.identifier.as_ref().and_then(|id| self.index.resolve(id));
            let extraction = self.extract_record(record, &mut log);
            let found = !extraction.slides.is_empty();

            let derived_title = self.derived_title(record, &extraction);
            let display_title = entry
                .explicit_title
                .clone()
                .or_else(|| (!derived_title.is_empty()).then(|| derived_title.clone()))
                .unwrap_or_else(|| {
                    if found {
                        String::new()
                    } else {
                        NOT_FOUND_MARKER.to_string()
                    }
                });

            let number = entry
                .identifier
                .as_ref()
                .and_then(HymnIdentifier::number)
                .or_else(|| record.and_then(|r| r.number));

            if !found {
                log.warn(format!(
                    "{}: {} not found in corpus, emitting title slide only",
                    entry.section,
                    describe_entry(entry)
                ));
            }

            // Title slide, with section media applied per the rules: QR on
            // every Offertory entry, Communion image on the first Communion
            // entry only.
            let mut title = slides::title_slide(entry.section, number, &display_title);
            match entry.section {
                SectionLabel::Offertory => {
                    if let Some(media) = qr_media {
                        slides::push_qr_code(&mut title, media, self.config.qr_caption.as_deref());
                        log.note("Offertory: QR code inserted");
                    }
                }
                SectionLabel::Communion if communion_insert_pending => {
                    communion_insert_pending = false;
                    if let Some(media) = communion_media {
                        slides::push_communion_image(&mut title, media);
                        log.note("Communion: illustrative image inserted");
                    }
                }
                _ => {}
            }
            deck.add_slide(title);

            for content in &extraction.slides {
                let slide = slides::content_slide(&mut deck, entry.section.name(), content);
                deck.add_slide(slide);
            }
            if found {
                log.note(format!(
                    "{}: {} resolved with {} content slide(s)",
                    entry.section,
                    describe_entry(entry),
                    extraction.slides.len()
                ));
            }

            summary.push(SummaryEntry {
                section: entry.section,
                number,
                display_title,
                found,
            });
        }

        deck.add_slide(summary_slide(&summary, normalized_date.as_deref()));
        log.note(format!("Summary slide added with {} entries", summary.len()));

        let bytes = deck.finish()?;
        Ok(Composition {
            deck: bytes,
            log,
            summary,
        })
    }

    fn extract_record(&self, record: Option<&IndexRecord>, log: &mut GenerationLog) -> Extraction {
        let Some(record) = record else {
            return Extraction::default();
        };
        match self.extractor.extract(&record.location) {
            Ok(extraction) => {
                if extraction.skipped > 0 {
                    log.note(format!(
                        "Skipped {} slide(s) with no classifiable text from {}",
                        extraction.skipped,
                        record.location.file.display()
                    ));
                }
                extraction
            }
            Err(e) => {
                log.warn(format!(
                    "Extraction failed for {}: {e}",
                    record.location.file.display()
                ));
                Extraction::default()
            }
        }
    }

    /// Heuristic display title: the index already derived one at scan time;
    /// fall back to deriving from the freshly extracted first lyric.
    fn derived_title(&self, record: Option<&IndexRecord>, extraction: &Extraction) -> String {
        if let Some(record) = record {
            if !record.title.is_empty() {
                return record.title.clone();
            }
        }
        extraction
            .slides
            .iter()
            .find_map(|s| s.first_lyric())
            .map(|lyric| derive_title(lyric, &self.config.title))
            .unwrap_or_default()
    }

    /// Read a configured media file into the deck. Missing media is
    /// non-fatal: the affected slides go out without the insert.
    fn load_media(
        &self,
        deck: &mut DeckBuilder,
        path: Option<&std::path::Path>,
        what: &str,
        log: &mut GenerationLog,
    ) -> Option<MediaRef> {
        let path = path?;
        match fs::read(path) {
            Ok(bytes) => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("png")
                    .to_lowercase();
                Some(deck.add_media(bytes, ext))
            }
            Err(e) => {
                log.warn(format!(
                    "{what} unavailable at {}: {e}; slides emitted without it",
                    path.display()
                ));
                None
            }
        }
    }
}

fn describe_entry(entry: &RequestEntry) -> String {
    match (&entry.identifier, &entry.explicit_title) {
        (Some(HymnIdentifier::Number(n)), _) => format!("Hymn No {n}"),
        (Some(HymnIdentifier::Title(_)), Some(t)) => format!("\"{t}\""),
        (Some(HymnIdentifier::Title(t)), None) => format!("\"{t}\""),
        (None, Some(t)) => format!("\"{t}\""),
        (None, None) => "entry".to_string(),
    }
}

/// Normalize a free-text service date to "DD Month YYYY"; unparseable input
/// passes through untouched.
fn normalize_service_date(raw: &str) -> String {
    const FORMATS: [&str; 6] = [
        "%d %b %Y",
        "%d %B %Y",
        "%d-%b-%Y",
        "%d-%B-%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
    ];
    let trimmed = raw.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%-d %B %Y").to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hymn_corpus::IndexOptions;
    use hymn_pptx::reader::PptxReader;
    use hymn_pptx::writer::{DeckBuilder, Paragraph, Run, ShapeSpec, SlideSpec, SLIDE_WIDTH};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn text_slide(lines: &[&str]) -> SlideSpec {
        let mut slide = SlideSpec::new();
        for (i, line) in lines.iter().enumerate() {
            slide.push(ShapeSpec::TextBox {
                x: 91_440,
                y: 600_000 + i as i64 * 600_000,
                cx: SLIDE_WIDTH / 2,
                cy: 500_000,
                paragraphs: vec![Paragraph::left(vec![Run::new(*line, "Segoe UI", 23)])],
                word_wrap: true,
            });
        }
        slide
    }

    /// Corpus with hymns 313 (two slides), 420, and 171.
    fn fixture_corpus(dir: &TempDir) -> CorpusIndex {
        let mut deck = DeckBuilder::new();
        deck.add_slide(text_slide(&["Opening Hymn No 313", "yeshuveppole aakuvaan"]));
        deck.add_slide(text_slide(&["vaanil parannidum pakshikalepole"]));
        deck.add_slide(text_slide(&["Offertory Hymn No 420", "daivame nin sannidhiyil"]));
        deck.add_slide(text_slide(&["Communion Hymn No 171", "aaraadhana yogyanaaya"]));
        std::fs::write(dir.path().join("service.pptx"), deck.finish().unwrap()).unwrap();

        CorpusIndex::build(&[dir.path().to_path_buf()], &IndexOptions::default()).unwrap()
    }

    fn entry(
        number: Option<u32>,
        section: SectionLabel,
        explicit_title: Option<&str>,
    ) -> RequestEntry {
        RequestEntry {
            identifier: number
                .map(HymnIdentifier::Number)
                .or_else(|| explicit_title.map(HymnIdentifier::from_title)),
            section,
            explicit_title: explicit_title.map(str::to_string),
        }
    }

    fn parse_deck(bytes: &[u8]) -> hymn_pptx::reader::SlideDeck {
        PptxReader::new()
            .parse(Cursor::new(bytes.to_vec()), "out.pptx")
            .unwrap()
    }

    fn picture_count(deck: &hymn_pptx::reader::SlideDeck) -> usize {
        deck.slides.iter().map(|s| s.pictures.len()).sum()
    }

    #[test]
    fn slide_order_follows_request_with_summary_last() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![
            entry(Some(313), SectionLabel::Opening, None),
            entry(None, SectionLabel::Message, None),
            entry(Some(420), SectionLabel::Offertory, None),
        ];
        let composition = composer.compose(&entries, None).unwrap();
        let deck = parse_deck(&composition.deck);

        // Opening title + 2 content, message, offertory title + 1 content,
        // summary.
        assert_eq!(deck.slides.len(), 7);
        let first = deck.slides[0].all_text();
        assert!(first.contains("Opening"), "{first}");
        assert!(first.contains("Hymn No. 313"), "{first}");
        assert!(deck.slides[1].all_text().contains("yeshuveppole aakuvaan"));
        assert!(deck.slides[2].all_text().contains("vaanil parannidum"));
        assert!(deck.slides[3].all_text().contains("Message"));

        // Summary is last and lists the opening hymn.
        let last = deck.slides.last().unwrap().all_text();
        assert!(last.contains("Opening:"), "{last}");
        assert!(last.contains("313"), "{last}");
        // Message entries are excluded from the summary.
        assert_eq!(composition.summary.len(), 2);
    }

    #[test]
    fn not_found_entry_gets_title_slide_and_marker() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![entry(Some(999), SectionLabel::Closing, None)];
        let composition = composer.compose(&entries, None).unwrap();
        let deck = parse_deck(&composition.deck);

        // Title slide + summary only; no content slides.
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(composition.summary[0].found, false);
        assert_eq!(composition.summary[0].display_title, NOT_FOUND_MARKER);
        assert!(composition
            .log
            .lines()
            .iter()
            .any(|l| l.contains("not found")));
    }

    #[test]
    fn explicit_title_wins_over_marker_and_heuristic() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![entry(
            None,
            SectionLabel::Closing,
            Some("yeshuveppole aakuvaan custom"),
        )];
        let composition = composer.compose(&entries, None).unwrap();

        assert_eq!(
            composition.summary[0].display_title,
            "yeshuveppole aakuvaan custom"
        );
        let deck = parse_deck(&composition.deck);
        // Exactly one title slide plus the summary.
        assert!(deck.slides[0]
            .all_text()
            .contains("yeshuveppole aakuvaan custom"));
    }

    #[test]
    fn offertory_qr_inserted_per_entry_communion_image_once() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);

        let qr_path = dir.path().join("qr.png");
        let hc_path = dir.path().join("hc.jpeg");
        std::fs::write(&qr_path, b"qr-bytes").unwrap();
        std::fs::write(&hc_path, b"hc-bytes").unwrap();

        let config = ComposerConfig {
            qr_image: Some(qr_path),
            communion_image: Some(hc_path),
            ..ComposerConfig::default()
        };
        let composer = Composer::new(&index, config);

        let entries = vec![
            entry(Some(420), SectionLabel::Offertory, None),
            entry(Some(420), SectionLabel::Offertory, None),
            entry(Some(171), SectionLabel::Communion, None),
            entry(Some(171), SectionLabel::Communion, None),
        ];
        let composition = composer.compose(&entries, None).unwrap();
        let deck = parse_deck(&composition.deck);

        // 2 QR inserts + 1 communion insert.
        assert_eq!(picture_count(&deck), 3);
        let qr_count = deck
            .slides
            .iter()
            .flat_map(|s| &s.pictures)
            .filter(|p| p.bytes == b"qr-bytes")
            .count();
        let hc_count = deck
            .slides
            .iter()
            .flat_map(|s| &s.pictures)
            .filter(|p| p.bytes == b"hc-bytes")
            .count();
        assert_eq!(qr_count, 2);
        assert_eq!(hc_count, 1);
    }

    #[test]
    fn missing_media_is_non_fatal_and_logged() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let config = ComposerConfig {
            qr_image: Some(dir.path().join("missing-qr.png")),
            ..ComposerConfig::default()
        };
        let composer = Composer::new(&index, config);

        let entries = vec![entry(Some(420), SectionLabel::Offertory, None)];
        let composition = composer.compose(&entries, None).unwrap();
        let deck = parse_deck(&composition.deck);

        assert_eq!(picture_count(&deck), 0);
        assert!(composition
            .log
            .lines()
            .iter()
            .any(|l| l.contains("QR code unavailable")));
    }

    #[test]
    fn repeated_sections_yield_independent_slide_groups() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![
            entry(Some(171), SectionLabel::Communion, None),
            entry(Some(171), SectionLabel::Communion, None),
        ];
        let composition = composer.compose(&entries, None).unwrap();
        let deck = parse_deck(&composition.deck);

        // Two independent title+content groups plus the summary.
        assert_eq!(deck.slides.len(), 5);
        assert_eq!(composition.summary.len(), 2);
    }

    #[test]
    fn service_date_appears_on_summary_slide() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![entry(Some(313), SectionLabel::Opening, None)];
        let composition = composer.compose(&entries, Some("16/02/2026")).unwrap();
        let deck = parse_deck(&composition.deck);
        let last = deck.slides.last().unwrap().all_text();
        assert!(last.contains("16 February 2026"), "{last}");
    }

    #[test]
    fn title_only_entry_resolves_through_corpus() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![entry(None, SectionLabel::Closing, Some("yeshuveppole aakuvaan"))];
        let composition = composer.compose(&entries, None).unwrap();

        assert!(composition.summary[0].found);
        // The title-only request resolves to hymn 313's two-slide span.
        assert_eq!(composition.summary[0].number, Some(313));
        let deck = parse_deck(&composition.deck);
        // Title + two content slides + summary.
        assert_eq!(deck.slides.len(), 4);
    }

    #[test]
    fn unmatched_title_only_entry_keeps_explicit_title_verbatim() {
        let dir = TempDir::new().unwrap();
        let index = fixture_corpus(&dir);
        let composer = Composer::new(&index, ComposerConfig::default());

        let entries = vec![entry(
            None,
            SectionLabel::Closing,
            Some("oru pattum illatha pattu"),
        )];
        let composition = composer.compose(&entries, None).unwrap();

        assert!(!composition.summary[0].found);
        assert_eq!(
            composition.summary[0].display_title,
            "oru pattum illatha pattu"
        );
        let deck = parse_deck(&composition.deck);
        // Exactly one title slide, zero content slides, then the summary.
        assert_eq!(deck.slides.len(), 2);
        assert!(deck.slides[0].all_text().contains("oru pattum illatha pattu"));
    }

    #[test]
    fn normalize_service_date_formats() {
        assert_eq!(normalize_service_date("16/02/2026"), "16 February 2026");
        assert_eq!(normalize_service_date("4 Jan 2026"), "4 January 2026");
        assert_eq!(normalize_service_date("16 February 2026"), "16 February 2026");
        assert_eq!(normalize_service_date("someday soon"), "someday soon");
    }
}
