//! Corpus index: hymn identifier -> candidate source slides.
//!
//! Walks the archival roots in priority order, scans every presentation, and
//! records where each hymn starts and which adjacent slides belong to it.
//! Candidate order is root order first, then discovery order within a root;
//! `resolve` always returns the first candidate, which makes duplicate
//! archival copies (the same hymn across several years of decks) resolve
//! deterministically.

use hymn_core::classify::{classify_text, header_hymn_number, Classification, LabelVocabulary};
use hymn_core::heuristic::{derive_title, TitleOptions};
use hymn_core::normalize::title_key;
use hymn_core::{Error, HymnIdentifier, Result};
use hymn_pptx::reader::{PptxReader, RawSlide};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Scanning options, supplied by the calling collaborator.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub vocabulary: LabelVocabulary,
    pub title: TitleOptions,
}

/// A hymn's home in the corpus: source file plus slide span.
///
/// Slide indices are 0-based positions in presentation order. The span is
/// closed by the adjacency rule: a following slide with a new number or a
/// bare section label ends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HymnLocation {
    pub file: PathBuf,
    /// Slide the hymn was recognized on.
    pub title_slide: usize,
    /// Slides carrying the hymn's content, in adjacency order.
    pub content_slides: Vec<usize>,
}

/// One indexed hymn occurrence. The corpus routinely holds several records
/// for the same hymn number; the report shows them all, `resolve` picks one.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    /// Hymn-book number, when one was found on the slides.
    pub number: Option<u32>,
    /// Short display title derived from the first lyric line; may be empty
    /// when the lyrics are not transliterable.
    pub title: String,
    /// Normalized key of the first lyric line, for title-only resolution.
    pub title_key: String,
    pub location: HymnLocation,
}

/// Immutable index over the archival corpus.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    records: Vec<IndexRecord>,
    by_number: HashMap<u32, Vec<usize>>,
    by_title: HashMap<String, Vec<usize>>,
    files_scanned: usize,
}

impl CorpusIndex {
    /// Build the index from ordered corpus roots (earlier roots win ties).
    ///
    /// A missing root is skipped with a warning; zero scannable roots is a
    /// configuration error. Files that fail to parse are skipped, never
    /// fatal: a single corrupt archive must not take the corpus down.
    pub fn build(roots: &[PathBuf], options: &IndexOptions) -> Result<CorpusIndex> {
        let mut index = CorpusIndex::default();
        let reader = PptxReader::new();
        let mut roots_scanned = 0usize;

        for root in roots {
            if !root.is_dir() {
                log::warn!("Corpus root does not exist, skipping: {}", root.display());
                continue;
            }
            roots_scanned += 1;

            let mut files = Vec::new();
            collect_pptx_files(root, &mut files)?;

            for file in files {
                match reader.open(&file) {
                    Ok(deck) => {
                        index.scan_deck(&file, &deck.slides, options);
                        index.files_scanned += 1;
                    }
                    Err(e) => {
                        log::warn!("Skipping unreadable presentation {}: {e}", file.display());
                    }
                }
            }
        }

        if roots_scanned == 0 {
            return Err(Error::config("no corpus root could be scanned"));
        }

        Ok(index)
    }

    /// Resolve an identifier to its authoritative source: the first
    /// candidate in root-priority/discovery order.
    pub fn resolve(&self, identifier: &HymnIdentifier) -> Option<&IndexRecord> {
        match identifier {
            HymnIdentifier::Number(n) => self
                .by_number
                .get(n)
                .and_then(|c| c.first())
                .map(|&i| &self.records[i]),
            HymnIdentifier::Title(key) => self.resolve_title_key(key),
        }
    }

    /// Resolve raw title text (normalizing it first).
    pub fn resolve_title(&self, raw_title: &str) -> Option<&IndexRecord> {
        self.resolve_title_key(&title_key(raw_title))
    }

    fn resolve_title_key(&self, key: &str) -> Option<&IndexRecord> {
        if key.is_empty() {
            return None;
        }
        if let Some(candidates) = self.by_title.get(key) {
            if let Some(&i) = candidates.first() {
                return Some(&self.records[i]);
            }
        }
        // A request title is often a prefix of the archival first line (or
        // the other way around); fall back to the first record that matches
        // either way.
        self.records
            .iter()
            .find(|r| !r.title_key.is_empty() && (r.title_key.starts_with(key) || key.starts_with(&r.title_key)))
    }

    /// Every indexed occurrence, duplicates included, in priority order.
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Number of presentations scanned into the index.
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Scan one presentation's slides into records.
    fn scan_deck(&mut self, file: &Path, slides: &[RawSlide], options: &IndexOptions) {
        let mut open: Option<OpenRecord> = None;

        for (idx, slide) in slides.iter().enumerate() {
            let view = SlideView::classify(slide, &options.vocabulary);

            // Summary/index slides list many hymn numbers at once; they are
            // transparent to the adjacency rule.
            if view.number_tokens > 4 {
                continue;
            }

            match view.hymn_number {
                Some(number) => {
                    let continues = matches!(&open, Some(rec) if rec.number == Some(number));
                    if continues {
                        // Repeated header on a continuation slide.
                        if let Some(rec) = open.as_mut() {
                            rec.extend(idx, &view, options);
                        }
                    } else {
                        self.close(open.take(), file);
                        let mut rec = OpenRecord::new(Some(number), idx);
                        rec.extend(idx, &view, options);
                        open = Some(rec);
                    }
                }
                None if open.is_some() => {
                    if view.is_section_divider() {
                        self.close(open.take(), file);
                    } else if view.has_lyric || view.has_pictures {
                        if let Some(rec) = open.as_mut() {
                            rec.extend(idx, &view, options);
                        }
                    }
                }
                None => {
                    if view.has_lyric {
                        // Hymn with no number: identified by its first lyric
                        // line alone.
                        let mut rec = OpenRecord::new(None, idx);
                        rec.extend(idx, &view, options);
                        open = Some(rec);
                    }
                }
            }
        }

        self.close(open.take(), file);
    }

    fn close(&mut self, open: Option<OpenRecord>, file: &Path) {
        let Some(rec) = open else { return };
        if rec.content_slides.is_empty() {
            return;
        }

        let record = IndexRecord {
            number: rec.number,
            title: rec.title,
            title_key: rec.title_key,
            location: HymnLocation {
                file: file.to_path_buf(),
                title_slide: rec.title_slide,
                content_slides: rec.content_slides,
            },
        };

        let pos = self.records.len();
        if let Some(n) = record.number {
            self.by_number.entry(n).or_default().push(pos);
        }
        if !record.title_key.is_empty() {
            self.by_title
                .entry(record.title_key.clone())
                .or_default()
                .push(pos);
        }
        self.records.push(record);
    }
}

/// Record under construction while scanning a deck.
struct OpenRecord {
    number: Option<u32>,
    title: String,
    title_key: String,
    title_slide: usize,
    content_slides: Vec<usize>,
}

impl OpenRecord {
    fn new(number: Option<u32>, title_slide: usize) -> Self {
        Self {
            number,
            title: String::new(),
            title_key: String::new(),
            title_slide,
            content_slides: Vec::new(),
        }
    }

    fn extend(&mut self, idx: usize, view: &SlideView, options: &IndexOptions) {
        if view.has_lyric || view.has_pictures {
            if self.content_slides.last() != Some(&idx) {
                self.content_slides.push(idx);
            }
        }
        if self.title.is_empty() {
            if let Some(first_lyric) = &view.first_lyric {
                self.title = derive_title(first_lyric, &options.title);
                self.title_key = title_key(first_lyric_line(first_lyric));
            }
        }
    }
}

/// Classified summary of one slide, shared by the scanner's decisions.
struct SlideView {
    hymn_number: Option<u32>,
    has_lyric: bool,
    has_pictures: bool,
    has_label: bool,
    first_lyric: Option<String>,
    /// Count of 2-3 digit tokens across the slide, for summary-slide
    /// detection.
    number_tokens: usize,
}

impl SlideView {
    fn classify(slide: &RawSlide, vocab: &LabelVocabulary) -> SlideView {
        let mut hymn_number = None;
        let mut has_lyric = false;
        let mut has_label = false;
        let mut first_lyric = None;

        for frame in &slide.texts {
            match classify_text(&frame.text, vocab) {
                Classification::Number(n) => {
                    hymn_number.get_or_insert(n);
                }
                Classification::Label => {
                    has_label = true;
                    if let Some(n) = header_hymn_number(&frame.text) {
                        hymn_number.get_or_insert(n);
                    }
                }
                Classification::Lyric => {
                    has_lyric = true;
                    if first_lyric.is_none() {
                        first_lyric = Some(frame.text.clone());
                    }
                }
                Classification::Unclassifiable => {}
            }
        }

        SlideView {
            hymn_number,
            has_lyric,
            has_pictures: !slide.pictures.is_empty(),
            has_label,
            first_lyric,
            number_tokens: count_number_tokens(&slide.all_text()),
        }
    }

    /// A slide carrying only a section label (no lyrics, no number) marks
    /// the start of the next section and closes the current span.
    fn is_section_divider(&self) -> bool {
        self.has_label && !self.has_lyric && self.hymn_number.is_none()
    }
}

/// First line of a lyric frame (paragraph or in-frame break).
fn first_lyric_line(lyric: &str) -> &str {
    lyric
        .split(['\n', '\u{b}'])
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn count_number_tokens(text: &str) -> usize {
    let mut count = 0;
    let mut digits = 0usize;
    let mut prev_alnum = false;
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() && !prev_alnum {
            digits += 1;
        } else if c.is_alphanumeric() {
            // Digits glued to letters are not standalone numbers.
            prev_alnum = true;
            digits = 0;
        } else {
            if (2..=3).contains(&digits) {
                count += 1;
            }
            digits = 0;
            prev_alnum = false;
        }
    }
    count
}

/// Recursively collect `.pptx` files under `dir`, sorted by name at each
/// level so discovery order is stable across platforms and runs.
fn collect_pptx_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_pptx_files(&path, out)?;
        } else if is_pptx_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_pptx_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // `~$` prefix marks Office lock files.
    if name.starts_with("~$") {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pptx"))
}
