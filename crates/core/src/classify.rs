//! Heuristic classification of slide text runs.
//!
//! Archival slides mix lyric text with header labels ("Offertory",
//! "Hymn No 313"), bare slide numbers, and footer counters ("2 : 3 of 7").
//! The classifier maps each run to a closed variant so the indexer and the
//! extractor never need ad hoc string checks of their own.

use regex::Regex;
use std::sync::LazyLock;

/// "Hymn No 313", "Song No. 313", "Hymn- 313", "Hymn #313" header patterns.
static HYMN_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:hymn|song)\s*(?:no\.?\s*|#\s*)?[-–—:]?\s*(\d{1,3})\b").unwrap()
});

/// Footer counters like "2 : 3 of 7" or "Communion 2: 1 of 7".
static FOOTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*(?::\s*\d+)?\s+of\s+\d+").unwrap());

/// "Section – 143" dash patterns used by hymn-book decks.
static DASH_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-–—]\s*(\d{1,3})\s*$").unwrap());

/// Label text longer than this is assumed to be lyric content even when a
/// vocabulary word appears inside it.
const MAX_LABEL_LEN: usize = 40;

/// Known header/label vocabulary matched against short slide runs.
#[derive(Debug, Clone)]
pub struct LabelVocabulary {
    words: Vec<String>,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            words: [
                "Opening",
                "ThanksGiving",
                "Thanksgiving",
                "Offertory",
                "Message",
                "Confession",
                "Communion",
                "Holy Communion",
                "Closing",
                "Dedication",
                "B/A",
                "Hymn",
                "Song No",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl LabelVocabulary {
    /// Vocabulary from an explicit word list (configuration-supplied).
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.words.iter().any(|w| lower.contains(&w.to_lowercase()))
    }
}

/// Closed classification of one text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A hymn/slide number; carries the parsed value.
    Number(u32),
    /// Header/section vocabulary.
    Label,
    /// Lyric content.
    Lyric,
    /// Empty, control-only, or footer artifacts; excluded from extraction.
    Unclassifiable,
}

/// Classify a single text run.
///
/// Order matters: footers are rejected before anything else, a bare short
/// integer is a `Number`, a short run containing header vocabulary is a
/// `Label`, and any other run with letters is a `Lyric`. Header numbers are
/// recovered separately via [`header_hymn_number`].
pub fn classify_text(text: &str, vocab: &LabelVocabulary) -> Classification {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_control() || c.is_whitespace()) {
        return Classification::Unclassifiable;
    }
    if FOOTER_REGEX.is_match(trimmed) {
        return Classification::Unclassifiable;
    }
    if trimmed.len() <= 3 {
        if let Ok(n) = trimmed.parse::<u32>() {
            return Classification::Number(n);
        }
    }
    if trimmed.len() <= MAX_LABEL_LEN && vocab.matches(trimmed) {
        return Classification::Label;
    }
    if trimmed.chars().any(|c| c.is_alphabetic()) {
        return Classification::Lyric;
    }
    Classification::Unclassifiable
}

/// Extract a hymn number from header text, when present.
///
/// Matches both service-deck headers ("Opening Hymn No 313") and hymn-book
/// dash headers ("Holy Communion – 143").
pub fn header_hymn_number(text: &str) -> Option<u32> {
    if let Some(caps) = HYMN_HEADER_REGEX.captures(text) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = DASH_NUMBER_REGEX.captures(text.trim()) {
        return caps[1].parse().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::default()
    }

    #[test]
    fn empty_and_control_runs_are_unclassifiable() {
        assert_eq!(classify_text("", &vocab()), Classification::Unclassifiable);
        assert_eq!(classify_text("  \u{b} ", &vocab()), Classification::Unclassifiable);
    }

    #[test]
    fn footer_counters_are_unclassifiable() {
        assert_eq!(
            classify_text("30 : 31 of 106", &vocab()),
            Classification::Unclassifiable
        );
        assert_eq!(
            classify_text("Communion 2: 1 of 7", &vocab()),
            Classification::Unclassifiable
        );
    }

    #[test]
    fn bare_short_integers_are_numbers() {
        assert_eq!(classify_text("313", &vocab()), Classification::Number(313));
        assert_eq!(classify_text(" 8 ", &vocab()), Classification::Number(8));
    }

    #[test]
    fn header_vocabulary_is_label() {
        assert_eq!(classify_text("Offertory", &vocab()), Classification::Label);
        assert_eq!(classify_text("Opening Hymn No 313", &vocab()), Classification::Label);
        assert_eq!(classify_text("Holy Communion", &vocab()), Classification::Label);
    }

    #[test]
    fn lyric_text_is_lyric() {
        assert_eq!(
            classify_text("manassode shaapa maraththil thoongiya pole", &vocab()),
            Classification::Lyric
        );
    }

    #[test]
    fn long_text_with_vocab_word_is_still_lyric() {
        let line = "ente daivame communion mealil njan varunnu sthuthikkuvaan ninne";
        assert_eq!(classify_text(line, &vocab()), Classification::Lyric);
    }

    #[test]
    fn header_numbers_parse() {
        assert_eq!(header_hymn_number("Opening Hymn No 313"), Some(313));
        assert_eq!(header_hymn_number("Song No. 420"), Some(420));
        assert_eq!(header_hymn_number("ThanksGiving Hymn- 236"), Some(236));
        assert_eq!(header_hymn_number("Holy Communion – 143"), Some(143));
        assert_eq!(header_hymn_number("no number here"), None);
    }
}
