//! Domain types for hymn resolution and slide composition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::normalize::title_key;

/// Identifies a hymn within the archival corpus: either a hymn-book number
/// or, when no number exists, a normalized title key.
///
/// Uniqueness is not guaranteed across the corpus; the index resolves
/// duplicates with a documented first-wins rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HymnIdentifier {
    /// Positive hymn-book number.
    Number(u32),
    /// Normalized title key (see [`crate::normalize::title_key`]).
    Title(String),
}

impl HymnIdentifier {
    /// Build a title identifier from raw title text, normalizing it into the
    /// comparison key used by the index.
    pub fn from_title(raw: &str) -> Self {
        HymnIdentifier::Title(title_key(raw))
    }

    /// The hymn number, when this identifier carries one.
    pub fn number(&self) -> Option<u32> {
        match self {
            HymnIdentifier::Number(n) => Some(*n),
            HymnIdentifier::Title(_) => None,
        }
    }
}

impl fmt::Display for HymnIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HymnIdentifier::Number(n) => write!(f, "Hymn No {n}"),
            HymnIdentifier::Title(t) => write!(f, "\"{t}\""),
        }
    }
}

/// Liturgical slot a hymn or message is assigned to within a service.
///
/// Closed vocabulary; request parsing is case-sensitive and rejects anything
/// else as a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionLabel {
    Opening,
    ThanksGiving,
    Offertory,
    Message,
    Communion,
    Closing,
    Confession,
    Dedication,
}

impl SectionLabel {
    /// All labels, in canonical order.
    pub const ALL: [SectionLabel; 8] = [
        SectionLabel::Opening,
        SectionLabel::ThanksGiving,
        SectionLabel::Offertory,
        SectionLabel::Message,
        SectionLabel::Communion,
        SectionLabel::Closing,
        SectionLabel::Confession,
        SectionLabel::Dedication,
    ];

    /// Canonical name as it appears in request files and on title slides.
    pub fn name(&self) -> &'static str {
        match self {
            SectionLabel::Opening => "Opening",
            SectionLabel::ThanksGiving => "ThanksGiving",
            SectionLabel::Offertory => "Offertory",
            SectionLabel::Message => "Message",
            SectionLabel::Communion => "Communion",
            SectionLabel::Closing => "Closing",
            SectionLabel::Confession => "Confession",
            SectionLabel::Dedication => "Dedication",
        }
    }

    /// Label shown on the summary slide. ThanksGiving prayers are
    /// traditionally listed as "B/A" there.
    pub fn summary_label(&self) -> &'static str {
        match self {
            SectionLabel::ThanksGiving => "B/A",
            other => other.name(),
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionLabel::ALL
            .iter()
            .copied()
            .find(|l| l.name() == s)
            .ok_or_else(|| Error::config(format!("unrecognized section label '{s}'")))
    }
}

/// One line of the submitted service request, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEntry {
    /// `None` marks a title-only entry (and Message slides).
    pub identifier: Option<HymnIdentifier>,

    /// Section this entry belongs to.
    pub section: SectionLabel,

    /// Title supplied by the requester; always wins over heuristic derivation.
    pub explicit_title: Option<String>,
}

impl RequestEntry {
    /// Message slides carry no hymn content at all.
    pub fn is_message(&self) -> bool {
        self.section == SectionLabel::Message
    }
}

/// Logical role of a text block on an extracted slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Section/header vocabulary ("Offertory", "Hymn No 313", ...).
    Label,
    /// A bare hymn or slide number.
    Number,
    /// Lyric text.
    Lyric,
}

/// A classified text block from a source slide, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub role: Role,
    pub text: String,
    /// Source geometry in EMU, preserved so the block can be re-placed in the
    /// output deck without depending on the source layout.
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// An image embedded on a source slide, copied by byte value at extraction
/// time so composition never depends on the source file staying available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    /// Lowercased file extension ("png", "jpeg", ...).
    pub ext: String,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Content-neutral representation of one extracted source slide.
///
/// Produced fresh per extraction; nothing here aliases the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Ordered text blocks with their logical roles.
    pub blocks: Vec<TextBlock>,
    /// Ordered embedded images.
    pub images: Vec<EmbeddedImage>,
}

impl ExtractedContent {
    /// First lyric block, if any; the title heuristic feeds on this.
    pub fn first_lyric(&self) -> Option<&str> {
        self.blocks
            .iter()
            .find(|b| b.role == Role::Lyric)
            .map(|b| b.text.as_str())
    }

    /// True when no block carries lyric content.
    pub fn has_lyrics(&self) -> bool {
        self.blocks.iter().any(|b| b.role == Role::Lyric)
    }
}

/// One line of the auto-built summary slide; derived per request entry
/// (Message entries excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub section: SectionLabel,
    pub number: Option<u32>,
    /// Explicit title, heuristic-derived title, or the not-found marker.
    pub display_title: String,
    /// False when the identifier resolved to zero corpus candidates.
    pub found: bool,
}

/// Marker shown on the summary slide for entries with no corpus match.
pub const NOT_FOUND_MARKER: &str = "(not found)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_label_parses_canonical_names() {
        for label in SectionLabel::ALL {
            assert_eq!(label.name().parse::<SectionLabel>().unwrap(), label);
        }
    }

    #[test]
    fn section_label_is_case_sensitive() {
        assert!("opening".parse::<SectionLabel>().is_err());
        assert!("OFFERTORY".parse::<SectionLabel>().is_err());
        assert!("Thanksgiving".parse::<SectionLabel>().is_err());
    }

    #[test]
    fn unknown_section_label_is_config_error() {
        let err = "UnknownSection".parse::<SectionLabel>().unwrap_err();
        assert!(err.to_string().contains("UnknownSection"));
    }

    #[test]
    fn thanksgiving_summarizes_as_ba() {
        assert_eq!(SectionLabel::ThanksGiving.summary_label(), "B/A");
        assert_eq!(SectionLabel::Communion.summary_label(), "Communion");
    }

    #[test]
    fn title_identifier_normalizes() {
        let a = HymnIdentifier::from_title("  Yeshuveppole   Aakuvaan! ");
        let b = HymnIdentifier::from_title("yeshuveppole aakuvaan");
        assert_eq!(a, b);
    }

    #[test]
    fn first_lyric_skips_labels_and_numbers() {
        let content = ExtractedContent {
            blocks: vec![
                TextBlock {
                    role: Role::Label,
                    text: "Offertory".into(),
                    x: 0,
                    y: 0,
                    cx: 0,
                    cy: 0,
                },
                TextBlock {
                    role: Role::Lyric,
                    text: "daivame nin sannidhiyil".into(),
                    x: 0,
                    y: 0,
                    cx: 0,
                    cy: 0,
                },
            ],
            images: Vec::new(),
        };
        assert_eq!(content.first_lyric(), Some("daivame nin sannidhiyil"));
    }
}
