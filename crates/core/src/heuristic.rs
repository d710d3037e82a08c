//! Short display-title derivation from transliterated lyric text.
//!
//! Summary slides and title-only entries show a 2-3 word prefix of the first
//! lyric line. Archival decks carry encoding artifacts (corrupted Malayalam
//! rendered as symbol salad), so tokens that do not look transliterable are
//! skipped rather than propagated into the output deck.

/// Options for title derivation, supplied by the calling collaborator.
#[derive(Debug, Clone)]
pub struct TitleOptions {
    /// Minimum combined character count for a two-token title; shorter
    /// prefixes pull in a third token.
    pub min_len: usize,
    /// Control characters that mark line breaks inside a single text frame.
    pub break_chars: Vec<char>,
}

impl Default for TitleOptions {
    fn default() -> Self {
        Self {
            min_len: 6,
            // Vertical tab is the in-frame line-break mark in the archival decks.
            break_chars: vec!['\u{b}'],
        }
    }
}

impl TitleOptions {
    /// Override the minimum two-token length threshold.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }
}

/// Maximum tolerated fraction of non-transliterable characters per token.
const CORRUPT_RATIO: f64 = 0.3;

/// Characters accepted in transliterated lyric tokens besides ASCII
/// alphanumerics.
const ALLOWED_PUNCT: &[char] = &['-', '\'', '!', '?', ',', '.'];

fn is_transliterable(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_PUNCT.contains(&c)
}

/// A token is corrupted when too many of its characters fall outside the
/// transliteration character set (encoding artifacts from legacy fonts).
fn is_corrupt_token(token: &str) -> bool {
    let total = token.chars().count();
    if total == 0 {
        return true;
    }
    let bad = token.chars().filter(|c| !is_transliterable(*c)).count();
    bad as f64 / total as f64 > CORRUPT_RATIO
}

/// Derive a short display title from lyric text.
///
/// Splits on whitespace and the configured in-frame break characters, skips
/// corrupted and purely numeric tokens, and returns the first two usable
/// tokens — three when the first two are shorter than `min_len` combined.
/// Returns an empty string when no usable token exists; callers treat that
/// as "title unavailable", never as a failure.
pub fn derive_title(lyric: &str, opts: &TitleOptions) -> String {
    let mut usable = lyric
        .split(|c: char| c.is_whitespace() || opts.break_chars.contains(&c))
        .filter(|t| !t.is_empty())
        .filter(|t| !is_corrupt_token(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()));

    let first = match usable.next() {
        Some(t) => t,
        None => return String::new(),
    };
    let second = match usable.next() {
        Some(t) => t,
        None => return first.to_string(),
    };

    let mut title = format!("{first} {second}");
    if first.chars().count() + second.chars().count() < opts.min_len {
        if let Some(third) = usable.next() {
            title.push(' ');
            title.push_str(third);
        }
    }
    title
}
