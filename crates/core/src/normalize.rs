//! Title-key normalization.
//!
//! Titles in the request and in the corpus are matched through a shared
//! normalized key: trimmed, casefolded, punctuation stripped, whitespace
//! collapsed, and diacritics removed so transliteration variants of the same
//! hymn title compare equal.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse whitespace runs into a single space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize raw title text into the comparison key used by the corpus index.
///
/// The key keeps alphanumeric characters and single spaces only. Diacritics
/// are stripped by NFKD-decomposing and dropping combining marks, so
/// "Daivamé" and "Daivame" produce the same key.
pub fn title_key(raw: &str) -> String {
    let decomposed: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let kept: String = decomposed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    WHITESPACE_COLLAPSE_REGEX
        .replace_all(kept.trim(), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_casefolds() {
        assert_eq!(title_key("  Yeshuveppole Aakuvaan  "), "yeshuveppole aakuvaan");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(title_key("Vaazthin, vaazhthin!"), "vaazthin vaazhthin");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(title_key("manassode\t\tshaapa\n maraththil"), "manassode shaapa maraththil");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(title_key("Daivamé nīn"), "daivame nin");
    }

    #[test]
    fn empty_and_punctuation_only_yield_empty_key() {
        assert_eq!(title_key(""), "");
        assert_eq!(title_key("?!—…"), "");
    }
}
