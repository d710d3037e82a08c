//! Report builder: corpus index -> three-view XLSX.
//!
//! No resolution or tie-break happens here; every indexed occurrence
//! produces a row so conflicting archival copies can be compared side by
//! side.

use hymn_core::{Error, Result};
use hymn_corpus::{CorpusIndex, IndexRecord};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::xlsx::{Cell, Sheet, Workbook};

/// Longest text kept in a cell before truncation.
const MAX_CELL_TEXT: usize = 200;

const COLUMNS: [&str; 4] = ["Hymn Number", "Title", "Source File", "Slides"];
const CURATED_COLUMNS: [&str; 4] = ["Hymn Number", "Extracted Title", "Source File", "Curated Title"];

/// Curated hymn-number -> title mapping, maintained by hand alongside the
/// corpus (not derived from slides).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CuratedTitles(BTreeMap<String, String>);

impl CuratedTitles {
    /// Load the mapping from a JSON object file (`{"91": "title", ...}`).
    pub fn load(path: &Path) -> Result<CuratedTitles> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::config(format!("invalid curated mapping {}: {e}", path.display()))
        })
    }

    pub fn get(&self, number: u32) -> Option<&str> {
        self.0.get(&number.to_string()).map(String::as_str)
    }

    /// Numbers present in the mapping, ascending.
    pub fn numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.0.keys().filter_map(|k| k.parse().ok()).collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the report workbook. The third view is emitted only when a curated
/// mapping is supplied.
pub fn build_report(index: &CorpusIndex, curated: Option<&CuratedTitles>) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let mut by_number: Vec<&IndexRecord> = index.records().iter().collect();
    by_number.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    let mut sheet = Sheet::new("By Hymn Number", &COLUMNS);
    for record in &by_number {
        sheet.push_row(record_row(record));
    }
    workbook.add_sheet(sheet);

    let mut by_file: Vec<&IndexRecord> = index.records().iter().collect();
    by_file.sort_by(|a, b| file_sort_key(a).cmp(&file_sort_key(b)));

    let mut sheet = Sheet::new("By Source File", &COLUMNS);
    for record in &by_file {
        sheet.push_row(record_row(record));
    }
    workbook.add_sheet(sheet);

    if let Some(curated) = curated {
        workbook.add_sheet(curated_sheet(&by_number, curated));
    }

    log::debug!(
        "Report: {} occurrences across {} files, {} sheets",
        index.len(),
        index.files_scanned(),
        workbook.sheet_count()
    );

    workbook.finish()
}

/// Numbered hymns first (ascending), then title-only hymns alphabetically;
/// file name breaks remaining ties.
fn sort_key(record: &IndexRecord) -> (u8, u32, String, String) {
    match record.number {
        Some(n) => (0, n, String::new(), file_name(record)),
        None => (1, 0, record.title.clone(), file_name(record)),
    }
}

fn file_sort_key(record: &IndexRecord) -> (String, u32, String) {
    (
        file_name(record),
        record.number.unwrap_or(u32::MAX),
        record.title.clone(),
    )
}

fn file_name(record: &IndexRecord) -> String {
    record
        .location
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn record_row(record: &IndexRecord) -> Vec<Cell> {
    vec![
        match record.number {
            Some(n) => Cell::Number(n as i64),
            None => Cell::Empty,
        },
        Cell::text(clean_cell_text(&record.title)),
        Cell::text(file_name(record)),
        Cell::text(slide_span(record)),
    ]
}

/// 1-based slide span like "3-5", or a single index.
fn slide_span(record: &IndexRecord) -> String {
    let slides = &record.location.content_slides;
    match (slides.first(), slides.last()) {
        (Some(first), Some(last)) if first != last => format!("{}-{}", first + 1, last + 1),
        (Some(first), _) => format!("{}", first + 1),
        _ => "N/A".to_string(),
    }
}

fn curated_sheet(by_number: &[&IndexRecord], curated: &CuratedTitles) -> Sheet {
    let mut sheet = Sheet::new("Curated Titles", &CURATED_COLUMNS);

    let mut seen: Vec<u32> = Vec::new();
    for record in by_number {
        let Some(number) = record.number else { continue };
        if !seen.contains(&number) {
            seen.push(number);
        }
        sheet.push_row(vec![
            Cell::Number(number as i64),
            Cell::text(clean_cell_text(&record.title)),
            Cell::text(file_name(record)),
            match curated.get(number) {
                Some(title) => Cell::text(clean_cell_text(title)),
                None => Cell::Empty,
            },
        ]);
    }

    // Curated entries with no corpus occurrence are still listed so gaps in
    // the archive are visible.
    for number in curated.numbers() {
        if seen.contains(&number) {
            continue;
        }
        sheet.push_row(vec![
            Cell::Number(number as i64),
            Cell::Empty,
            Cell::Empty,
            Cell::text(clean_cell_text(curated.get(number).unwrap_or_default())),
        ]);
    }

    sheet
}

/// Strip control characters and cap length; archival decks leak both into
/// extracted titles.
fn clean_cell_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect();
    if cleaned.chars().count() > MAX_CELL_TEXT {
        let truncated: String = cleaned.chars().take(MAX_CELL_TEXT).collect();
        format!("{truncated}...")
    } else {
        cleaned
    }
}
