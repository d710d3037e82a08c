//! Summary slide layout.
//!
//! One line per non-Message entry, in request order: a bold label column of
//! fixed character width, then hymn number and display title. Consecutive
//! Communion entries stack under a single "Communion:" label, and
//! ThanksGiving is listed under its traditional "B/A" name.

use hymn_core::{SectionLabel, SummaryEntry};
use hymn_pptx::writer::{Paragraph, Run, ShapeSpec, SlideSpec};

/// Character width of the label column, colon included.
const LABEL_COLUMN_WIDTH: usize = 15;

const SUMMARY_FONT: &str = "Arial";
const SUMMARY_SIZE: u32 = 14;
const HEADER_FONT: &str = "Segoe UI";
const HEADER_SIZE: u32 = 18;

/// Summary text box (below the template heading area).
const BOX_X: i64 = 800_000;
const BOX_Y: i64 = 550_000;
const BOX_CX: i64 = 7_500_000;
const BOX_CY: i64 = 5_500_000;

/// One rendered summary line: bold label column and regular remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: String,
    pub rest: String,
}

/// Lay out summary entries into lines with the fixed label column.
pub fn summary_lines(entries: &[SummaryEntry]) -> Vec<SummaryLine> {
    let mut lines = Vec::with_capacity(entries.len());
    let mut prev_was_communion = false;

    for entry in entries {
        let is_communion = entry.section == SectionLabel::Communion;

        let label = if is_communion && prev_was_communion {
            String::new()
        } else {
            format!("{}:", entry.section.summary_label())
        };

        let padding = LABEL_COLUMN_WIDTH.saturating_sub(label.len()).max(1);
        let mut rest = " ".repeat(padding);
        match entry.number {
            Some(n) => {
                rest.push_str(&n.to_string());
                if !entry.display_title.is_empty() {
                    rest.push(' ');
                    rest.push_str(&entry.display_title);
                }
            }
            None => rest.push_str(&entry.display_title),
        }

        lines.push(SummaryLine { label, rest });
        prev_was_communion = is_communion;
    }

    lines
}

/// Build the summary slide, with an optional service date heading.
pub fn summary_slide(entries: &[SummaryEntry], service_date: Option<&str>) -> SlideSpec {
    let mut paragraphs = Vec::new();

    if let Some(date) = service_date {
        paragraphs.push(Paragraph::centered(vec![Run::new(
            format!("Holy Communion Service - {date}"),
            HEADER_FONT,
            HEADER_SIZE,
        )
        .bold()]));
        paragraphs.push(Paragraph::left(Vec::new()));
    }

    for line in summary_lines(entries) {
        let mut runs = Vec::new();
        if !line.label.is_empty() {
            runs.push(Run::new(line.label.as_str(), SUMMARY_FONT, SUMMARY_SIZE).bold());
        }
        runs.push(Run::new(line.rest.as_str(), SUMMARY_FONT, SUMMARY_SIZE));
        paragraphs.push(Paragraph::left(runs));
    }

    let mut slide = SlideSpec::new();
    slide.push(ShapeSpec::TextBox {
        x: BOX_X,
        y: BOX_Y,
        cx: BOX_CX,
        cy: BOX_CY,
        paragraphs,
        word_wrap: true,
    });
    slide
}
