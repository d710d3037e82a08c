//! Slide builders and layout constants for the output deck.
//!
//! Geometry and styling mirror the archival service template: Gabriola
//! section titles, a pale pink title bar on content slides, and fixed insert
//! positions for the Communion image and the Offertory QR code.

use hymn_core::{ExtractedContent, Role, SectionLabel};
use hymn_pptx::writer::{
    Align, DeckBuilder, MediaRef, Paragraph, Run, ShapeSpec, SlideSpec, EMU_PER_INCH, SLIDE_WIDTH,
};

/// Section title font.
pub const TITLE_FONT: &str = "Gabriola";
pub const TITLE_SIZE: u32 = 60;

/// Content slide title bar.
pub const TITLE_BAR_HEIGHT: i64 = 486_000;
pub const TITLE_BAR_COLOR: &str = "E8D3D3";
pub const TITLE_BAR_FONT: &str = "Calibri";
pub const TITLE_BAR_SIZE: u32 = 32;

/// Lyric text on regenerated content slides.
pub const CONTENT_FONT: &str = "Segoe UI";
pub const CONTENT_SIZE: u32 = 23;

/// Title slide text box (from the template).
const TITLE_BOX_X: i64 = 12_031;
const TITLE_BOX_Y: i64 = 1_679_968;
const TITLE_BOX_CX: i64 = 9_119_938;
const TITLE_BOX_CY: i64 = 1_783_563;

/// QR code insert position (right side of the slide).
pub const QR_X: i64 = 6_374_808;
pub const QR_Y: i64 = 987_552;
pub const QR_CX: i64 = 2_779_776;
pub const QR_CY: i64 = 2_862_072;

/// Communion image insert position.
pub const COMMUNION_X: i64 = 1_529_791;
pub const COMMUNION_Y: i64 = 705_917;
pub const COMMUNION_CX: i64 = 6_085_418;
pub const COMMUNION_CY: i64 = 4_057_193;

/// Source pictures at or past this x were QR/sidebar inserts in the archival
/// deck and are not carried over (the composer re-inserts its own).
pub const SOURCE_SIDEBAR_X: i64 = 5 * EMU_PER_INCH;

/// Second line of a section title slide.
pub fn title_slide_subtitle(number: Option<u32>, title: &str) -> String {
    match (number, title.is_empty()) {
        (Some(n), false) => format!("Hymn No. {n} - {title}"),
        (Some(n), true) => format!("Hymn No. {n}"),
        (None, false) => format!("Hymn - {title}"),
        (None, true) => "Hymn".to_string(),
    }
}

/// Section title slide: label plus hymn line, centered.
pub fn title_slide(section: SectionLabel, number: Option<u32>, title: &str) -> SlideSpec {
    let mut slide = SlideSpec::new();
    slide.push(ShapeSpec::TextBox {
        x: TITLE_BOX_X,
        y: TITLE_BOX_Y,
        cx: TITLE_BOX_CX,
        cy: TITLE_BOX_CY,
        paragraphs: vec![
            Paragraph::centered(vec![
                Run::new(section.name(), TITLE_FONT, TITLE_SIZE).bold()
            ]),
            Paragraph::centered(vec![Run::new(
                title_slide_subtitle(number, title),
                TITLE_FONT,
                TITLE_SIZE,
            )
            .bold()]),
        ],
        word_wrap: true,
    });
    slide
}

/// Message slide: title only, no hymn content.
pub fn message_slide() -> SlideSpec {
    let mut slide = SlideSpec::new();
    slide.push(ShapeSpec::TextBox {
        x: TITLE_BOX_X,
        y: TITLE_BOX_Y,
        cx: TITLE_BOX_CX,
        cy: TITLE_BOX_CY,
        paragraphs: vec![Paragraph::centered(vec![
            Run::new("Message", TITLE_FONT, TITLE_SIZE).bold(),
        ])],
        word_wrap: true,
    });
    slide
}

/// Pink title bar with the section label, on every content slide.
pub fn push_title_bar(slide: &mut SlideSpec, label: &str) {
    slide.push(ShapeSpec::Bar {
        x: 0,
        y: 0,
        cx: SLIDE_WIDTH,
        cy: TITLE_BAR_HEIGHT,
        color: TITLE_BAR_COLOR.to_string(),
    });
    slide.push(ShapeSpec::TextBox {
        x: 0,
        y: 50_000,
        cx: SLIDE_WIDTH,
        cy: TITLE_BAR_HEIGHT,
        paragraphs: vec![Paragraph::centered(vec![
            Run::new(label, TITLE_BAR_FONT, TITLE_BAR_SIZE)
                .bold()
                .color("000000"),
        ])],
        word_wrap: false,
    });
}

/// Content slide: title bar plus the extracted lyric blocks and images at
/// their source geometry. Label/Number blocks are not carried over; the new
/// title bar replaces the archival headers.
pub fn content_slide(
    deck: &mut DeckBuilder,
    label: &str,
    content: &ExtractedContent,
) -> SlideSpec {
    let mut slide = SlideSpec::new();
    push_title_bar(&mut slide, label);

    for block in &content.blocks {
        if block.role != Role::Lyric {
            continue;
        }
        // Source text that sat under the archival header is pushed below the
        // new bar so nothing overlaps it.
        let y = block.y.max(TITLE_BAR_HEIGHT + 100_000);
        let lines: Vec<Paragraph> = block
            .text
            .lines()
            .map(|line| {
                Paragraph {
                    runs: vec![Run::new(line, CONTENT_FONT, CONTENT_SIZE)],
                    align: Align::Left,
                }
            })
            .collect();
        slide.push(ShapeSpec::TextBox {
            x: block.x,
            y,
            cx: block.cx.max(EMU_PER_INCH),
            cy: block.cy.max(EMU_PER_INCH / 2),
            paragraphs: lines,
            word_wrap: true,
        });
    }

    for image in &content.images {
        // Archival QR/sidebar inserts are dropped; the composer stamps its
        // own media per section rules.
        if image.x >= SOURCE_SIDEBAR_X {
            continue;
        }
        let media = deck.add_media(image.bytes.clone(), image.ext.clone());
        slide.push(ShapeSpec::Picture {
            media,
            x: image.x,
            y: image.y,
            cx: image.cx,
            cy: image.cy,
        });
    }

    slide
}

/// Place the QR code (plus its caption, when configured) on a slide.
pub fn push_qr_code(slide: &mut SlideSpec, media: MediaRef, caption: Option<&str>) {
    slide.push(ShapeSpec::Picture {
        media,
        x: QR_X,
        y: QR_Y,
        cx: QR_CX,
        cy: QR_CY,
    });
    if let Some(caption) = caption {
        slide.push(ShapeSpec::TextBox {
            x: QR_X,
            y: QR_Y + QR_CY + EMU_PER_INCH / 10,
            cx: QR_CX,
            cy: EMU_PER_INCH * 3 / 10,
            paragraphs: vec![Paragraph::centered(vec![Run::new(caption, "Arial", 10)])],
            word_wrap: false,
        });
    }
}

/// Place the fixed Communion image on a slide.
pub fn push_communion_image(slide: &mut SlideSpec, media: MediaRef) {
    slide.push(ShapeSpec::Picture {
        media,
        x: COMMUNION_X,
        y: COMMUNION_Y,
        cx: COMMUNION_CX,
        cy: COMMUNION_CY,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use hymn_core::TextBlock;

    #[test]
    fn subtitle_variants() {
        assert_eq!(
            title_slide_subtitle(Some(313), "yeshuveppole aakuvaan"),
            "Hymn No. 313 - yeshuveppole aakuvaan"
        );
        assert_eq!(title_slide_subtitle(Some(313), ""), "Hymn No. 313");
        assert_eq!(
            title_slide_subtitle(None, "yeshuveppole aakuvaan"),
            "Hymn - yeshuveppole aakuvaan"
        );
        assert_eq!(title_slide_subtitle(None, ""), "Hymn");
    }

    #[test]
    fn content_slide_drops_header_blocks() {
        let content = ExtractedContent {
            blocks: vec![
                TextBlock {
                    role: Role::Label,
                    text: "Opening Hymn No 313".into(),
                    x: 0,
                    y: 0,
                    cx: 1_000_000,
                    cy: 400_000,
                },
                TextBlock {
                    role: Role::Lyric,
                    text: "yeshuveppole aakuvaan".into(),
                    x: 91_440,
                    y: 1_000_000,
                    cx: 5_000_000,
                    cy: 500_000,
                },
            ],
            images: Vec::new(),
        };
        let mut deck = DeckBuilder::new();
        let slide = content_slide(&mut deck, "Opening", &content);
        // Bar + bar text + one lyric box.
        assert_eq!(slide.shapes.len(), 3);
    }

    #[test]
    fn content_slide_shifts_text_below_bar() {
        let content = ExtractedContent {
            blocks: vec![TextBlock {
                role: Role::Lyric,
                text: "line".into(),
                x: 0,
                y: 0,
                cx: 1_000_000,
                cy: 400_000,
            }],
            images: Vec::new(),
        };
        let mut deck = DeckBuilder::new();
        let slide = content_slide(&mut deck, "Opening", &content);
        let ShapeSpec::TextBox { y, .. } = &slide.shapes[2] else {
            panic!("expected text box");
        };
        assert!(*y > TITLE_BAR_HEIGHT);
    }

    #[test]
    fn content_slide_drops_sidebar_images() {
        let content = ExtractedContent {
            blocks: vec![TextBlock {
                role: Role::Lyric,
                text: "line".into(),
                x: 0,
                y: 600_000,
                cx: 1_000_000,
                cy: 400_000,
            }],
            images: vec![hymn_core::EmbeddedImage {
                bytes: vec![1],
                ext: "png".into(),
                x: SOURCE_SIDEBAR_X + 1,
                y: 0,
                cx: 10,
                cy: 10,
            }],
        };
        let mut deck = DeckBuilder::new();
        let slide = content_slide(&mut deck, "Offertory", &content);
        assert!(slide
            .shapes
            .iter()
            .all(|s| !matches!(s, ShapeSpec::Picture { .. })));
    }
}
