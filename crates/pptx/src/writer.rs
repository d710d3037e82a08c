//! Output deck writer.
//!
//! Builds a fresh PPTX from slide specifications: a minimal master, one
//! blank layout, a theme, and the generated slides. Zip entry timestamps are
//! pinned so the same input always produces byte-identical output.

use hymn_core::{Error, Result};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Slide width in EMU (10 inches, matching the archival template decks).
pub const SLIDE_WIDTH: i64 = 9_144_000;
/// Slide height in EMU (7.5 inches).
pub const SLIDE_HEIGHT: i64 = 6_858_000;

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PRESENTATION_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const RELS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Handle to a media payload registered with the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRef(usize);

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// One styled text run.
#[derive(Debug, Clone)]
pub struct Run {
    pub text: String,
    pub font: String,
    /// Font size in points.
    pub size: u32,
    pub bold: bool,
    /// RGB color as six hex digits; slide default when absent.
    pub color: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            size,
            bold: false,
            color: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, rgb: impl Into<String>) -> Self {
        self.color = Some(rgb.into());
        self
    }
}

/// One paragraph of runs.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Align,
}

impl Paragraph {
    pub fn centered(runs: Vec<Run>) -> Self {
        Self {
            runs,
            align: Align::Center,
        }
    }

    pub fn left(runs: Vec<Run>) -> Self {
        Self {
            runs,
            align: Align::Left,
        }
    }
}

/// A shape to place on an output slide. All geometry in EMU.
#[derive(Debug, Clone)]
pub enum ShapeSpec {
    /// Borderless text box.
    TextBox {
        x: i64,
        y: i64,
        cx: i64,
        cy: i64,
        paragraphs: Vec<Paragraph>,
        word_wrap: bool,
    },
    /// Solid-fill rectangle (section title bars).
    Bar {
        x: i64,
        y: i64,
        cx: i64,
        cy: i64,
        /// RGB fill as six hex digits.
        color: String,
    },
    /// Embedded picture.
    Picture {
        media: MediaRef,
        x: i64,
        y: i64,
        cx: i64,
        cy: i64,
    },
}

/// One output slide.
#[derive(Debug, Clone, Default)]
pub struct SlideSpec {
    pub shapes: Vec<ShapeSpec>,
}

impl SlideSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: ShapeSpec) {
        self.shapes.push(shape);
    }
}

struct MediaItem {
    bytes: Vec<u8>,
    ext: String,
}

/// Accumulates slides and media, then serializes the finished deck.
#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<SlideSpec>,
    media: Vec<MediaItem>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a media payload, deduplicating identical bytes so a shared
    /// image (QR code on several slides) is stored once.
    pub fn add_media(&mut self, bytes: Vec<u8>, ext: impl Into<String>) -> MediaRef {
        let ext = normalize_media_ext(&ext.into());
        if let Some(idx) = self
            .media
            .iter()
            .position(|m| m.ext == ext && m.bytes == bytes)
        {
            return MediaRef(idx);
        }
        self.media.push(MediaItem { bytes, ext });
        MediaRef(self.media.len() - 1)
    }

    /// Append a slide; slides appear in the deck in append order.
    pub fn add_slide(&mut self, slide: SlideSpec) {
        self.slides.push(slide);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Serialize the deck to PPTX bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        // Fixed timestamp: re-running over the same input must yield
        // byte-identical output.
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        write_part(&mut zip, options, "[Content_Types].xml", &self.content_types())?;
        write_part(&mut zip, options, "_rels/.rels", &package_rels())?;
        write_part(&mut zip, options, "ppt/presentation.xml", &self.presentation_xml())?;
        write_part(
            &mut zip,
            options,
            "ppt/_rels/presentation.xml.rels",
            &self.presentation_rels(),
        )?;
        write_part(
            &mut zip,
            options,
            "ppt/slideMasters/slideMaster1.xml",
            &slide_master_xml(),
        )?;
        write_part(
            &mut zip,
            options,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &slide_master_rels(),
        )?;
        write_part(
            &mut zip,
            options,
            "ppt/slideLayouts/slideLayout1.xml",
            &slide_layout_xml(),
        )?;
        write_part(
            &mut zip,
            options,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &slide_layout_rels(),
        )?;
        write_part(&mut zip, options, "ppt/theme/theme1.xml", &theme_xml())?;

        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            write_part(
                &mut zip,
                options,
                &format!("ppt/slides/slide{n}.xml"),
                &slide_xml(slide),
            )?;
            write_part(
                &mut zip,
                options,
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                &self.slide_rels(slide),
            )?;
        }

        for (idx, media) in self.media.iter().enumerate() {
            let name = format!("ppt/media/image{}.{}", idx + 1, media.ext);
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::Zip(format!("Failed to start {name}: {e}")))?;
            zip.write_all(&media.bytes)
                .map_err(|e| Error::Zip(format!("Failed to write {name}: {e}")))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::Zip(format!("Failed to finalize archive: {e}")))?;
        Ok(cursor.into_inner())
    }

    fn content_types(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Types xmlns="{CONTENT_TYPES_NS}">"#));
        xml.push_str(
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        );
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

        let mut seen_exts: Vec<&str> = Vec::new();
        for media in &self.media {
            if !seen_exts.contains(&media.ext.as_str()) {
                seen_exts.push(&media.ext);
                xml.push_str(&format!(
                    r#"<Default Extension="{}" ContentType="{}"/>"#,
                    media.ext,
                    media_content_type(&media.ext)
                ));
            }
        }

        xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
        for n in 1..=self.slides.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(
            r#"<p:presentation xmlns:a="{DRAWING_NS}" xmlns:r="{RELS_NS}" xmlns:p="{PRESENTATION_NS}">"#
        ));
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        xml.push_str("<p:sldIdLst>");
        for idx in 0..self.slides.len() {
            let sld_id = 256 + idx;
            let r_id = idx + 2;
            xml.push_str(&format!(r#"<p:sldId id="{sld_id}" r:id="rId{r_id}"/>"#));
        }
        xml.push_str("</p:sldIdLst>");
        xml.push_str(&format!(
            r#"<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/>"#
        ));
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#));
        xml.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{RELS_NS}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
        ));
        for idx in 0..self.slides.len() {
            let r_id = idx + 2;
            let n = idx + 1;
            xml.push_str(&format!(
                r#"<Relationship Id="rId{r_id}" Type="{RELS_NS}/slide" Target="slides/slide{n}.xml"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn write_part<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| Error::Zip(format!("Failed to start {name}: {e}")))?;
    zip.write_all(content.as_bytes())
        .map_err(|e| Error::Zip(format!("Failed to write {name}: {e}")))?;
    Ok(())
}

fn normalize_media_ext(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext == "jpg" {
        "jpeg".to_string()
    } else {
        ext
    }
}

fn media_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "image/png",
    }
}

fn package_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PACKAGE_RELS_NS}"><Relationship Id="rId1" Type="{RELS_NS}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#
    )
}

fn empty_sp_tree() -> String {
    concat!(
        r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
        r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
    )
    .to_string()
}

fn slide_master_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<p:sldMaster xmlns:a="{DRAWING_NS}" xmlns:r="{RELS_NS}" xmlns:p="{PRESENTATION_NS}">"#
    ));
    xml.push_str("<p:cSld>");
    xml.push_str(r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#);
    xml.push_str(&empty_sp_tree());
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

fn slide_master_rels() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="{pkg}">"#,
            r#"<Relationship Id="rId1" Type="{rel}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{rel}/theme" Target="../theme/theme1.xml"/>"#,
            r#"</Relationships>"#
        ),
        pkg = PACKAGE_RELS_NS,
        rel = RELS_NS
    )
}

fn slide_layout_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<p:sldLayout xmlns:a="{DRAWING_NS}" xmlns:r="{RELS_NS}" xmlns:p="{PRESENTATION_NS}" type="blank" preserve="1">"#
    ));
    xml.push_str(r#"<p:cSld name="Blank">"#);
    xml.push_str(&empty_sp_tree());
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

fn slide_layout_rels() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="{pkg}">"#,
            r#"<Relationship Id="rId1" Type="{rel}/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
            r#"</Relationships>"#
        ),
        pkg = PACKAGE_RELS_NS,
        rel = RELS_NS
    )
}

/// Minimal but complete theme part; PowerPoint requires the full scheme
/// structure even when every slide overrides it.
fn theme_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<a:theme xmlns:a="{DRAWING_NS}" name="Deck Theme"><a:themeElements>"#
    ));
    xml.push_str(concat!(
        r#"<a:clrScheme name="Deck">"#,
        r#"<a:dk1><a:srgbClr val="000000"/></a:dk1>"#,
        r#"<a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#,
        r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2>"#,
        r#"<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
        r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1>"#,
        r#"<a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
        r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>"#,
        r#"<a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
        r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>"#,
        r#"<a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
        r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink>"#,
        r#"<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
        r#"</a:clrScheme>"#,
        r#"<a:fontScheme name="Deck">"#,
        r#"<a:majorFont><a:latin typeface="Segoe UI"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        r#"<a:minorFont><a:latin typeface="Segoe UI"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        r#"</a:fontScheme>"#,
        r#"<a:fmtScheme name="Deck">"#,
        r#"<a:fillStyleLst>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"</a:fillStyleLst>"#,
        r#"<a:lnStyleLst>"#,
        r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"</a:lnStyleLst>"#,
        r#"<a:effectStyleLst>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"</a:effectStyleLst>"#,
        r#"<a:bgFillStyleLst>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"</a:bgFillStyleLst>"#,
        r#"</a:fmtScheme>"#,
    ));
    xml.push_str("</a:themeElements></a:theme>");
    xml
}

fn slide_xml(slide: &SlideSpec) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<p:sld xmlns:a="{DRAWING_NS}" xmlns:r="{RELS_NS}" xmlns:p="{PRESENTATION_NS}">"#
    ));
    xml.push_str("<p:cSld>");
    xml.push_str(&empty_sp_tree());

    let mut shape_id = 2u32;
    let mut picture_no = 0usize;
    for shape in &slide.shapes {
        match shape {
            ShapeSpec::TextBox {
                x,
                y,
                cx,
                cy,
                paragraphs,
                word_wrap,
            } => {
                xml.push_str(&text_box_xml(shape_id, *x, *y, *cx, *cy, paragraphs, *word_wrap));
            }
            ShapeSpec::Bar { x, y, cx, cy, color } => {
                xml.push_str(&bar_xml(shape_id, *x, *y, *cx, *cy, color));
            }
            ShapeSpec::Picture { x, y, cx, cy, .. } => {
                picture_no += 1;
                // Picture rIds start at 2; rId1 is the layout relationship.
                let r_id = picture_no + 1;
                xml.push_str(&picture_xml(shape_id, r_id, *x, *y, *cx, *cy));
            }
        }
        shape_id += 1;
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    xml
}

impl DeckBuilder {
    fn slide_rels(&self, slide: &SlideSpec) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#));
        xml.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{RELS_NS}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#
        ));
        let mut r_id = 2usize;
        for shape in &slide.shapes {
            if let ShapeSpec::Picture { media, .. } = shape {
                let ext = &self.media[media.0].ext;
                xml.push_str(&format!(
                    r#"<Relationship Id="rId{r_id}" Type="{RELS_NS}/image" Target="../media/image{}.{ext}"/>"#,
                    media.0 + 1,
                ));
                r_id += 1;
            }
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn run_props_xml(run: &Run) -> String {
    let mut props = format!(r#"<a:rPr lang="en-US" sz="{}""#, run.size * 100);
    if run.bold {
        props.push_str(r#" b="1""#);
    }
    props.push_str(" dirty=\"0\">");
    if let Some(color) = &run.color {
        props.push_str(&format!(
            r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#
        ));
    }
    props.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(&run.font)));
    props.push_str("</a:rPr>");
    props
}

fn paragraph_xml(para: &Paragraph) -> String {
    let mut xml = String::from("<a:p>");
    if para.align == Align::Center {
        xml.push_str(r#"<a:pPr algn="ctr"/>"#);
    }
    for run in &para.runs {
        // In-frame break characters become explicit <a:br/> elements between
        // run segments.
        let mut first = true;
        for segment in run.text.split(['\u{b}', '\n']) {
            if !first {
                xml.push_str("<a:br/>");
            }
            first = false;
            xml.push_str("<a:r>");
            xml.push_str(&run_props_xml(run));
            xml.push_str(&format!("<a:t>{}</a:t>", escape(segment)));
            xml.push_str("</a:r>");
        }
    }
    xml.push_str("</a:p>");
    xml
}

fn text_box_xml(
    id: u32,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
    paragraphs: &[Paragraph],
    word_wrap: bool,
) -> String {
    let mut xml = String::new();
    xml.push_str("<p:sp>");
    xml.push_str(&format!(
        r#"<p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#
    ));
    xml.push_str("<p:spPr>");
    xml.push_str(&format!(
        r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#
    ));
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");
    let wrap = if word_wrap { "square" } else { "none" };
    xml.push_str(&format!(r#"<p:txBody><a:bodyPr wrap="{wrap}"/><a:lstStyle/>"#));
    if paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    } else {
        for para in paragraphs {
            xml.push_str(&paragraph_xml(para));
        }
    }
    xml.push_str("</p:txBody></p:sp>");
    xml
}

fn bar_xml(id: u32, x: i64, y: i64, cx: i64, cy: i64, color: &str) -> String {
    let mut xml = String::new();
    xml.push_str("<p:sp>");
    xml.push_str(&format!(
        r#"<p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>"#
    ));
    xml.push_str("<p:spPr>");
    xml.push_str(&format!(
        r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#
    ));
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str(&format!(
        r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:ln><a:noFill/></a:ln>"#
    ));
    xml.push_str("</p:spPr>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody>");
    xml.push_str("</p:sp>");
    xml
}

fn picture_xml(id: u32, r_id: usize, x: i64, y: i64, cx: i64, cy: i64) -> String {
    let mut xml = String::new();
    xml.push_str("<p:pic>");
    xml.push_str(&format!(
        r#"<p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>"#
    ));
    xml.push_str(&format!(
        r#"<p:blipFill><a:blip r:embed="rId{r_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#
    ));
    xml.push_str("<p:spPr>");
    xml.push_str(&format!(
        r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#
    ));
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PptxReader;
    use std::io::Cursor;

    fn lyric_slide(text: &str) -> SlideSpec {
        let mut slide = SlideSpec::new();
        slide.push(ShapeSpec::TextBox {
            x: 0,
            y: 0,
            cx: SLIDE_WIDTH,
            cy: 1_000_000,
            paragraphs: vec![Paragraph::centered(vec![Run::new(text, "Segoe UI", 23)])],
            word_wrap: true,
        });
        slide
    }

    #[test]
    fn empty_deck_serializes() {
        let deck = DeckBuilder::new();
        let bytes = deck.finish().unwrap();
        assert!(bytes.len() > 4);
        // ZIP magic
        assert_eq!(&bytes[..4], &[0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn round_trips_through_reader() {
        let mut deck = DeckBuilder::new();
        deck.add_slide(lyric_slide("daivame nin sannidhiyil"));
        deck.add_slide(lyric_slide("yeshuveppole aakuvaan"));
        let bytes = deck.finish().unwrap();

        let parsed = PptxReader::new()
            .parse(Cursor::new(bytes), "generated.pptx")
            .unwrap();
        assert_eq!(parsed.slides.len(), 2);
        assert_eq!(parsed.slides[0].texts[0].text, "daivame nin sannidhiyil");
        assert_eq!(parsed.slides[1].texts[0].text, "yeshuveppole aakuvaan");
    }

    #[test]
    fn pictures_round_trip_with_geometry() {
        let mut deck = DeckBuilder::new();
        let media = deck.add_media(vec![0x89, 0x50, 0x4E, 0x47], "png");
        let mut slide = SlideSpec::new();
        slide.push(ShapeSpec::Picture {
            media,
            x: 100,
            y: 200,
            cx: 300,
            cy: 400,
        });
        deck.add_slide(slide);
        let bytes = deck.finish().unwrap();

        let parsed = PptxReader::new()
            .parse(Cursor::new(bytes), "generated.pptx")
            .unwrap();
        let pic = &parsed.slides[0].pictures[0];
        assert_eq!(pic.bytes, vec![0x89, 0x50, 0x4E, 0x47]);
        assert_eq!((pic.x, pic.y, pic.cx, pic.cy), (100, 200, 300, 400));
        assert_eq!(pic.ext, "png");
    }

    #[test]
    fn identical_media_is_stored_once() {
        let mut deck = DeckBuilder::new();
        let a = deck.add_media(vec![1, 2, 3], "png");
        let b = deck.add_media(vec![1, 2, 3], "png");
        let c = deck.add_media(vec![4, 5, 6], "png");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            let mut deck = DeckBuilder::new();
            deck.add_slide(lyric_slide("vaazthin vaazhthin"));
            deck.finish().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn break_characters_become_line_breaks() {
        let mut deck = DeckBuilder::new();
        deck.add_slide(lyric_slide("first line\u{b}second line"));
        let bytes = deck.finish().unwrap();
        let parsed = PptxReader::new()
            .parse(Cursor::new(bytes), "generated.pptx")
            .unwrap();
        assert_eq!(parsed.slides[0].texts[0].text, "first line\u{b}second line");
    }

    #[test]
    fn escapes_xml_specials_in_text() {
        let mut deck = DeckBuilder::new();
        deck.add_slide(lyric_slide("praise & <worship>"));
        let bytes = deck.finish().unwrap();
        let parsed = PptxReader::new()
            .parse(Cursor::new(bytes), "generated.pptx")
            .unwrap();
        assert_eq!(parsed.slides[0].texts[0].text, "praise & <worship>");
    }
}
