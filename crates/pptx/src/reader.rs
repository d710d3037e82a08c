//! PPTX file reader.
//!
//! Extracts, per slide, the text frames (with their EMU geometry and with
//! in-frame line breaks preserved as `\u{b}`) and the embedded pictures
//! (bytes copied out of the archive, geometry preserved). Formatting beyond
//! that is deliberately dropped: downstream composition re-renders content
//! in the output deck's own style.

use hymn_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// A parsed presentation: slides in presentation order.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    /// Original filename (without path).
    pub filename: String,
    pub slides: Vec<RawSlide>,
}

/// One slide as read from the archive.
#[derive(Debug, Clone, Default)]
pub struct RawSlide {
    /// 1-based slide number in presentation order.
    pub number: usize,
    /// Text frames in document order.
    pub texts: Vec<RawTextFrame>,
    /// Embedded pictures in document order.
    pub pictures: Vec<RawPicture>,
}

impl RawSlide {
    /// All frame text joined with spaces; used by scanners that only care
    /// about token presence, not layout.
    pub fn all_text(&self) -> String {
        self.texts
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A text frame with source geometry in EMU.
#[derive(Debug, Clone, Default)]
pub struct RawTextFrame {
    /// Paragraphs joined with `\n`; explicit in-frame breaks kept as `\u{b}`.
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// An embedded picture, copied by byte value.
#[derive(Debug, Clone, Default)]
pub struct RawPicture {
    pub bytes: Vec<u8>,
    /// Lowercased extension taken from the media part name.
    pub ext: String,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Parser for PPTX (Office Open XML) files.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse a PPTX file from disk.
    pub fn open(&self, path: &Path) -> Result<SlideDeck> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.parse(BufReader::new(file), &filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<SlideDeck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::CorruptedFile(format!("{filename}: not a ZIP container: {e}")))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut slides = Vec::with_capacity(slide_paths.len());

        for (idx, slide_path) in slide_paths.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            slides.push(slide);
        }

        Ok(SlideDeck {
            filename: filename.to_string(),
            slides,
        })
    }

    /// Ordered slide part paths from the presentation relationships.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content =
            self.read_text_part(archive, "ppt/_rels/presentation.xml.rels")?;

        let mut slides: Vec<(String, Option<usize>)> = Vec::new();
        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    if rel_type.contains("/slide")
                        && !rel_type.contains("slideLayout")
                        && !rel_type.contains("slideMaster")
                    {
                        let order = extract_part_number(&id).or_else(|| extract_part_number(&target));
                        let full_path = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("ppt/{target}")
                        };
                        slides.push((full_path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!("Error parsing relationships: {e}")));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse one slide part: text frames plus resolved pictures.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<RawSlide> {
        let content = self.read_text_part(archive, slide_path)?;
        let (texts, picture_refs) = parse_slide_xml(&content)?;

        let mut slide = RawSlide {
            number: slide_number,
            texts,
            pictures: Vec::new(),
        };

        if !picture_refs.is_empty() {
            let rels = self.slide_relationships(archive, slide_path)?;
            for pic in picture_refs {
                let Some(target) = rels.get(&pic.rel_id) else {
                    log::warn!("{slide_path}: no relationship for {}", pic.rel_id);
                    continue;
                };
                let media_path = resolve_media_path(target);
                match self.read_binary_part(archive, &media_path) {
                    Ok(bytes) => slide.pictures.push(RawPicture {
                        bytes,
                        ext: media_extension(&media_path),
                        x: pic.x,
                        y: pic.y,
                        cx: pic.cx,
                        cy: pic.cy,
                    }),
                    Err(e) => {
                        // Missing media is a per-picture condition, not fatal
                        // for the slide.
                        log::warn!("{slide_path}: could not read {media_path}: {e}");
                    }
                }
            }
        }

        Ok(slide)
    }

    /// Relationship Id -> Target map for one slide part.
    fn slide_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<HashMap<String, String>> {
        let rels_path = rels_path_for(slide_path);
        let mut map = HashMap::new();

        let content = match self.read_text_part(archive, &rels_path) {
            Ok(c) => c,
            // A slide without relationships has no pictures to resolve.
            Err(_) => return Ok(map),
        };

        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut target = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }
                    if !id.is_empty() {
                        map.insert(id, target);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(format!("Error parsing slide rels: {e}"))),
                _ => {}
            }
        }
        Ok(map)
    }

    /// Read a UTF-8 part from the archive.
    fn read_text_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{path}': {e}")))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{path}': {e}")))?;
        Ok(content)
    }

    /// Read a binary part (media) from the archive.
    fn read_binary_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{path}': {e}")))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::Zip(format!("Failed to read '{path}': {e}")))?;
        Ok(bytes)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Unresolved picture reference collected while walking slide XML.
#[derive(Debug, Default)]
struct PictureRef {
    rel_id: String,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

/// Geometry + text accumulator for the shape currently being walked.
#[derive(Debug, Default)]
struct ShapeAccum {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
    rel_id: String,
}

/// Walk slide XML collecting text frames and picture references.
fn parse_slide_xml(xml_content: &str) -> Result<(Vec<RawTextFrame>, Vec<PictureRef>)> {
    let mut texts = Vec::new();
    let mut pictures = Vec::new();

    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current: Option<ShapeAccum> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" | b"pic" => current = Some(ShapeAccum::default()),
                    b"off" => read_offset(e, &mut current),
                    b"ext" => read_extent(e, &mut current),
                    b"blip" => read_blip(e, &mut current),
                    b"txBody" => in_text_body = true,
                    b"p" if in_text_body => {
                        in_paragraph = true;
                        if !current_text.is_empty() {
                            current_text.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"off" => read_offset(e, &mut current),
                    b"ext" => read_extent(e, &mut current),
                    b"blip" => read_blip(e, &mut current),
                    // Explicit line break inside a paragraph; preserved as the
                    // archival in-frame break character.
                    b"br" if in_paragraph => current_text.push('\u{b}'),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" => {
                        if let Some(shape) = current.take() {
                            let text = current_text.trim().to_string();
                            if !text.is_empty() {
                                texts.push(RawTextFrame {
                                    text,
                                    x: shape.x,
                                    y: shape.y,
                                    cx: shape.cx,
                                    cy: shape.cy,
                                });
                            }
                        }
                        current_text.clear();
                        in_text_body = false;
                        in_paragraph = false;
                    }
                    b"pic" => {
                        if let Some(shape) = current.take() {
                            if !shape.rel_id.is_empty() {
                                pictures.push(PictureRef {
                                    rel_id: shape.rel_id,
                                    x: shape.x,
                                    y: shape.y,
                                    cx: shape.cx,
                                    cy: shape.cy,
                                });
                            }
                        }
                        current_text.clear();
                        in_text_body = false;
                        in_paragraph = false;
                    }
                    b"txBody" => in_text_body = false,
                    b"p" => in_paragraph = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {e}");
            }
            _ => {}
        }
    }

    Ok((texts, pictures))
}

fn read_offset(e: &quick_xml::events::BytesStart<'_>, current: &mut Option<ShapeAccum>) {
    if let Some(shape) = current.as_mut() {
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"x" => {
                    if let Ok(x) = String::from_utf8_lossy(&attr.value).parse::<i64>() {
                        shape.x = x;
                    }
                }
                b"y" => {
                    if let Ok(y) = String::from_utf8_lossy(&attr.value).parse::<i64>() {
                        shape.y = y;
                    }
                }
                _ => {}
            }
        }
    }
}

fn read_extent(e: &quick_xml::events::BytesStart<'_>, current: &mut Option<ShapeAccum>) {
    // `a:ext` also appears inside `a:extLst` with a `uri` attribute; only the
    // geometry variant carries cx/cy.
    if let Some(shape) = current.as_mut() {
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"cx" => {
                    if let Ok(cx) = String::from_utf8_lossy(&attr.value).parse::<i64>() {
                        shape.cx = cx;
                    }
                }
                b"cy" => {
                    if let Ok(cy) = String::from_utf8_lossy(&attr.value).parse::<i64>() {
                        shape.cy = cy;
                    }
                }
                _ => {}
            }
        }
    }
}

fn read_blip(e: &quick_xml::events::BytesStart<'_>, current: &mut Option<ShapeAccum>) {
    if let Some(shape) = current.as_mut() {
        for attr in e.attributes().flatten() {
            if local_name(attr.key.as_ref()) == b"embed" {
                shape.rel_id = String::from_utf8_lossy(&attr.value).to_string();
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a trailing part number from a string like "rId2" or "slide3.xml".
fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

/// Relationship part path for a slide part
/// (`ppt/slides/slide3.xml` -> `ppt/slides/_rels/slide3.xml.rels`).
fn rels_path_for(slide_path: &str) -> String {
    match slide_path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{slide_path}.rels"),
    }
}

/// Resolve a relationship target like `../media/image1.png` relative to the
/// slides directory.
fn resolve_media_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else if let Some(stripped) = target.strip_prefix("../") {
        format!("ppt/{stripped}")
    } else {
        format!("ppt/slides/{target}")
    }
}

/// Lowercased extension of a media part name.
fn media_extension(path: &str) -> String {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}
