//! Minimal XLSX (SpreadsheetML) writer.
//!
//! Same container family as the deck output: a ZIP archive of XML parts.
//! Strings are written inline (no shared-string table) and zip timestamps
//! are pinned, so identical input produces byte-identical workbooks.

use hymn_core::{Error, Result};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Widest column emitted, in character units.
const MAX_COLUMN_WIDTH: usize = 60;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(i64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn display_width(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Empty => 0,
        }
    }
}

/// One worksheet: a header row plus data rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: &[&str]) -> Self {
        Self {
            name: name.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Column widths fitted to content, as the archival reports did.
    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate() {
                if col >= widths.len() {
                    widths.resize(col + 1, 0);
                }
                widths[col] = widths[col].max(cell.display_width());
            }
        }
        widths
            .into_iter()
            .map(|w| (w + 2).min(MAX_COLUMN_WIDTH))
            .collect()
    }
}

/// Multi-sheet workbook.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Serialize to XLSX bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(Error::config("workbook needs at least one sheet"));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        write_part(&mut zip, options, "[Content_Types].xml", &self.content_types())?;
        write_part(&mut zip, options, "_rels/.rels", &package_rels())?;
        write_part(&mut zip, options, "xl/workbook.xml", &self.workbook_xml())?;
        write_part(
            &mut zip,
            options,
            "xl/_rels/workbook.xml.rels",
            &self.workbook_rels(),
        )?;
        write_part(&mut zip, options, "xl/styles.xml", &styles_xml())?;

        for (idx, sheet) in self.sheets.iter().enumerate() {
            write_part(
                &mut zip,
                options,
                &format!("xl/worksheets/sheet{}.xml", idx + 1),
                &worksheet_xml(sheet),
            )?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::Zip(format!("Failed to finalize workbook: {e}")))?;
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
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        for n in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(
            r#"<workbook xmlns="{SPREADSHEET_NS}" xmlns:r="{RELS_NS}"><sheets>"#
        ));
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let n = idx + 1;
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
                escape(&sheet.name)
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#));
        for idx in 0..self.sheets.len() {
            let n = idx + 1;
            xml.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="{RELS_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
        }
        let styles_id = self.sheets.len() + 1;
        xml.push_str(&format!(
            r#"<Relationship Id="rId{styles_id}" Type="{RELS_NS}/styles" Target="styles.xml"/>"#
        ));
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

fn package_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PACKAGE_RELS_NS}"><Relationship Id="rId1" Type="{RELS_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

/// Two cell formats: 0 = default, 1 = header (bold white on the blue fill
/// the archival reports used).
fn styles_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<styleSheet xmlns="{SPREADSHEET_NS}">"#));
    xml.push_str(concat!(
        r#"<fonts count="2">"#,
        r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
        r#"<font><b/><sz val="12"/><color rgb="FFFFFFFF"/><name val="Calibri"/></font>"#,
        r#"</fonts>"#,
        r#"<fills count="3">"#,
        r#"<fill><patternFill patternType="none"/></fill>"#,
        r#"<fill><patternFill patternType="gray125"/></fill>"#,
        r#"<fill><patternFill patternType="solid"><fgColor rgb="FF4472C4"/><bgColor indexed="64"/></patternFill></fill>"#,
        r#"</fills>"#,
        r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
        r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        r#"<cellXfs count="2">"#,
        r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
        r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
        r#"</cellXfs>"#,
        r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    ));
    xml.push_str("</styleSheet>");
    xml
}

fn worksheet_xml(sheet: &Sheet) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<worksheet xmlns="{SPREADSHEET_NS}">"#));

    let widths = sheet.column_widths();
    if !widths.is_empty() {
        xml.push_str("<cols>");
        for (idx, width) in widths.iter().enumerate() {
            let col = idx + 1;
            xml.push_str(&format!(
                r#"<col min="{col}" max="{col}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    xml.push_str(r#"<row r="1">"#);
    for (col, value) in sheet.header.iter().enumerate() {
        xml.push_str(&format!(
            r#"<c r="{}" s="1" t="inlineStr"><is><t>{}</t></is></c>"#,
            cell_ref(col, 0),
            escape(value)
        ));
    }
    xml.push_str("</row>");

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let r = row_idx + 2;
        xml.push_str(&format!(r#"<row r="{r}">"#));
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    cell_ref(col, row_idx + 1),
                    escape(value)
                )),
                Cell::Number(value) => xml.push_str(&format!(
                    r#"<c r="{}"><v>{value}</v></c>"#,
                    cell_ref(col, row_idx + 1)
                )),
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// A1-style reference for 0-based column and row.
fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

fn column_name(mut col: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn cell_refs() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(2, 4), "C5");
    }

    #[test]
    fn workbook_serializes_as_zip() {
        let mut sheet = Sheet::new("Data", &["Number", "Title"]);
        sheet.push_row(vec![Cell::Number(313), Cell::text("yeshuveppole")]);
        let mut wb = Workbook::new();
        wb.add_sheet(sheet);
        let bytes = wb.finish().unwrap();
        assert_eq!(&bytes[..4], &[0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn empty_workbook_is_rejected() {
        assert!(Workbook::new().finish().is_err());
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            let mut sheet = Sheet::new("S", &["A"]);
            sheet.push_row(vec![Cell::text("value")]);
            let mut wb = Workbook::new();
            wb.add_sheet(sheet);
            wb.finish().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn text_cells_are_escaped() {
        let mut sheet = Sheet::new("S", &["A"]);
        sheet.push_row(vec![Cell::text("a < b & c")]);
        let xml = worksheet_xml(&sheet);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn column_widths_fit_content() {
        let mut sheet = Sheet::new("S", &["A"]);
        sheet.push_row(vec![Cell::text("a rather long cell value here")]);
        let widths = sheet.column_widths();
        assert_eq!(widths[0], "a rather long cell value here".len() + 2);
    }
}
