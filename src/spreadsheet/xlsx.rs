use crate::error::RackScanError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::MergedRange;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SheetFilter;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// XML tag names for parsing the XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_BORDERS: QName = QName(b"borders");        // Border definitions container
const TAG_BORDER: QName = QName(b"border");          // Individual border definition
const TAG_BORDER_TOP: QName = QName(b"top");         // Top edge of a border definition
const TAG_BORDER_BOTTOM: QName = QName(b"bottom");   // Bottom edge of a border definition
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs"); // Cell format records container
const TAG_FORMAT_INDEX: QName = QName(b"xf");        // Individual cell format record
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");  // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");      // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                 // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");            // Worksheet definition
const TAG_ROW: QName = QName(b"row");                // Row in worksheet
const TAG_CELL: QName = QName(b"c");                 // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");       // Inline string value
const TAG_VALUE: QName = QName(b"v");                // Cell value content
const TAG_MERGE_CELL: QName = QName(b"mergeCell");   // Merged cell range

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// One cell format record from `xl/styles.xml`, reduced to what the rack
/// parser consumes: the value classification and the drawn border edges.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct CellFormat {
    pub(crate) kind: CellType,
    pub(crate) top_border: bool,
    pub(crate) bottom_border: bool,
}

/// An open XLSX workbook.
pub struct XlsxWorkbook<RS: Read + Seek> {
    /// File name of the workbook
    name: String,
    /// ZIP archive containing the XLSX file contents
    zip: ZipArchive<RS>,
    /// Parsed cell formats indexed by style id
    formats: Vec<CellFormat>,
    /// List of worksheets with (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook<BufReader<File>> {
    /// Opens an XLSX workbook from a file path.
    pub fn open(file_name: &str) -> Result<Self, RackScanError> {
        let file = File::open(file_name).map_err(RackScanError::from).with_prefix(file_name)?;
        Self::from_reader(file_name, BufReader::new(file))
    }
}

impl<RS: Read + Seek> XlsxWorkbook<RS> {
    /// Opens an XLSX workbook from any seekable reader and parses its structure.
    pub fn from_reader(file_name: &str, reader: RS) -> Result<Self, RackScanError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbookError(file_name.to_owned()))?
        }

        let formats = load_styles(&mut zip, is_1904)?;
        Ok(XlsxWorkbook {
            name: file_name.to_owned(),
            zip,
            formats,
            sheets,
        })
    }

    /// Returns the names of all worksheets in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads the worksheets accepted by the filter.
    ///
    /// A worksheet that fails to parse is reported and skipped; the remaining
    /// worksheets are still returned.
    pub fn read_sheets(&mut self, filter: &SheetFilter) -> Result<Vec<Sheet>, RackScanError> {
        let shared_strings = load_shared_strings(&mut self.zip)?;
        let mut sheets = Vec::<Sheet>::new();
        for (sheet_name, zip_path) in self.sheets.clone() {
            if !filter.accept(&sheet_name) {
                continue;
            }
            match read_sheet(&mut self.zip, &self.name, &sheet_name, &zip_path, &self.formats, &shared_strings) {
                Ok(sheet) => sheets.push(sheet),
                Err(error) => log::warn!("skipping unreadable worksheet '{}': {}", sheet_name, error),
            }
        }
        Ok(sheets)
    }
}

/// Loads workbook structure and worksheet information
///
/// Parses the workbook.xml file to extract worksheet names and their
/// corresponding XML file paths, and determines the date system (1900 vs 1904)
/// used in the file.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), RackScanError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id.to_string()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads worksheet relationships, mapping relationship IDs to worksheet paths.
fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<HashMap<String, String>, RackScanError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only process worksheet relationships
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path within the archive.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if path.starts_with("/xl/") {
        path[1..].to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Loads cell formats from `xl/styles.xml`.
///
/// Combines three sections into one format table indexed by style id:
/// custom number formats (for date/time classification), border definitions
/// (reduced to top/bottom edge presence), and the cellXfs records tying each
/// style id to a number format and a border definition.
fn load_styles<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellFormat>, RackScanError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut borders_context = false;
    let mut borders = Vec::<(bool, bool)>::new();

    let mut cell_formats_context = false;
    let mut cell_formats = Vec::<(String, usize)>::new();

    match_xml_events!(reader => {
        Event::Start(event) if !custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = true;
        }
        Event::End(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = false;
        }
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let kind = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), kind);
            }
        }

        Event::Start(event) if !borders_context && event.name() == TAG_BORDERS => {
            borders_context = true;
        }
        Event::End(event) if borders_context && event.name() == TAG_BORDERS => {
            borders_context = false;
        }
        Event::Start(event) if borders_context && event.name() == TAG_BORDER => {
            borders.push((false, false));
        }
        Event::Start(event) if borders_context && event.name() == TAG_BORDER_TOP => {
            if has_border_style(&event)? {
                if let Some(border) = borders.last_mut() {
                    border.0 = true;
                }
            }
        }
        Event::Start(event) if borders_context && event.name() == TAG_BORDER_BOTTOM => {
            if has_border_style(&event)? {
                if let Some(border) = borders.last_mut() {
                    border.1 = true;
                }
            }
        }

        Event::Start(event) if !cell_formats_context && event.name() == TAG_FORMAT_INDEXES => {
            cell_formats_context = true;
        }
        Event::End(event) if cell_formats_context && event.name() == TAG_FORMAT_INDEXES => {
            cell_formats_context = false;
        }
        Event::Start(event) if cell_formats_context && event.name() == TAG_FORMAT_INDEX => {
            let format_id = event.get_attribute_value("numFmtId")?
                .map(|id| id.to_string())
                .unwrap_or_else(|| "0".to_string());
            let border_id = event.parse_attribute_value::<usize>("borderId")?.unwrap_or(0);
            cell_formats.push((format_id, border_id));
        }
    });

    let formats = cell_formats
        .into_iter()
        .map(|(format_id, border_id)| {
            let kind = custom_formats
                .get(&format_id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(&format_id, is_1904))
                .unwrap_or(CellType::Number);
            let (top_border, bottom_border) = borders.get(border_id).copied().unwrap_or((false, false));
            CellFormat {
                kind,
                top_border,
                bottom_border,
            }
        })
        .collect();
    Ok(formats)
}

/// Checks whether a border edge element declares a drawn style.
fn has_border_style(event: &quick_xml::events::BytesStart<'_>) -> Result<bool, RackScanError> {
    Ok(event.get_attribute_value("style")?
        .map(|style| !style.is_empty() && style != "none")
        .unwrap_or(false))
}

/// Loads the shared string table, fully resolved.
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, RackScanError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads one worksheet into a random-access sheet.
///
/// Cells are retained when they carry a value or a border flag; borders on
/// empty cells still delimit label blocks. Shared string references are
/// resolved in place, and merged ranges are recorded on the sheet.
fn read_sheet<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    file_name: &str,
    sheet_name: &str,
    zip_path: &str,
    formats: &[CellFormat],
    shared_strings: &[String],
) -> Result<Sheet, RackScanError> {
    let mut sheet = Sheet::new(file_name, sheet_name);
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut format = CellFormat::default();
    let mut value = String::new();
    let mut reader = zip.xml_reader(zip_path)?
        .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => CellType::InlineString,
                    "s" => CellType::SharedString,
                    "b" => CellType::Boolean,
                    "e" => CellType::Error,
                    _ => CellType::Number,
                }
            }).unwrap_or(CellType::Number);
            format = CellFormat::default();
            if let Some(style_id) = event.get_attribute_value("s")? {
                if !style_id.is_empty() {
                    let index = style_id.parse::<usize>()?;
                    if let Some(cell_format) = formats.get(index) {
                        format = *cell_format;
                        if kind == CellType::Number {
                            kind = cell_format.kind;
                        }
                    }
                }
            }
            value.clear();
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if !value.is_empty() || format.top_border || format.bottom_border {
                let resolved = if kind == CellType::SharedString {
                    let index = value.parse::<usize>()?;
                    match shared_strings.get(index) {
                        Some(string) => string.to_owned(),
                        None => {
                            log::warn!("missing shared string {} at {}", index, index_to_reference(row, col));
                            String::new()
                        }
                    }
                } else {
                    value.to_owned()
                };
                let kind = if resolved.is_empty() { CellType::Empty } else { kind };
                sheet.push(Cell {
                    row,
                    col,
                    kind,
                    value: resolved,
                    top_border: format.top_border,
                    bottom_border: format.bottom_border,
                });
            }
            value.clear();
        }
        Event::Start(event) if event.name() == TAG_MERGE_CELL => {
            if let Some(reference) = event.get_attribute_value("ref")? {
                sheet.push_merge(MergedRange::try_from(reference.as_ref())?);
            }
        }
    });
    Ok(sheet)
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text
/// annotations and properly handling both text nodes and CDATA sections.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, RackScanError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rack::Grid;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="DC1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

    // border 0: none, border 1: top only, border 2: top+bottom, border 3: bottom only
    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
  <borders count="4">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left/><right/><top style="thin"/><bottom/><diagonal/></border>
    <border><left/><right/><top style="thin"/><bottom style="thin"/><diagonal/></border>
    <border><left/><right/><top/><bottom style="medium"/><diagonal/></border>
  </borders>
  <cellXfs count="5">
    <xf numFmtId="0" borderId="0"/>
    <xf numFmtId="0" borderId="1"/>
    <xf numFmtId="0" borderId="2"/>
    <xf numFmtId="0" borderId="3"/>
    <xf numFmtId="164" borderId="0"/>
  </cellXfs>
</styleSheet>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>core-sw-01</t></si>
  <si><r><t>two </t></r><r><t>runs</t></r></si>
</sst>"#;

    const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="s" s="1"><v>0</v></c>
      <c r="B1"><v>42</v></c>
      <c r="C1" s="2"/>
      <c r="D1" t="s"><v>1</v></c>
      <c r="E1" t="b"><v>1</v></c>
      <c r="F1" s="4"><v>45108</v></c>
    </row>
    <row r="2">
      <c r="A2" t="inlineStr"><is><t>inline text</t></is></c>
      <c r="B2" s="3"/>
    </row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A1:A2"/></mergeCells>
</worksheet>"#;

    fn workbook_archive(entries: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(name.to_string(), SimpleFileOptions::default()).expect("zip entry");
            writer.write_all(content.as_bytes()).expect("zip write");
        }
        writer.finish().expect("zip finish")
    }

    fn open_fixture() -> XlsxWorkbook<Cursor<Vec<u8>>> {
        let archive = workbook_archive(&[
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", SHEET1),
        ]);
        XlsxWorkbook::from_reader("fixture.xlsx", archive).expect("workbook")
    }

    #[test]
    fn workbook_lists_sheets() {
        let workbook = open_fixture();
        assert_eq!(workbook.sheet_names(), vec!["DC1".to_owned()]);
    }

    #[test]
    fn sheet_cells_resolved_and_flagged() {
        let mut workbook = open_fixture();
        let sheets = workbook.read_sheets(&SheetFilter::default()).expect("sheets");
        assert_eq!(sheets.len(), 1);
        let sheet = &sheets[0];

        // shared string resolved, border flag from style
        assert_eq!(sheet.text(0, 0), Some("core-sw-01".to_owned()));
        assert!(sheet.has_top_border(0, 0));
        assert!(!sheet.has_bottom_border(0, 0));

        // plain number
        assert_eq!(sheet.integer(0, 1), Some(42));

        // styled empty cell retained with both border flags
        assert_eq!(sheet.text(0, 2), None);
        assert!(sheet.has_top_border(0, 2));
        assert!(sheet.has_bottom_border(0, 2));

        // multi-run shared string
        assert_eq!(sheet.text(0, 3), Some("two runs".to_owned()));

        // boolean is not an integer
        assert_eq!(sheet.integer(0, 4), None);
        assert_eq!(sheet.text(0, 4), Some("true".to_owned()));

        // custom date format renders as a date
        assert_eq!(sheet.text(0, 5), Some("2023-07-01".to_owned()));

        // inline string and bottom-only border
        assert_eq!(sheet.text(1, 0), Some("inline text".to_owned()));
        assert!(sheet.has_bottom_border(1, 1));
        assert!(!sheet.has_top_border(1, 1));

        // merged range membership
        assert!(sheet.is_merged(0, 0));
        assert!(sheet.is_merged(1, 0));
        assert!(!sheet.is_merged(0, 1));
    }

    #[test]
    fn sheet_filter_applies() {
        let mut workbook = open_fixture();
        let patterns = vec![glob::Pattern::new("other*").expect("pattern")];
        let sheets = workbook.read_sheets(&SheetFilter::new(Some(patterns))).expect("sheets");
        assert!(sheets.is_empty());
    }

    #[test]
    fn workbook_without_sheets_is_an_error() {
        let archive = workbook_archive(&[
            ("xl/_rels/workbook.xml.rels", RELS),
            (
                "xl/workbook.xml",
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets/></workbook>"#,
            ),
        ]);
        assert!(XlsxWorkbook::from_reader("empty.xlsx", archive).is_err());
    }
}
