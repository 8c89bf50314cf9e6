use crate::helpers::reference::index_to_reference;
use crate::helpers::reference::reference_to_index;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::builder::SheetBuilder;
use crate::spreadsheet::criteria::LoadOptions;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::NumberFormat;
use crate::spreadsheet::excel::MAX_COLUMNS;
use crate::spreadsheet::excel::MAX_ROWS;
use crate::spreadsheet::LoadError;
use crate::table::Cell;
use crate::table::Table;
use crate::table::TableSet;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use tracing::debug;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_DIMENSION: QName = QName(b"dimension");     // Declared used range of a worksheet
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// How the raw text of a `<c>` element is interpreted, from its `t` and `s` attributes.
#[derive(Copy, Clone, Debug, PartialEq)]
enum ValueKind {
    Number(NumberFormat),
    SharedString,
    InlineString,
    Boolean,
    IsoDateTime,
    Error,
}

impl Default for ValueKind {
    fn default() -> Self {
        ValueKind::Number(NumberFormat::General)
    }
}

/// Workbook-level parts shared by every worksheet.
struct Workbook {
    /// Worksheets as (name, zip_path) pairs, in workbook order
    sheets: Vec<(String, String)>,
    /// Number formats indexed by style ID
    number_formats: Vec<NumberFormat>,
    shared_strings: Vec<String>,
    is_1904: bool,
}

/// Reads every accepted worksheet of an XLSX workbook.
pub(super) fn load(bytes: &[u8], options: &LoadOptions) -> Result<TableSet, LoadError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let workbook = load_workbook(&mut zip)?;
    debug!("Workbook lists {} sheets (1904 dates: {})", workbook.sheets.len(), workbook.is_1904);

    let mut tables = TableSet::new();
    for (sheet_name, zip_path) in &workbook.sheets {
        if !options.accept(sheet_name) {
            debug!("Skip sheet '{}'", sheet_name);
            continue;
        }
        let table = read_sheet(&mut zip, &workbook, sheet_name, zip_path, options)?;
        tables.insert(sheet_name.to_owned(), table)?;
    }
    Ok(tables)
}

/// Loads sheet list, date system, number formats and shared strings.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Workbook, LoadError> {
    let (sheets, is_1904) = load_sheets(zip)?;
    let number_formats = load_number_formats(zip)?;
    let shared_strings = load_shared_strings(zip)?;
    Ok(Workbook {
        sheets,
        number_formats,
        shared_strings,
        is_1904,
    })
}

/// Parses `xl/workbook.xml` for worksheet names and paths, and whether the
/// workbook uses the 1904 date system.
fn load_sheets<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), LoadError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| LoadError::MissingPart("xl/workbook.xml".to_owned()))?;
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
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&*id) {
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

/// Loads number formats and cell styles from `xl/styles.xml`, indexed by style ID.
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<NumberFormat>, LoadError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, NumberFormat>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), NumberFormat::parse_custom_number_format(&format));
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_default());
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats))
}

/// Loads the shared string table, empty when the part is absent.
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, LoadError> {
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

/// Reads one worksheet's cells into a table.
fn read_sheet<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    workbook: &Workbook,
    sheet_name: &str,
    zip_path: &str,
    options: &LoadOptions,
) -> Result<Table, LoadError> {
    let mut sheet = SheetBuilder::new(sheet_name, options.skip_empty_rows);
    let mut reader = zip.xml_reader(zip_path)?
        .ok_or_else(|| LoadError::MissingPart(zip_path.to_owned()))?;
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = ValueKind::default();
    let mut value = None::<String>;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_DIMENSION => {
            let last = event.get_attribute_value("ref")?
                .and_then(|range| range.rsplit(':').next().and_then(reference_to_index));
            match last {
                Some((row, col)) if row < MAX_ROWS && col < MAX_COLUMNS => sheet.set_dimension(row, col),
                _ => debug!("Ignore dimension of sheet '{}'", sheet_name),
            }
        }
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(index) = event.parse_attribute_value::<usize>("r")? {
                row_count = index.saturating_sub(1);
            }
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            value = None;
            kind = match event.get_attribute_value("t")?.as_deref() {
                Some("inlineStr") | Some("str") => ValueKind::InlineString,
                Some("s") => ValueKind::SharedString,
                Some("d") => ValueKind::IsoDateTime,
                Some("b") => ValueKind::Boolean,
                Some("e") => ValueKind::Error,
                _ => {
                    let style = event.get_attribute_value("s")?
                        .filter(|style| !style.is_empty())
                        .map(|style| style.parse::<usize>())
                        .transpose()?;
                    let format = style
                        .and_then(|index| workbook.number_formats.get(index).copied())
                        .unwrap_or_default();
                    ValueKind::Number(format)
                }
            };
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = Some(read_string_value(&mut reader, TAG_INLINE_STRING, false)?);
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = Some(read_string_value(&mut reader, TAG_VALUE, true)?);
        }
        Event::End(event) if event.name() == TAG_CELL => {
            let cell_error = |message: String| LoadError::CellValue {
                sheet: sheet_name.to_owned(),
                reference: index_to_reference(row, col),
                message,
            };
            if row >= MAX_ROWS || col >= MAX_COLUMNS {
                Err(cell_error(format!("cell lies outside the {MAX_ROWS} x {MAX_COLUMNS} worksheet grid")))?
            }
            let cell = to_cell(workbook, kind, value.take().as_deref(), options).map_err(cell_error)?;
            if !cell.is_missing() {
                sheet.push(row, col, cell);
            }
        }
    });

    if sheet.is_empty() {
        debug!("Sheet '{}' has no cells", sheet.name);
    }
    let table = sheet.finish()?;
    debug!(
        "Read sheet '{}': {} rows x {} columns",
        sheet_name,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Converts the raw value of a cell according to its kind. `None` means the
/// cell has no value element.
///
/// A string written explicitly as empty stays an empty text; null literals
/// only apply to non-empty strings.
fn to_cell(workbook: &Workbook, kind: ValueKind, value: Option<&str>, options: &LoadOptions) -> Result<Cell, String> {
    let text = |value: &str| {
        if !value.is_empty() && options.is_null(value) {
            Cell::Missing
        } else {
            Cell::text(value)
        }
    };
    let Some(value) = value else {
        return Ok(Cell::Missing);
    };
    if value.is_empty() && kind != ValueKind::InlineString {
        return Ok(Cell::Missing);
    }
    let cell = match kind {
        ValueKind::Number(format) => {
            let number = value
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("parse '{value}' to number failed"))?;
            match format.render(number, workbook.is_1904) {
                Some(rendered) => Cell::Text(rendered),
                None => Cell::number(number),
            }
        }
        ValueKind::SharedString => {
            let index = value
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("parse '{value}' to shared string index failed"))?;
            let string = workbook
                .shared_strings
                .get(index)
                .ok_or_else(|| format!("shared string {index} does not exist"))?;
            text(string.as_str())
        }
        ValueKind::InlineString => text(value),
        ValueKind::Boolean => Cell::Boolean(matches!(value.trim(), "1" | "true" | "TRUE")),
        ValueKind::IsoDateTime => Cell::Text(value.replace('T', " ")),
        ValueKind::Error if options.error_as_null => Cell::Missing,
        ValueKind::Error => Cell::text(value),
    };
    Ok(cell)
}

/// Reads string value from XML content, skipping phonetic annotations and
/// handling both text nodes and CDATA sections.
fn read_string_value<R: BufRead>(reader: &mut XmlReader<R>, end_tag: QName, is_text_content: bool) -> Result<String, LoadError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
