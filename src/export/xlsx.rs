use crate::export::ExportError;
use crate::helpers::reference::index_to_reference;
use crate::table::Cell;
use crate::table::Table;
use crate::table::TableSet;
use quick_xml::escape::escape;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Cursor;
use std::io::Write;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Maximum length of a worksheet name
const SHEET_NAME_LIMIT: usize = 31;
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Smallest stylesheet Excel accepts: one font, the two reserved fills, one
/// border and the `Normal` cell style.
const STYLES: &str = r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#;

/// Writes every sheet, in order, into a minimal Office Open XML workbook.
pub fn export_xlsx(tables: &TableSet) -> Result<Vec<u8>, ExportError> {
    if tables.is_empty() {
        return Err(ExportError::NoSheets);
    }
    validate_sheet_names(tables)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut part = |name: &str, content: String| -> Result<(), ExportError> {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    };

    part("[Content_Types].xml", content_types(tables.len()))?;
    part("_rels/.rels", package_relationships())?;
    part("xl/workbook.xml", workbook(tables))?;
    part("xl/_rels/workbook.xml.rels", workbook_relationships(tables.len()))?;
    part("xl/styles.xml", format!(r#"{XML_DECLARATION}<styleSheet xmlns="{NS_MAIN}">{STYLES}</styleSheet>"#))?;
    for (index, (name, table)) in tables.iter().enumerate() {
        debug!("Write sheet '{}' ({} rows)", name, table.row_count());
        part(&format!("xl/worksheets/sheet{}.xml", index + 1), worksheet(table))?;
    }

    let bytes = zip.finish()?.into_inner();
    Ok(bytes)
}

/// Checks sheet names against Excel's rules: 1 to 31 characters, none of
/// `[]:*?/\`, unique ignoring case.
fn validate_sheet_names(tables: &TableSet) -> Result<(), ExportError> {
    let mut names = HashSet::<String>::with_capacity(tables.len());
    for name in tables.names() {
        let invalid = |reason: &str| ExportError::InvalidSheetName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        let length = name.chars().count();
        if length == 0 {
            Err(invalid("sheet names cannot be empty"))?
        } else if length > SHEET_NAME_LIMIT {
            Err(invalid("sheet names are limited to 31 characters"))?
        } else if name.contains(SHEET_NAME_FORBIDDEN) {
            Err(invalid("sheet names cannot contain any of []:*?/\\"))?
        } else if !names.insert(name.to_lowercase()) {
            Err(invalid("another sheet has the same name ignoring case"))?
        }
    }
    Ok(())
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECLARATION}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#
    );
    for index in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{index}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_relationships() -> String {
    format!(
        r#"{XML_DECLARATION}<Relationships xmlns="{NS_PACKAGE_RELATIONSHIPS}"><Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook(tables: &TableSet) -> String {
    let mut xml = format!(r#"{XML_DECLARATION}<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_RELATIONSHIPS}"><sheets>"#);
    for (index, name) in tables.names().enumerate() {
        let id = index + 1;
        let _ = write!(xml, r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(name));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

/// Worksheets take `rId1..=rIdN`, the stylesheet comes last.
fn workbook_relationships(sheet_count: usize) -> String {
    let mut xml = format!(r#"{XML_DECLARATION}<Relationships xmlns="{NS_PACKAGE_RELATIONSHIPS}">"#);
    for id in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{id}" Type="{REL_WORKSHEET}" Target="worksheets/sheet{id}.xml"/>"#
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{REL_STYLES}" Target="styles.xml"/></Relationships>"#,
        sheet_count + 1
    );
    xml
}

/// Header row of inline strings followed by one row per record. Missing
/// cells are left out; the dimension keeps trailing blank rows in range.
fn worksheet(table: &Table) -> String {
    let last = match table.column_count() {
        0 => index_to_reference(0, 0),
        columns => index_to_reference(table.row_count(), columns - 1),
    };
    let mut xml = format!(r#"{XML_DECLARATION}<worksheet xmlns="{NS_MAIN}"><dimension ref="A1:{last}"/><sheetData>"#);
    let _ = write!(xml, r#"<row r="1">"#);
    for (col, name) in table.column_names().enumerate() {
        push_inline_string(&mut xml, &index_to_reference(0, col), name);
    }
    xml.push_str("</row>");
    for (index, record) in table.rows().iter().enumerate() {
        let row = index + 1;
        let _ = write!(xml, r#"<row r="{}">"#, row + 1);
        for (col, cell) in record.iter().enumerate() {
            let reference = index_to_reference(row, col);
            match cell {
                Cell::Text(value) => push_inline_string(&mut xml, &reference, value),
                Cell::Number(value) => {
                    let _ = write!(xml, r#"<c r="{reference}"><v>{}</v></c>"#, cell_number(*value));
                }
                Cell::Boolean(value) => {
                    let _ = write!(xml, r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value));
                }
                Cell::Missing => (),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_inline_string(xml: &mut String, reference: &str, value: &str) {
    let _ = write!(
        xml,
        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        escape(value)
    );
}

/// Numbers use the same text as the cell's `Display` form.
fn cell_number(value: f64) -> String {
    Cell::Number(value).to_string()
}
