use crate::spreadsheet::builder::unique_headers;
use crate::spreadsheet::criteria::LoadOptions;
use crate::spreadsheet::LoadError;
use crate::table::Cell;
use crate::table::Table;
use crate::table::TableSet;
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use std::borrow::Cow;
use tracing::debug;

/// Reads a delimited text file as a single table named `Sheet1`.
pub(super) fn load(bytes: &[u8], file_name: &str, delimiter: u8, options: &LoadOptions) -> Result<TableSet, LoadError> {
    let text = decode(bytes, options.encoding.as_deref())?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(LoadError::EmptySource(file_name.to_owned())),
    };
    let names = unique_headers(
        header
            .iter()
            .map(|name| Some(name.to_owned()).filter(|name| !name.is_empty()))
            .collect(),
    );

    let mut rows = Vec::<Vec<Cell>>::new();
    for result in records {
        let record = result?;
        if record.len() > names.len() {
            Err(LoadError::RecordWidth {
                line: record.position().map(|position| position.line()).unwrap_or_default(),
                expected: names.len(),
                found: record.len(),
            })?
        }
        let mut row = record
            .iter()
            .map(|field| parse_field(field, options))
            .collect::<Vec<_>>();
        if options.skip_empty_rows && row.iter().all(Cell::is_missing) {
            continue;
        }
        row.resize(names.len(), Cell::Missing);
        rows.push(row);
    }

    debug!("Read '{}': {} rows x {} columns", file_name, rows.len(), names.len());
    Ok(TableSet::single(Table::detect(names, rows)?))
}

/// Decodes raw bytes with an explicit label, else a BOM, else strict UTF-8.
fn decode<'a>(bytes: &'a [u8], label: Option<&str>) -> Result<Cow<'a, str>, LoadError> {
    let encoding = match label {
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| LoadError::UnknownEncoding(label.to_owned()))?,
        None => UTF_8,
    };
    // `decode` sniffs a BOM, which wins over the chosen encoding.
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(LoadError::Encoding(actual.name().to_owned()))?
    }
    if actual != encoding {
        debug!("Decoded as {} from its byte order mark", actual.name());
    }
    Ok(text)
}

/// Types a raw field: null literal, boolean, finite decimal number, else verbatim text.
pub(super) fn parse_field(field: &str, options: &LoadOptions) -> Cell {
    if options.is_null(field) {
        Cell::Missing
    } else if field.eq_ignore_ascii_case("true") {
        Cell::Boolean(true)
    } else if field.eq_ignore_ascii_case("false") {
        Cell::Boolean(false)
    } else if let Some(number) = parse_number(field) {
        Cell::Number(number)
    } else {
        Cell::text(field)
    }
}

fn parse_number(field: &str) -> Option<f64> {
    let first = field.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '+' | '-' | '.')) || !field.bytes().any(|byte| byte.is_ascii_digit()) {
        return None;
    }
    field.parse::<f64>().ok().filter(|number| number.is_finite())
}
