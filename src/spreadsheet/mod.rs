//! # Spreadsheet Loading
//!
//! Reads delimited text (`.csv`, `.tsv`, `.txt`) and Excel 2007+ workbooks
//! (`.xlsx`, `.xlsm`) into a [`TableSet`]. Cell values are typed while
//! reading and every column gets a [`crate::ColumnType`] once the sheet is
//! complete.
mod builder;
mod criteria;
mod csv;
mod excel;
mod xlsx;

pub use criteria::LoadOptions;
pub use crate::helpers::xml::XmlError;

use crate::table::TableError;
use crate::table::TableSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Signature of a ZIP archive, the container of Office Open XML workbooks
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Errors raised while reading a source file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file format for '{name}': {reason}")]
    UnsupportedFormat { name: String, reason: String },

    #[error("Unknown encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("Input is not valid {0} text")]
    Encoding(String),

    #[error("'{0}' has no header row")]
    EmptySource(String),

    #[error("Record at line {line} has {found} fields but the header has {expected}")]
    RecordWidth { line: u64, expected: usize, found: usize },

    #[error("Workbook part '{0}' is missing")]
    MissingPart(String),

    #[error("Invalid cell value at {sheet}!{reference}: {message}")]
    CellValue { sheet: String, reference: String, message: String },

    #[error("{0}")]
    XmlHelperError(#[from] XmlError),

    #[error("{0}")]
    CsvError(#[from] ::csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    TableError(#[from] TableError),

    #[error("{0}")]
    IoError(#[from] std::io::Error),
}

/// Source file formats the loader can read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with the given field delimiter
    Csv { delimiter: u8 },
    /// Office Open XML workbook
    Xlsx,
}

impl SourceFormat {
    /// Detects the format from the file extension, falling back to the
    /// leading bytes for unknown extensions.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Result<SourceFormat, LoadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase())
            .unwrap_or_default();
        let unsupported = |reason: &str| LoadError::UnsupportedFormat {
            name: file_name.to_owned(),
            reason: reason.to_owned(),
        };
        match extension.as_str() {
            "csv" | "txt" => Ok(SourceFormat::Csv { delimiter: b',' }),
            "tsv" => Ok(SourceFormat::Csv { delimiter: b'\t' }),
            "xlsx" | "xlsm" if bytes.starts_with(&excel::CFB_SIGNATURE) => {
                Err(unsupported("password protected or legacy compound file"))
            }
            "xlsx" | "xlsm" => Ok(SourceFormat::Xlsx),
            "xls" | "xlsb" | "ods" => Err(unsupported("only Excel 2007+ workbooks (.xlsx, .xlsm) are read")),
            _ if bytes.starts_with(&excel::CFB_SIGNATURE) => Err(unsupported("legacy compound file")),
            _ if bytes.starts_with(ZIP_SIGNATURE) => Ok(SourceFormat::Xlsx),
            _ => Ok(SourceFormat::Csv { delimiter: b',' }),
        }
    }

    /// Returns the output extension matching this format.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv { .. } => "csv",
            SourceFormat::Xlsx => "xlsx",
        }
    }
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Loads the sheets of an in-memory source file.
///
/// `file_name` is only used for format detection and error messages.
pub fn load(bytes: &[u8], file_name: &str, options: &LoadOptions) -> Result<TableSet, LoadError> {
    let format = SourceFormat::detect(file_name, bytes)?;
    load_as(bytes, file_name, format, options)
}

/// Loads the sheets of an in-memory source file in an already detected format.
pub fn load_as(bytes: &[u8], file_name: &str, format: SourceFormat, options: &LoadOptions) -> Result<TableSet, LoadError> {
    info!("Loading '{}' as {}", file_name, format);
    let tables = match format {
        SourceFormat::Csv { delimiter } => {
            csv::load(bytes, file_name, options.delimiter.unwrap_or(delimiter), options)?
        }
        SourceFormat::Xlsx => xlsx::load(bytes, options)?,
    };
    info!(
        "Loaded {} sheets from '{}' ({} rows, {} columns)",
        tables.len(),
        file_name,
        tables.total_rows(),
        tables.total_columns()
    );
    Ok(tables)
}

/// Reads a file from disk and loads its sheets.
pub fn load_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<TableSet, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    load(&bytes, &path.to_string_lossy(), options)
}
