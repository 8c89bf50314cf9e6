//! # Export
//!
//! Writes a [`TableSet`] as CSV (one table) or as an XLSX workbook (one
//! worksheet per table, in order).
mod csv;
mod xlsx;

pub use self::csv::export_csv;
pub use self::csv::CsvExport;
pub use self::xlsx::export_xlsx;

use crate::table::TableSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use tracing::warn;

/// Default file name for cleaned single-table output.
pub const DEFAULT_CSV_FILE_NAME: &str = "cleaned_data.csv";

/// Default file name for cleaned multi-table output.
pub const DEFAULT_XLSX_FILE_NAME: &str = "cleaned_data.xlsx";

/// Errors raised while serializing cleaned tables.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("There are no sheets to export")]
    NoSheets,

    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    #[error("{0}")]
    CsvError(#[from] ::csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    IoError(#[from] std::io::Error),
}

/// Output formats of the exporter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Guesses the format from an output path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<ExportFormat> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Some(ExportFormat::Csv),
            "xlsx" | "xlsm" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// Default output file name for this format.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => DEFAULT_CSV_FILE_NAME,
            ExportFormat::Xlsx => DEFAULT_XLSX_FILE_NAME,
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Information for the user about what an export left out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportNotice {
    /// A single-table format received several sheets.
    FirstSheetOnly { exported: String, skipped: Vec<String> },
}

impl Display for ExportNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportNotice::FirstSheetOnly { exported, skipped } => write!(
                f,
                "CSV holds a single table: only sheet '{}' was exported, {} other sheet(s) skipped ({})",
                exported,
                skipped.len(),
                skipped.join(", ")
            ),
        }
    }
}

/// Serialized output with any notice for the user.
#[derive(Clone, Debug)]
pub struct Exported {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub notice: Option<ExportNotice>,
}

/// Serializes the tables in the requested format.
pub fn export(tables: &TableSet, format: ExportFormat) -> Result<Exported, ExportError> {
    let exported = match format {
        ExportFormat::Csv => {
            let CsvExport { bytes, notice, .. } = export_csv(tables, b',')?;
            Exported { format, bytes, notice }
        }
        ExportFormat::Xlsx => Exported {
            format,
            bytes: export_xlsx(tables)?,
            notice: None,
        },
    };
    Ok(exported)
}

/// Serializes the tables and writes them to `path`.
pub fn export_file(tables: &TableSet, path: impl AsRef<Path>, format: ExportFormat) -> Result<Exported, ExportError> {
    let path = path.as_ref();
    let exported = export(tables, format)?;
    if let Some(notice) = &exported.notice {
        warn!("{}", notice);
    }
    std::fs::write(path, &exported.bytes)?;
    info!("Wrote {} bytes of {} to '{}'", exported.bytes.len(), format, path.display());
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::load_file;
    use crate::spreadsheet::LoadOptions;
    use crate::table::Cell;
    use crate::table::Table;
    use pretty_assertions::assert_eq;

    fn tables() -> TableSet {
        let revenue = Table::detect(vec!["q1"], vec![vec![Cell::from(10i64)]]).unwrap();
        let costs = Table::detect(vec!["q1"], vec![vec![Cell::from(4i64)]]).unwrap();
        TableSet::try_from(vec![("Revenue".to_owned(), revenue), ("Costs".to_owned(), costs)]).unwrap()
    }

    #[test]
    fn format_from_path() {
        assert_eq!(ExportFormat::from_path("out/cleaned.CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path("cleaned.xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path("cleaned"), None);
        assert_eq!(ExportFormat::Csv.default_file_name(), "cleaned_data.csv");
        assert_eq!(ExportFormat::Xlsx.default_file_name(), "cleaned_data.xlsx");
    }

    #[test]
    fn notice_text() {
        let notice = ExportNotice::FirstSheetOnly {
            exported: "Revenue".to_owned(),
            skipped: vec!["Costs".to_owned()],
        };
        assert_eq!(
            notice.to_string(),
            "CSV holds a single table: only sheet 'Revenue' was exported, 1 other sheet(s) skipped (Costs)"
        );
    }

    #[test]
    fn export_files_round_trip() {
        let directory = tempfile::tempdir().unwrap();

        let path = directory.path().join(DEFAULT_XLSX_FILE_NAME);
        let exported = export_file(&tables(), &path, ExportFormat::Xlsx).unwrap();
        assert_eq!(exported.notice, None);
        assert_eq!(load_file(&path, &LoadOptions::default()).unwrap(), tables());

        let path = directory.path().join(DEFAULT_CSV_FILE_NAME);
        let exported = export_file(&tables(), &path, ExportFormat::Csv).unwrap();
        assert!(matches!(exported.notice, Some(ExportNotice::FirstSheetOnly { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "q1\n10\n");
    }
}
