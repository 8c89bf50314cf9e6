//! Load, clean and export a file in one go, with a serializable summary of
//! what happened to every sheet.
use crate::cleaning::CleanedSet;
use crate::cleaning::Cleaner;
use crate::cleaning::CleaningStats;
use crate::cleaning::SetTotals;
use crate::error::ResultMessage;
use crate::error::TidySheetError;
use crate::export::export_file;
use crate::export::ExportFormat;
use crate::export::Exported;
use crate::spreadsheet::load_as;
use crate::spreadsheet::LoadError;
use crate::spreadsheet::LoadOptions;
use crate::spreadsheet::SourceFormat;
use crate::table::TableSet;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// A loaded source file together with the cleaning outcome of its sheets.
#[derive(Clone, Debug)]
pub struct CleanRun {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub loaded: TableSet,
    pub cleaned: CleanedSet,
}

/// Reads, loads and cleans every sheet of a file.
///
/// Load failures abort the run; cleaning failures are kept per sheet in
/// [`CleanRun::cleaned`].
pub fn clean_file(path: impl AsRef<Path>, options: &LoadOptions, cleaner: &Cleaner) -> Result<CleanRun, TidySheetError> {
    let source = path.as_ref().to_path_buf();
    let file_name = source.to_string_lossy().to_string();
    let (format, loaded) = read_source(&source, &file_name, options).with_prefix(&file_name)?;
    let cleaned = cleaner.clean_all(&loaded);
    info!(
        "Cleaned {} of {} sheets from '{}'",
        cleaned.len() - cleaned.failures().count(),
        cleaned.len(),
        file_name
    );
    Ok(CleanRun {
        source,
        format,
        loaded,
        cleaned,
    })
}

fn read_source(path: &Path, file_name: &str, options: &LoadOptions) -> Result<(SourceFormat, TableSet), TidySheetError> {
    let bytes = std::fs::read(path).map_err(LoadError::from)?;
    let format = SourceFormat::detect(file_name, &bytes)?;
    let tables = load_as(&bytes, file_name, format, options)?;
    Ok((format, tables))
}

/// Picks the output path and format: an explicit format wins, then the
/// output path's extension, then the format of the source.
pub fn output_target(output: Option<&Path>, format: Option<ExportFormat>, source: SourceFormat) -> (PathBuf, ExportFormat) {
    let format = format
        .or_else(|| output.and_then(ExportFormat::from_path))
        .unwrap_or(match source {
            SourceFormat::Csv { .. } => ExportFormat::Csv,
            SourceFormat::Xlsx => ExportFormat::Xlsx,
        });
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    (path, format)
}

/// Exports the cleaned sheets, refusing when any sheet failed to clean.
pub fn export_cleaned(cleaned: &CleanedSet, path: impl AsRef<Path>, format: ExportFormat) -> Result<Exported, TidySheetError> {
    let path = path.as_ref();
    let tables = cleaned.tables()?;
    export_file(&tables, path, format)
        .map_err(TidySheetError::from)
        .with_prefix(&path.to_string_lossy())
}

/// Serializable report of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub format: String,
    /// Sheets, rows and columns as loaded
    pub found: SetTotals,
    /// Sheets, rows and columns after cleaning, over the cleaned sheets
    pub cleaned: SetTotals,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CleaningStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanRun {
    pub fn summary(&self) -> RunSummary {
        let sheets = self
            .cleaned
            .iter()
            .map(|sheet| match &sheet.result {
                Ok(cleaned) => SheetSummary {
                    name: sheet.name.to_owned(),
                    stats: Some(cleaned.stats),
                    error: None,
                },
                Err(error) => SheetSummary {
                    name: sheet.name.to_owned(),
                    stats: None,
                    error: Some(error.to_string()),
                },
            })
            .collect();
        RunSummary {
            source: self.source.to_string_lossy().to_string(),
            format: self.format.to_string(),
            found: SetTotals {
                sheets: self.loaded.len(),
                rows: self.loaded.total_rows(),
                columns: self.loaded.total_columns(),
            },
            cleaned: self.cleaned.totals(),
            sheets,
        }
    }
}
