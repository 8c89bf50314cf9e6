use crate::export::ExportError;
use crate::export::ExportNotice;
use crate::table::TableSet;
use csv::WriterBuilder;
use tracing::debug;

/// A serialized single-table export.
#[derive(Clone, Debug)]
pub struct CsvExport {
    /// Name of the exported sheet
    pub sheet: String,
    pub bytes: Vec<u8>,
    /// Set when other sheets were left out
    pub notice: Option<ExportNotice>,
}

/// Serializes the first sheet as delimited text: a header row, then every
/// row in the `Display` form of its cells.
pub fn export_csv(tables: &TableSet, delimiter: u8) -> Result<CsvExport, ExportError> {
    let (sheet, table) = tables.first().ok_or(ExportError::NoSheets)?;
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    let bytes = writer.into_inner().map_err(|error| error.into_error())?;

    let skipped = tables.names().skip(1).map(str::to_owned).collect::<Vec<_>>();
    let notice = (!skipped.is_empty()).then(|| ExportNotice::FirstSheetOnly {
        exported: sheet.to_owned(),
        skipped,
    });
    debug!("Serialized sheet '{}' as {} bytes of CSV", sheet, bytes.len());
    Ok(CsvExport {
        sheet: sheet.to_owned(),
        bytes,
        notice,
    })
}
