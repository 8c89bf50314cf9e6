use thiserror::Error;

/// Main error type of the crate.
/// Aggregates the errors of loading, cleaning and exporting for callers that
/// want a single error type.
#[derive(Error, Debug)]
pub enum TidySheetError {
    #[error("{0}")]
    WithContext(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Module errors
    #[error("{0}")]
    LoadError(#[from] crate::spreadsheet::LoadError),

    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    CleaningError(#[from] crate::cleaning::CleaningError),

    #[error("{0}")]
    SheetError(#[from] crate::cleaning::SheetError),

    #[error("{0}")]
    ExportError(#[from] crate::export::ExportError),
}

pub trait ResultMessage {
    /// Prefixes the error message, typically with the file being processed.
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TidySheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| TidySheetError::WithContext(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportError;

    #[test]
    fn prefix_error_message() {
        let result: Result<(), TidySheetError> = Err(ExportError::NoSheets.into());
        let error = result.with_prefix("cleaned_data.xlsx").unwrap_err();
        assert_eq!(error.to_string(), "cleaned_data.xlsx: There are no sheets to export");
        assert!(matches!(error, TidySheetError::WithContext(_)));

        let ok: Result<usize, TidySheetError> = Ok(3);
        assert_eq!(ok.with_prefix("unused").unwrap(), 3);
    }
}
