//! # Tidy Sheet
//!
//! Cleans tabular data loaded from CSV files or Excel workbooks and exports
//! the result as CSV or XLSX.
//!
//! ## Features
//!
//! - **Fixed cleaning pipeline**: every table goes through duplicate row
//!   removal, missing value filling with `N/A`, whitespace trimming of text
//!   columns and column name standardization (lowercase, spaces to
//!   underscores), in that order
//! - **Multi-sheet workbooks**: every worksheet is cleaned independently and
//!   sheet order is preserved; a sheet that fails does not stop its siblings
//! - **Typed cells**: text, numbers and booleans are told apart while loading,
//!   and dates in Excel workbooks are read in ISO form
//! - **Pure Rust implementation**: XLSX is read and written with `zip` and
//!   `quick-xml`, CSV with `csv` and `encoding_rs`
//!
//! ## Example
//!
//! ```no_run
//! use tidy_sheet::{clean_all, export_file, load_file, ExportFormat, LoadOptions};
//!
//! let tables = load_file("report.xlsx", &LoadOptions::default())?;
//! let cleaned = clean_all(&tables);
//! for failure in cleaned.failures() {
//!     eprintln!("{failure}");
//! }
//! export_file(&cleaned.tables()?, "cleaned_data.xlsx", ExportFormat::Xlsx)?;
//! # Ok::<(), tidy_sheet::TidySheetError>(())
//! ```
pub mod cleaning;
pub mod error;
pub mod export;
pub(crate) mod helpers;
pub mod pipeline;
pub mod spreadsheet;
pub mod table;

pub use cleaning::clean;
pub use cleaning::clean_all;
pub use cleaning::CleanedSet;
pub use cleaning::CleanedTable;
pub use cleaning::Cleaner;
pub use cleaning::CleaningError;
pub use cleaning::CleaningStats;
pub use cleaning::SheetError;
pub use error::TidySheetError;
pub use export::export_csv;
pub use export::export_file;
pub use export::export_xlsx;
pub use export::ExportError;
pub use export::ExportFormat;
pub use export::ExportNotice;
pub use spreadsheet::load;
pub use spreadsheet::load_as;
pub use spreadsheet::load_file;
pub use spreadsheet::LoadError;
pub use spreadsheet::LoadOptions;
pub use spreadsheet::SourceFormat;
pub use table::Cell;
pub use table::Column;
pub use table::ColumnType;
pub use table::Table;
pub use table::TableError;
pub use table::TableSet;
