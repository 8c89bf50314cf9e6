//! # Table Cleaning
//!
//! The cleaning transform applied to every loaded sheet. [`clean`] runs the
//! four fixed steps over one [`Table`]:
//!
//! 1. drop rows that repeat an earlier row value for value
//! 2. replace every missing cell with `"N/A"`
//! 3. stringify and trim the cells of text-like columns
//! 4. standardize column names (trimmed, lowercase, spaces to underscores)
//!
//! [`clean_all`] applies the same transform independently to every sheet of
//! a [`TableSet`], keeping a per-sheet outcome so that one failed sheet never
//! hides or disturbs the others.
pub mod names;
pub mod stats;

pub use names::standardize_name;
pub(crate) use names::ColumnNaming;
pub use stats::CleaningStats;
pub use stats::SetTotals;

use crate::cleaning::names::standardize_names;
use crate::table::Cell;
use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use crate::table::TableSet;
use crate::table::MISSING_LITERAL;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Errors raised while cleaning a single table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleaningError {
    #[error("Columns {columns:?} all standardize to '{name}'")]
    ColumnNameCollision { name: String, columns: Vec<String> },

    #[error("{0}")]
    TableError(#[from] TableError),
}

/// A cleaning error together with the sheet it happened on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Clean sheet '{sheet}' failed: {source}")]
pub struct SheetError {
    pub sheet: String,
    #[source]
    pub source: CleaningError,
}

/// A cleaned table and the statistics of its cleaning.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanedTable {
    pub table: Table,
    pub stats: CleaningStats,
}

/// The cleaning transform. Colliding column names are suffixed; the strict
/// policy that reports them instead is only used inside the crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cleaner {
    pub(crate) naming: ColumnNaming,
}

impl Cleaner {
    /// Runs the four cleaning steps over `table`, leaving it untouched.
    pub fn clean(&self, table: &Table) -> Result<CleanedTable, CleaningError> {
        let rows_before = table.row_count();
        let rows = remove_duplicates(table.rows());
        let rows_after = rows.len();
        debug!(rows_before, rows_after, "removed duplicate rows");

        let rows = fill_missing(rows);
        let rows = trim_text_columns(table.columns(), rows);
        let names = standardize_names(table.column_names(), self.naming)?;

        let stats = CleaningStats::new(rows_before, rows_after, names.len());
        let table = Table::detect(names, rows)?;
        Ok(CleanedTable { table, stats })
    }

    /// Cleans every sheet of `tables` independently, in sheet order.
    pub fn clean_all(&self, tables: &TableSet) -> CleanedSet {
        let count = tables.len();
        let sheets = tables
            .iter()
            .enumerate()
            .map(|(index, (name, table))| {
                info!("Cleaning sheet {} of {}: {}", index + 1, count, name);
                let result = self.clean(table);
                match &result {
                    Ok(cleaned) => debug!(sheet = name, stats = ?cleaned.stats, "sheet cleaned"),
                    Err(error) => warn!(sheet = name, %error, "sheet cleaning failed"),
                }
                SheetOutcome {
                    name: name.to_owned(),
                    result,
                }
            })
            .collect();
        CleanedSet { sheets }
    }
}

/// Cleans one table with the default naming policy, which cannot fail.
pub fn clean(table: &Table) -> CleanedTable {
    Cleaner::default()
        .clean(table)
        .expect("suffix naming resolves every collision and keeps row widths")
}

/// Cleans every sheet of a table set with the default naming policy.
pub fn clean_all(tables: &TableSet) -> CleanedSet {
    Cleaner::default().clean_all(tables)
}

/// Keeps the first occurrence of every distinct row, in original order.
fn remove_duplicates(rows: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
    let mut seen = HashSet::<&[Cell]>::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(row.as_slice()))
        .cloned()
        .collect()
}

/// Replaces every missing cell with the `"N/A"` literal.
fn fill_missing(rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    Cell::Missing => Cell::text(MISSING_LITERAL),
                    cell => cell,
                })
                .collect()
        })
        .collect()
}

/// Converts the cells of text-like columns to trimmed strings.
fn trim_text_columns(columns: &[Column], rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let text_like: Vec<bool> = columns.iter().map(Column::is_text_like).collect();
    if !text_like.contains(&true) {
        return rows;
    }
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&text_like)
                .map(|(cell, text_like)| match cell {
                    Cell::Text(value) if *text_like => Cell::text(value.trim()),
                    cell if *text_like => Cell::text(cell.to_string().trim()),
                    cell => cell,
                })
                .collect()
        })
        .collect()
}

/// Cleaning outcome of one sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetOutcome {
    pub name: String,
    pub result: Result<CleanedTable, CleaningError>,
}

/// Per-sheet cleaning outcomes, in the order of the source table set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanedSet {
    sheets: Vec<SheetOutcome>,
}

impl CleanedSet {
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SheetOutcome> + '_ {
        self.sheets.iter()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Result<CleanedTable, CleaningError>> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .map(|sheet| &sheet.result)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Failed sheets, in sheet order.
    pub fn failures(&self) -> impl Iterator<Item = SheetError> + '_ {
        self.sheets.iter().filter_map(|sheet| {
            sheet.result.as_ref().err().map(|error| SheetError {
                sheet: sheet.name.to_owned(),
                source: error.clone(),
            })
        })
    }

    /// Row and column totals over the successfully cleaned sheets.
    pub fn totals(&self) -> SetTotals {
        self.sheets
            .iter()
            .filter_map(|sheet| sheet.result.as_ref().ok())
            .fold(SetTotals::default(), |totals, cleaned| SetTotals {
                sheets: totals.sheets + 1,
                rows: totals.rows + cleaned.table.row_count(),
                columns: totals.columns + cleaned.table.column_count(),
            })
    }

    /// Collects the cleaned tables for export, failing on the first failed sheet.
    pub fn tables(&self) -> Result<TableSet, SheetError> {
        self.clone().into_tables()
    }

    pub fn into_tables(self) -> Result<TableSet, SheetError> {
        let sheets = self
            .sheets
            .into_iter()
            .map(|sheet| match sheet.result {
                Ok(cleaned) => Ok((sheet.name, cleaned.table)),
                Err(source) => Err(SheetError {
                    sheet: sheet.name,
                    source,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TableSet::from_unique(sheets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;
    use pretty_assertions::assert_eq;

    fn row(cells: Vec<Cell>) -> Vec<Cell> {
        cells
    }

    fn people() -> Table {
        Table::detect(
            vec!["Name ", "Age"],
            vec![
                row(vec![Cell::from("Alice"), Cell::from(30i64)]),
                row(vec![Cell::from("alice"), Cell::from(30i64)]),
                row(vec![Cell::from(" Bob "), Cell::from(25i64)]),
                row(vec![Cell::from(" Bob "), Cell::from(25i64)]),
            ],
        )
        .unwrap()
    }

    fn assert_invariants(original: &Table, cleaned: &CleanedTable) {
        let stats = cleaned.stats;
        assert!(stats.rows_after <= stats.rows_before);
        assert_eq!(stats.duplicates_removed, stats.rows_before - stats.rows_after);
        assert_eq!(stats.rows_before, original.row_count());
        assert_eq!(cleaned.table.row_count(), stats.rows_after);
        assert_eq!(cleaned.table.column_count(), original.column_count());
        assert!(cleaned.table.rows().iter().flatten().all(|cell| !cell.is_missing()));
        for name in cleaned.table.column_names() {
            assert_eq!(name, name.to_lowercase());
            assert!(!name.contains(' '));
        }
    }

    #[test]
    fn clean_people_scenario() {
        let original = people();
        let cleaned = clean(&original);

        assert_eq!(
            cleaned.stats,
            CleaningStats {
                rows_before: 4,
                rows_after: 3,
                duplicates_removed: 1,
                columns: 2,
            }
        );
        assert_eq!(cleaned.table.column_names().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(
            cleaned.table.rows(),
            &[
                row(vec![Cell::from("Alice"), Cell::from(30i64)]),
                row(vec![Cell::from("alice"), Cell::from(30i64)]),
                row(vec![Cell::from("Bob"), Cell::from(25i64)]),
            ]
        );
        assert_invariants(&original, &cleaned);
        // The input is left untouched.
        assert_eq!(original, people());
    }

    #[test]
    fn clean_empty_table() {
        let original = Table::detect(vec!["A", "B"], vec![]).unwrap();
        let cleaned = clean(&original);

        assert_eq!(cleaned.table.row_count(), 0);
        assert_eq!(cleaned.stats.duplicates_removed, 0);
        assert_eq!(cleaned.table.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_invariants(&original, &cleaned);
    }

    #[test]
    fn duplicates_compare_original_values() {
        // " x" and "x" differ before trimming, so both rows survive.
        let original = Table::detect(
            vec!["v"],
            vec![
                row(vec![Cell::from(" x")]),
                row(vec![Cell::from("x")]),
                row(vec![Cell::Missing]),
                row(vec![Cell::from("N/A")]),
                row(vec![Cell::Missing]),
            ],
        )
        .unwrap();
        let cleaned = clean(&original);

        assert_eq!(cleaned.stats.rows_after, 4);
        assert_eq!(
            cleaned.table.column_values("v").unwrap(),
            vec![&Cell::from("x"), &Cell::from("x"), &Cell::from("N/A"), &Cell::from("N/A")]
        );
    }

    #[test]
    fn missing_values_filled_in_every_column() {
        let original = Table::detect(
            vec!["Score", "Passed", "Note"],
            vec![
                row(vec![Cell::from(1.5), Cell::Missing, Cell::from("  ok ")]),
                row(vec![Cell::Missing, Cell::from(true), Cell::Missing]),
            ],
        )
        .unwrap();
        let cleaned = clean(&original);

        assert_eq!(
            cleaned.table.rows(),
            &[
                row(vec![Cell::from(1.5), Cell::from("N/A"), Cell::from("ok")]),
                row(vec![Cell::from("N/A"), Cell::from(true), Cell::from("N/A")]),
            ]
        );
        // The N/A marker does not change a column's value type.
        let kinds: Vec<ColumnType> = cleaned.table.columns().iter().map(|column| column.kind).collect();
        assert_eq!(kinds, vec![ColumnType::Number, ColumnType::Boolean, ColumnType::Text]);
        assert_invariants(&original, &cleaned);
    }

    #[test]
    fn text_like_columns_are_stringified() {
        let original = Table::detect(
            vec!["Mixed"],
            vec![
                row(vec![Cell::from(" a ")]),
                row(vec![Cell::from(7i64)]),
                row(vec![Cell::from(false)]),
            ],
        )
        .unwrap();
        let cleaned = clean(&original);

        assert_eq!(
            cleaned.table.column_values("mixed").unwrap(),
            vec![&Cell::from("a"), &Cell::from("7"), &Cell::from("false")]
        );
    }

    #[test]
    fn declared_text_column_is_trimmed() {
        let original = Table::new(
            vec![Column::new("Code", ColumnType::Text)],
            vec![row(vec![Cell::from(42i64)])],
        )
        .unwrap();
        let cleaned = clean(&original);
        assert_eq!(cleaned.table.rows(), &[row(vec![Cell::from("42")])]);
    }

    #[test]
    fn clean_is_idempotent() {
        let tables = vec![
            people(),
            Table::detect(vec!["A", "B"], vec![]).unwrap(),
            Table::detect(
                vec!["First Name", "first name", "Score"],
                vec![
                    row(vec![Cell::from("Ann"), Cell::Missing, Cell::from(1i64)]),
                    row(vec![Cell::Missing, Cell::from(" Lee"), Cell::Missing]),
                    row(vec![Cell::from("Ann"), Cell::Missing, Cell::from(1i64)]),
                ],
            )
            .unwrap(),
        ];
        for table in tables {
            let once = clean(&table);
            let twice = clean(&once.table);
            assert_eq!(twice.table, once.table);
            assert_eq!(twice.stats.duplicates_removed, 0);
        }
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let original = Table::detect(
            vec!["First Name", "first name", "Score"],
            vec![row(vec![Cell::from("Ann"), Cell::from("Lee"), Cell::from(1i64)])],
        )
        .unwrap();
        let cleaned = clean(&original);
        assert_eq!(
            cleaned.table.column_names().collect::<Vec<_>>(),
            vec!["first_name", "first_name_2", "score"]
        );
    }

    #[test]
    fn clean_all_preserves_sheet_order() {
        let mut tables = TableSet::new();
        tables.insert("Revenue", people()).unwrap();
        tables.insert("Costs", Table::detect(vec!["A", "B"], vec![]).unwrap()).unwrap();

        let cleaned = clean_all(&tables);
        assert_eq!(cleaned.names().collect::<Vec<_>>(), vec!["Revenue", "Costs"]);
        assert_eq!(
            cleaned.totals(),
            SetTotals {
                sheets: 2,
                rows: 3,
                columns: 4,
            }
        );

        let exported = cleaned.tables().unwrap();
        assert_eq!(exported.names().collect::<Vec<_>>(), vec!["Revenue", "Costs"]);
        assert_eq!(exported.get("Revenue"), Some(&clean(&people()).table));
    }

    #[test]
    fn clean_all_single_sheet() {
        let tables = TableSet::single(people());
        let cleaned = clean_all(&tables);

        assert_eq!(cleaned.len(), 1);
        let result = cleaned.get("Sheet1").unwrap().as_ref().unwrap();
        assert_eq!(result, &clean(&people()));
    }

    #[test]
    fn strict_failure_is_isolated_per_sheet() {
        let colliding = Table::detect(vec!["ID", "id"], vec![]).unwrap();
        let mut tables = TableSet::new();
        tables.insert("Good", people()).unwrap();
        tables.insert("Bad", colliding).unwrap();
        tables.insert("AlsoGood", people()).unwrap();

        let cleaned = Cleaner { naming: ColumnNaming::Strict }.clean_all(&tables);
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned.get("Good"), Some(&Ok(clean(&people()))));
        assert_eq!(cleaned.get("AlsoGood"), Some(&Ok(clean(&people()))));

        let failures: Vec<SheetError> = cleaned.failures().collect();
        assert_eq!(
            failures,
            vec![SheetError {
                sheet: "Bad".to_owned(),
                source: CleaningError::ColumnNameCollision {
                    name: "id".to_owned(),
                    columns: vec!["ID".to_owned(), "id".to_owned()],
                },
            }]
        );
        assert_eq!(cleaned.totals().sheets, 2);
        assert_eq!(cleaned.tables().unwrap_err().sheet, "Bad");
    }

    #[test]
    fn cleaned_tables_satisfy_table_invariants() {
        let original = Table::detect(vec!["a", "A", "a_2", "A 2"], vec![]).unwrap();
        let cleaned = clean(&original);
        assert_eq!(
            cleaned.table.column_names().collect::<Vec<_>>(),
            vec!["a", "a_3", "a_2", "a_2_2"]
        );
    }
}
