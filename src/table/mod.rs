//! # Table Data Model
//!
//! In-memory representation of the data flowing through the cleaner:
//! [`Cell`] values arranged in a [`Table`] of named, typed [`Column`]s,
//! and a [`TableSet`] holding one table per sheet in source order.
pub mod cell;
pub mod column;

pub use cell::Cell;
pub use cell::MISSING_LITERAL;
pub use column::Column;
pub use column::ColumnType;

use std::collections::HashSet;
use thiserror::Error;

/// Sheet name given to single-table sources such as CSV files.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Violations of the table and table-set invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Row {row} has {found} cells but the table has {expected} columns")]
    RowWidth { row: usize, expected: usize, found: usize },

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Duplicate sheet name '{0}'")]
    DuplicateSheet(String),
}

/// Ordered rows of cells under an ordered set of uniquely named columns.
///
/// Every row holds exactly one cell per column, in column order. The
/// invariants are checked on construction and the table is immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates a table with explicitly declared columns.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let mut names = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.to_owned()));
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Table { columns, rows })
    }

    /// Creates a table, detecting each column's type from its cells.
    pub fn detect<S: Into<String>>(names: Vec<S>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let kind = ColumnType::detect(rows.iter().filter_map(|row| row.get(index)));
                Column::new(name, kind)
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cells of the named column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.columns.iter().position(|column| column.name == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}

/// Ordered mapping of sheet name to table. Names are unique and insertion
/// order is preserved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSet {
    sheets: Vec<(String, Table)>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a single-table source under [`DEFAULT_SHEET_NAME`].
    pub fn single(table: Table) -> Self {
        TableSet {
            sheets: vec![(DEFAULT_SHEET_NAME.to_owned(), table)],
        }
    }

    /// Builds a set from sheets whose names are already known to be unique.
    pub(crate) fn from_unique(sheets: Vec<(String, Table)>) -> Self {
        debug_assert!(sheets.iter().map(|(name, _)| name).collect::<HashSet<_>>().len() == sheets.len());
        TableSet { sheets }
    }

    /// Appends a sheet, rejecting a name that is already present.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) -> Result<(), TableError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(TableError::DuplicateSheet(name));
        }
        self.sheets.push((name, table));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, table)| table)
    }

    pub fn first(&self) -> Option<(&str, &Table)> {
        self.sheets.first().map(|(name, table)| (name.as_str(), table))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Table)> + '_ {
        self.sheets.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sum of row counts across all sheets.
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|(_, table)| table.row_count()).sum()
    }

    /// Sum of column counts across all sheets.
    pub fn total_columns(&self) -> usize {
        self.sheets.iter().map(|(_, table)| table.column_count()).sum()
    }
}

impl IntoIterator for TableSet {
    type Item = (String, Table);
    type IntoIter = std::vec::IntoIter<(String, Table)>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.into_iter()
    }
}

impl TryFrom<Vec<(String, Table)>> for TableSet {
    type Error = TableError;

    fn try_from(sheets: Vec<(String, Table)>) -> Result<Self, Self::Error> {
        let mut set = TableSet::new();
        for (name, table) in sheets {
            set.insert(name, table)?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn people() -> Table {
        Table::detect(
            vec!["Name", "Age"],
            vec![
                vec![Cell::from("Alice"), Cell::from(30i64)],
                vec![Cell::from("Bob"), Cell::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn table_detects_column_types() {
        let table = people();
        assert_eq!(
            table.columns(),
            &[
                Column::new("Name", ColumnType::Text),
                Column::new("Age", ColumnType::Number),
            ]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(
            table.column_values("Age"),
            Some(vec![&Cell::from(30i64), &Cell::Missing])
        );
        assert_eq!(table.column_values("Missing"), None);
    }

    #[test]
    fn table_rejects_ragged_rows() {
        let result = Table::detect(vec!["a", "b"], vec![vec![Cell::from(1i64)]]);
        assert_eq!(
            result.unwrap_err(),
            TableError::RowWidth { row: 0, expected: 2, found: 1 }
        );
    }

    #[test]
    fn table_rejects_duplicate_columns() {
        let result = Table::detect(vec!["a", "a"], vec![]);
        assert_eq!(result.unwrap_err(), TableError::DuplicateColumn("a".to_owned()));
    }

    #[test]
    fn table_set_preserves_order() {
        let mut set = TableSet::new();
        set.insert("Revenue", people()).unwrap();
        set.insert("Costs", people()).unwrap();
        set.insert("Archive", people()).unwrap();

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Revenue", "Costs", "Archive"]);
        assert_eq!(set.first().map(|(name, _)| name), Some("Revenue"));
        assert_eq!(set.total_rows(), 6);
        assert_eq!(set.total_columns(), 6);
    }

    #[test]
    fn table_set_rejects_duplicate_sheets() {
        let mut set = TableSet::single(people());
        let result = set.insert(DEFAULT_SHEET_NAME, people());
        assert_eq!(result.unwrap_err(), TableError::DuplicateSheet("Sheet1".to_owned()));
        assert_eq!(set.len(), 1);
    }
}
