use crate::table::cell::Cell;
use crate::table::cell::MISSING_LITERAL;
use serde::Serialize;

/// Value type tag of a column, computed once when a table is loaded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Text-like: mixed, textual, or entirely missing
    Text,
    /// Every present value is a number
    Number,
    /// Every present value is a boolean
    Boolean,
}

/// Represents a column in a table with name and value type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Column name (from the header row)
    pub name: String,
    /// Column value type
    pub kind: ColumnType,
}

impl Column {
    /// Creates a column with an explicitly declared type.
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }

    /// Returns true if this column's cells are treated as strings.
    pub fn is_text_like(&self) -> bool {
        self.kind == ColumnType::Text
    }
}

impl ColumnType {
    /// Returns the string representation of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
        }
    }

    /// Candidate type contributed by a single cell. Missing cells and the
    /// `N/A` marker contribute nothing.
    pub(crate) fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Text(value) if value == MISSING_LITERAL => None,
            Cell::Text(_) => Some(ColumnType::Text),
            Cell::Number(_) => Some(ColumnType::Number),
            Cell::Boolean(_) => Some(ColumnType::Boolean),
            Cell::Missing => None,
        }
    }

    /// Detects the common type of a column from its cells.
    /// Falls back to TEXT if types are inconsistent or no value is present.
    pub fn detect<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> ColumnType {
        let mut detected = None::<ColumnType>;
        for kind in cells.into_iter().filter_map(Self::from_cell) {
            match detected {
                None => detected = Some(kind),
                Some(previous) if previous == kind => (),
                Some(_) => return ColumnType::Text,
            }
        }
        detected.unwrap_or(ColumnType::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_uniform_columns() {
        let numbers = [Cell::from(1i64), Cell::Missing, Cell::from(2.5)];
        assert_eq!(ColumnType::detect(&numbers), ColumnType::Number);

        let booleans = [Cell::from(true), Cell::from(false)];
        assert_eq!(ColumnType::detect(&booleans), ColumnType::Boolean);
    }

    #[test]
    fn detect_skips_missing_marker() {
        let filled = [Cell::from(30i64), Cell::from("N/A")];
        assert_eq!(ColumnType::detect(&filled), ColumnType::Number);

        let markers = [Cell::from("N/A"), Cell::from("N/A")];
        assert_eq!(ColumnType::detect(&markers), ColumnType::Text);

        let padded = [Cell::from("N/A "), Cell::from(1i64)];
        assert_eq!(ColumnType::detect(&padded), ColumnType::Text);
    }

    #[test]
    fn detect_falls_back_to_text() {
        let mixed = [Cell::from(1i64), Cell::from(true)];
        assert_eq!(ColumnType::detect(&mixed), ColumnType::Text);

        let text = [Cell::from(1i64), Cell::from("x")];
        assert_eq!(ColumnType::detect(&text), ColumnType::Text);

        let missing = [Cell::Missing, Cell::Missing];
        assert_eq!(ColumnType::detect(&missing), ColumnType::Text);
        let empty: [Cell; 0] = [];
        assert_eq!(ColumnType::detect(&empty), ColumnType::Text);
    }
}
