use crate::spreadsheet::LoadError;
use crate::table::Cell;
use crate::table::Table;
use std::collections::HashMap;
use std::collections::HashSet;

/// Collects positioned cells of one worksheet and shapes them into a [`Table`].
///
/// Only present cells are pushed. The first row holding a cell becomes the
/// header and the columns span the used range of the sheet.
pub(super) struct SheetBuilder {
    /// Sheet name
    pub(super) name: String,
    /// Present cells as `(row, col, value)`
    cells: Vec<(usize, usize, Cell)>,
    /// Whether to drop rows without any present cell
    skip_empty_rows: bool,
    /// Actual data range (determined from cell data)
    row_lower_bound: Option<usize>,
    row_upper_bound: Option<usize>,
    col_lower_bound: Option<usize>,
    col_upper_bound: Option<usize>,
    /// Last cell of the declared `<dimension>`, as `(row, col)`
    dimension: Option<(usize, usize)>,
}

impl SheetBuilder {
    pub(super) fn new(name: &str, skip_empty_rows: bool) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            skip_empty_rows,
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
            dimension: None,
        }
    }

    /// Records the last cell of the sheet's declared range. Rows and columns up
    /// to it are kept even when none of their cells is present.
    pub(super) fn set_dimension(&mut self, row: usize, col: usize) {
        self.dimension = Some((row, col));
    }

    pub(super) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(super) fn push(&mut self, row: usize, col: usize, cell: Cell) {
        self.update_bound(row, col);
        self.cells.push((row, col, cell));
    }

    /// Updates the actual data range boundaries based on cell positions.
    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Builds the table: header from the first used row, then one record per
    /// following row up to the last used or declared one.
    pub(super) fn finish(self) -> Result<Table, LoadError> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) =
            (self.row_lower_bound, self.row_upper_bound, self.col_lower_bound, self.col_upper_bound)
        else {
            return Ok(Table::detect(Vec::<String>::new(), Vec::new())?);
        };
        let (row_upper, col_upper) = match self.dimension {
            Some((row, col)) => (row_upper.max(row), col_upper.max(col)),
            None => (row_upper, col_upper),
        };

        let skip_empty_rows = self.skip_empty_rows;
        let width = col_upper - col_lower + 1;
        let mut cells = self.cells;
        cells.sort_by_key(|(row, col, _)| (*row, *col));

        let mut headers = vec![None::<String>; width];
        let mut records = Vec::<Vec<Cell>>::new();
        let mut last_row = row_lower;
        for (row, col, cell) in cells {
            let col = col - col_lower;
            if row == row_lower {
                headers[col] = Some(cell.to_string());
                continue;
            }
            if row != last_row {
                if !skip_empty_rows {
                    for _ in (last_row + 1)..row {
                        records.push(vec![Cell::Missing; width]);
                    }
                }
                records.push(vec![Cell::Missing; width]);
                last_row = row;
            }
            if let Some(record) = records.last_mut() {
                record[col] = cell;
            }
        }
        if !skip_empty_rows {
            for _ in (last_row + 1)..=row_upper {
                records.push(vec![Cell::Missing; width]);
            }
        }

        Ok(Table::detect(unique_headers(headers), records)?)
    }
}

/// Names header cells: absent ones become `Unnamed: {index}` and repeats of
/// `X` become `X.1`, `X.2`, ... so every name is unique.
pub(super) fn unique_headers(headers: Vec<Option<String>>) -> Vec<String> {
    let mut names = HashSet::<String>::with_capacity(headers.len());
    let mut repeats = HashMap::<String, usize>::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(index, header)| {
            let base = header.unwrap_or_else(|| format!("Unnamed: {index}"));
            let mut name = base.to_owned();
            while names.contains(&name) {
                let repeat = repeats.entry(base.to_owned()).or_insert(0);
                *repeat += 1;
                name = format!("{base}.{repeat}");
            }
            names.insert(name.to_owned());
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;
    use pretty_assertions::assert_eq;

    fn header(names: &[&str]) -> Vec<Option<String>> {
        names
            .iter()
            .map(|name| Some(name.to_string()).filter(|name| !name.is_empty()))
            .collect()
    }

    #[test]
    fn headers_blank_and_repeated() {
        assert_eq!(
            unique_headers(header(&["id", "", "id", "id", "name"])),
            vec!["id", "Unnamed: 1", "id.1", "id.2", "name"]
        );
        assert_eq!(unique_headers(header(&["x", "x.1", "x"])), vec!["x", "x.1", "x.2"]);
    }

    #[test]
    fn builder_used_range() {
        let mut sheet = SheetBuilder::new("Data", false);
        assert!(sheet.is_empty());
        sheet.push(1, 1, Cell::from("name"));
        sheet.push(1, 3, Cell::from("age"));
        sheet.push(2, 1, Cell::from("Alice"));
        sheet.push(2, 3, Cell::from(30i64));
        sheet.push(4, 2, Cell::from(true));
        assert!(!sheet.is_empty());

        let table = sheet.finish().unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["name", "Unnamed: 1", "age"]);
        assert_eq!(
            table.rows(),
            &[
                vec![Cell::from("Alice"), Cell::Missing, Cell::from(30i64)],
                vec![Cell::Missing, Cell::Missing, Cell::Missing],
                vec![Cell::Missing, Cell::from(true), Cell::Missing],
            ]
        );
        assert_eq!(table.columns()[2].kind, ColumnType::Number);
    }

    #[test]
    fn builder_skip_empty_rows() {
        let mut sheet = SheetBuilder::new("Data", true);
        sheet.push(0, 0, Cell::from("a"));
        sheet.push(3, 0, Cell::from(2i64));
        sheet.push(1, 0, Cell::from(1i64));
        let table = sheet.finish().unwrap();
        assert_eq!(table.rows(), &[vec![Cell::from(1i64)], vec![Cell::from(2i64)]]);
    }

    #[test]
    fn builder_keeps_declared_dimension() {
        let mut sheet = SheetBuilder::new("Data", false);
        sheet.push(0, 0, Cell::from("x"));
        sheet.push(0, 1, Cell::from(""));
        sheet.push(1, 0, Cell::from(1i64));
        sheet.set_dimension(3, 2);

        let table = sheet.finish().unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["x", "", "Unnamed: 2"]);
        assert_eq!(
            table.rows(),
            &[
                vec![Cell::from(1i64), Cell::Missing, Cell::Missing],
                vec![Cell::Missing, Cell::Missing, Cell::Missing],
                vec![Cell::Missing, Cell::Missing, Cell::Missing],
            ]
        );
    }

    #[test]
    fn builder_dimension_without_cells() {
        let mut sheet = SheetBuilder::new("Empty", false);
        sheet.set_dimension(9, 9);
        let table = sheet.finish().unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn builder_without_cells() {
        let table = SheetBuilder::new("Empty", false).finish().unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);
    }
}
