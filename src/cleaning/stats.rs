use serde::Serialize;

/// Statistics of a single table cleaning.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    /// Row count before duplicate removal
    pub rows_before: usize,
    /// Row count after duplicate removal
    pub rows_after: usize,
    /// `rows_before - rows_after`
    pub duplicates_removed: usize,
    /// Column count of the cleaned table
    pub columns: usize,
}

impl CleaningStats {
    pub(crate) fn new(rows_before: usize, rows_after: usize, columns: usize) -> Self {
        CleaningStats {
            rows_before,
            rows_after,
            duplicates_removed: rows_before - rows_after,
            columns,
        }
    }
}

/// Row and column totals across the cleaned sheets of a set, for reporting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SetTotals {
    pub sheets: usize,
    pub rows: usize,
    pub columns: usize,
}
