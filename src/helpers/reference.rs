//! Excel-style `A1` cell references.

use regex::Regex;
use std::sync::LazyLock;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("Hardcode regex pattern"));

/// Converts column letters (`A`, `AB`) to a 0-based column index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        let digit = letter.to_ascii_uppercase();
        digit
            .is_ascii_uppercase()
            .then(|| index * 26 + (digit as usize - 'A' as usize + 1))
    })
    .map(|index| index - 1)
}

/// Converts a 0-based column index to column letters.
pub(crate) fn index_to_col(mut col: usize) -> String {
    let mut letters = Vec::<u8>::new();
    col += 1;
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}

/// Converts a cell reference (`B3`, `$B$3`) to 0-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = REFERENCE_PATTERN.captures(reference)?;
    let col = col_to_index(captures.get(1)?.as_str())?;
    let row = captures.get(2)?.as_str().parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

/// Converts 0-based `(row, col)` to a cell reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}
