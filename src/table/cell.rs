use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;

/// Literal written into every missing cell during cleaning.
pub const MISSING_LITERAL: &str = "N/A";

/// A single cell value of a table.
#[derive(Clone, Debug, Default)]
pub enum Cell {
    /// Free text, kept verbatim (including surrounding whitespace) until cleaned
    Text(String),
    /// Finite numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Absent, null or empty value
    #[default]
    Missing,
}

impl Cell {
    /// Builds a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Builds a numeric cell, mapping non-finite values to `Missing`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Missing
        }
    }

    /// Returns true if the cell is the missing marker.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the text content if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Numbers compare by value; `-0.0` and `0.0` are the same cell.
    fn number_bits(value: f64) -> u64 {
        if value == 0.0 {
            0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left == right,
            (Self::Number(left), Self::Number(right)) => Self::number_bits(*left) == Self::number_bits(*right),
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Missing, Self::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Text(value) => value.hash(state),
            Self::Number(value) => Self::number_bits(*value).hash(state),
            Self::Boolean(value) => value.hash(state),
            Self::Missing => (),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{}", format_number(*value)),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Missing => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// Integral values print without a fractional part, everything else in
/// shortest round-trip form.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
