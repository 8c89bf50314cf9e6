use glob::Pattern;
use std::collections::HashSet;

/// Options controlling how a source file is read into a [`crate::TableSet`].
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Sheet name patterns; only matching worksheets are loaded.
    pub sheets: Option<Vec<Pattern>>,

    /// null literals (default: empty string)
    pub nulls: HashSet<String>,

    /// Encoding label for CSV input, e.g. `windows-1252`.
    pub encoding: Option<String>,

    /// CSV field delimiter; `,` unless the file is a `.tsv`.
    pub delimiter: Option<u8>,

    /// Read error cells as missing instead of their error literal.
    pub error_as_null: bool,

    /// Drop data rows where every cell is missing.
    pub skip_empty_rows: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            sheets: None,
            nulls: HashSet::from([String::new()]),
            encoding: None,
            delimiter: None,
            error_as_null: false,
            skip_empty_rows: false,
        }
    }
}

impl LoadOptions {
    /// Checks if a sheet name matches the sheet patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.sheets {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }

    /// Checks if a raw value is one of the null literals.
    pub fn is_null(&self, value: &str) -> bool {
        self.nulls.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = LoadOptions::default();
        assert!(options.accept("anything"));
        assert!(options.is_null(""));
        assert!(!options.is_null("N/A"));
        assert!(!options.is_null(" "));
    }

    #[test]
    fn sheet_patterns() {
        let options = LoadOptions {
            sheets: Some(vec![Pattern::new("Rev*").unwrap(), Pattern::new("Costs").unwrap()]),
            ..LoadOptions::default()
        };
        assert!(options.accept("Revenue"));
        assert!(options.accept("Costs"));
        assert!(!options.accept("Summary"));
    }
}
