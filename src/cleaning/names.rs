use crate::cleaning::CleaningError;
use std::collections::HashMap;
use std::collections::HashSet;

/// How to resolve two columns that standardize to the same name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum ColumnNaming {
    /// Later columns get `_2`, `_3`, ... in column order
    #[default]
    Suffix,
    /// Any collision is reported as an error
    Strict,
}

/// Standardizes a single column name: surrounding whitespace trimmed,
/// lowercased, spaces replaced with underscores.
pub fn standardize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Standardizes every column name, resolving collisions per `naming`.
pub(crate) fn standardize_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    naming: ColumnNaming,
) -> Result<Vec<String>, CleaningError> {
    let originals: Vec<&str> = names.into_iter().collect();
    let standardized: Vec<String> = originals.iter().map(|name| standardize_name(name)).collect();

    let mut groups = HashMap::<&str, Vec<&str>>::new();
    for (original, name) in originals.iter().copied().zip(&standardized) {
        groups.entry(name.as_str()).or_default().push(original);
    }
    if naming == ColumnNaming::Strict {
        // Report the first collision in column order.
        for name in &standardized {
            let sources = &groups[name.as_str()];
            if sources.len() > 1 {
                return Err(CleaningError::ColumnNameCollision {
                    name: name.to_owned(),
                    columns: sources.iter().map(|it| it.to_string()).collect(),
                });
            }
        }
    }

    let reserved: HashSet<&str> = standardized.iter().map(String::as_str).collect();
    let mut assigned = HashSet::<String>::with_capacity(standardized.len());
    let mut result = Vec::with_capacity(standardized.len());
    for name in &standardized {
        let resolved = if assigned.contains(name) {
            (2usize..)
                .map(|suffix| format!("{name}_{suffix}"))
                .find(|candidate| !reserved.contains(candidate.as_str()) && !assigned.contains(candidate))
                .expect("unbounded suffix range")
        } else {
            name.to_owned()
        };
        assigned.insert(resolved.clone());
        result.push(resolved);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standardize_single_names() {
        assert_eq!(standardize_name("First Name"), "first_name");
        assert_eq!(standardize_name("Name "), "name");
        assert_eq!(standardize_name("  Unit  Price "), "unit__price");
        assert_eq!(standardize_name("already_clean"), "already_clean");
        assert_eq!(standardize_name("ÄGE"), "äge");
    }

    #[test]
    fn suffix_collisions_in_column_order() {
        let names = standardize_names(["Name", "name ", "NAME", "Age"], ColumnNaming::Suffix).unwrap();
        assert_eq!(names, vec!["name", "name_2", "name_3", "age"]);
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let names = standardize_names(["a", "A", "a_2"], ColumnNaming::Suffix).unwrap();
        assert_eq!(names, vec!["a", "a_3", "a_2"]);
    }

    #[test]
    fn strict_reports_collision() {
        let error = standardize_names(["Total", "x", "total"], ColumnNaming::Strict).unwrap_err();
        assert_eq!(
            error,
            CleaningError::ColumnNameCollision {
                name: "total".to_owned(),
                columns: vec!["Total".to_owned(), "total".to_owned()],
            }
        );
    }

    #[test]
    fn strict_accepts_distinct_names() {
        let names = standardize_names(["First Name", "Last Name"], ColumnNaming::Strict).unwrap();
        assert_eq!(names, vec!["first_name", "last_name"]);
    }
}
