//! Country Selection
//! Splits a comma-separated list of countries into accepted and rejected names.

use super::pipeline::ValidCountryList;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

/// Parse user input such as `"China, Italy, Narnia"` against `valid`.
/// Blank entries are dropped and repeated names kept once.
pub fn parse_selection(input: &str, valid: &ValidCountryList) -> Selection {
    let mut seen = HashSet::new();
    let (accepted, rejected): (Vec<String>, Vec<String>) = input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(str::to_string)
        .partition(|name| valid.contains(name));
    Selection { accepted, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ValidCountryList {
        ValidCountryList::new(
            ["China", "Italy", "South Korea", "US"]
                .into_iter()
                .map(String::from),
        )
    }

    #[test]
    fn adjacent_invalid_entries_are_all_rejected() {
        let selection = parse_selection("Narnia, Oz, Italy, Mordor", &valid());
        assert_eq!(selection.accepted, vec!["Italy"]);
        assert_eq!(selection.rejected, vec!["Narnia", "Oz", "Mordor"]);
    }

    #[test]
    fn whitespace_blanks_and_duplicates() {
        let selection = parse_selection(" China ,,South Korea, China,  ", &valid());
        assert_eq!(selection.accepted, vec!["China", "South Korea"]);
        assert!(selection.rejected.is_empty());
    }

    #[test]
    fn matching_is_exact() {
        let selection = parse_selection("china, Korea, South", &valid());
        assert!(selection.accepted.is_empty());
        assert_eq!(selection.rejected, vec!["china", "Korea", "South"]);
    }
}
