//! Row source types: one row per generated case

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the reserved column holding each case's directory name
pub const CASE_NAME_COLUMN: &str = "case_name";

/// Parameter rows loaded from a single CSV file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names, from the header record
    pub columns: Vec<String>,
    /// Row data, in file order
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl RowSet {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One parameter set: column name to raw text value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: BTreeMap<String, String>,
}

impl Row {
    /// Create a row from `(column, value)` pairs
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Check whether the row carries a column
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// The case name, or an empty string if the row has none.
    ///
    /// Rows produced by [`crate::parser::read_rows`] always carry a non-empty case name.
    pub fn case_name(&self) -> &str {
        self.get(CASE_NAME_COLUMN).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_and_contains() {
        let row = Row::new([("case_name", "caseA"), ("endTime", "20")]);
        assert_eq!(row.get("endTime"), Some("20"));
        assert!(row.contains("case_name"));
        assert!(!row.contains("deltaT"));
        assert_eq!(row.get("deltaT"), None);
    }

    #[test]
    fn test_row_case_name() {
        let row = Row::new([("case_name", "e0.0_Re500")]);
        assert_eq!(row.case_name(), "e0.0_Re500");
        assert_eq!(Row::default().case_name(), "");
    }

    #[test]
    fn test_row_values_are_raw() {
        let row = Row::new([("U", " (1 0 0) ")]);
        assert_eq!(row.get("U"), Some(" (1 0 0) "));
    }
}
