//! CSV row source loading and case selection

use crate::error::{Error, Result};
use crate::table::{Row, RowSet, CASE_NAME_COLUMN};
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Read a CSV file of case parameters into a RowSet
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<RowSet> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_rows_from(BufReader::new(file), path.to_path_buf())
}

/// Read case parameters from a CSV string (useful for testing)
pub fn read_rows_str(content: &str, source_name: &str) -> Result<RowSet> {
    read_rows_from(content.as_bytes(), PathBuf::from(source_name))
}

fn read_rows_from<R: Read>(reader: R, path: PathBuf) -> Result<RowSet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?
        .clone();

    let records = csv_reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

    if records.is_empty() {
        return Err(Error::RowSourceEmpty { path });
    }

    let columns: Vec<String> = headers.iter().map(str::to_string).collect();

    if !columns.iter().any(|c| c == CASE_NAME_COLUMN) {
        return Err(Error::RowSourceSchemaMissingCaseName { path, record: 0 });
    }

    let mut rows = Vec::with_capacity(records.len());
    let mut seen = HashSet::new();
    for (idx, record) in records.iter().enumerate() {
        if record.len() > columns.len() {
            tracing::warn!(
                "record {} in {} has more fields than columns, truncating",
                idx + 1,
                path.display()
            );
        }

        // Short records simply lack their trailing columns
        let row = Row::new(
            columns
                .iter()
                .zip(record.iter())
                .map(|(col, value)| (col.as_str(), value)),
        );

        let case_name = row.case_name();
        if case_name.is_empty() {
            return Err(Error::RowSourceSchemaMissingCaseName {
                path,
                record: idx + 1,
            });
        }
        if !is_plain_dir_name(case_name) {
            return Err(Error::InvalidCaseName {
                path,
                record: idx + 1,
                name: case_name.to_string(),
            });
        }
        if !seen.insert(case_name.to_string()) {
            tracing::warn!(
                "duplicate case_name '{}' at record {} in {}",
                case_name,
                idx + 1,
                path.display()
            );
        }

        rows.push(row);
    }

    Ok(RowSet {
        columns,
        rows,
        source_path: path,
    })
}

/// True if `name` joins onto a directory as exactly one new child.
///
/// Rejects `.`, `..`, absolute paths and anything with a separator, which
/// would otherwise let `--overwrite` remove something outside the case.
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// Parse a comma-separated allow-list of case names, ignoring blanks
pub fn parse_selection(only: &str) -> BTreeSet<String> {
    only.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Restrict rows to an allow-list of case names, keeping input order.
///
/// An empty allow-list selects every row.
pub fn select_rows(rows: &RowSet, wanted: &BTreeSet<String>) -> Result<Vec<Row>> {
    if wanted.is_empty() {
        return Ok(rows.rows.clone());
    }

    let selected: Vec<Row> = rows
        .rows
        .iter()
        .filter(|r| wanted.contains(r.case_name()))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(Error::NoMatchingRowsForFilter {
            requested: wanted.iter().cloned().collect(),
        });
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNS: &str = "case_name,Re,endTime,deltaT\n\
                        e0.0_Re500,500,20,0.005\n\
                        e0.0_Re1000,1000,40,0.0025\n";

    #[test]
    fn test_read_simple_csv() {
        let set = read_rows_str(RUNS, "runs.csv").unwrap();

        assert_eq!(set.column_count(), 4);
        assert_eq!(set.columns[0], "case_name");
        assert_eq!(set.columns[3], "deltaT");

        assert_eq!(set.row_count(), 2);
        assert_eq!(set.rows[0].case_name(), "e0.0_Re500");
        assert_eq!(set.rows[1].get("endTime"), Some("40"));
    }

    #[test]
    fn test_values_are_not_typed_or_trimmed() {
        let csv = "case_name,U,mu\na,\"(1 0 0)\",1e-3\n";
        let set = read_rows_str(csv, "runs.csv").unwrap();

        assert_eq!(set.rows[0].get("U"), Some("(1 0 0)"));
        assert_eq!(set.rows[0].get("mu"), Some("1e-3"));
    }

    #[test]
    fn test_case_name_need_not_be_first() {
        let csv = "Re,case_name\n500,a\n";
        let set = read_rows_str(csv, "runs.csv").unwrap();
        assert_eq!(set.rows[0].case_name(), "a");
    }

    #[test]
    fn test_empty_csv() {
        let err = read_rows_str("case_name,Re\n", "runs.csv").unwrap_err();
        assert!(matches!(err, Error::RowSourceEmpty { .. }));

        let err = read_rows_str("", "runs.csv").unwrap_err();
        assert!(matches!(err, Error::RowSourceEmpty { .. }));
    }

    #[test]
    fn test_missing_case_name_column() {
        let err = read_rows_str("name,Re\na,500\n", "runs.csv").unwrap_err();
        assert!(matches!(
            err,
            Error::RowSourceSchemaMissingCaseName { record: 0, .. }
        ));
    }

    #[test]
    fn test_record_without_case_name_value() {
        let csv = "Re,case_name\n500,a\n600\n";
        let err = read_rows_str(csv, "runs.csv").unwrap_err();
        assert!(matches!(
            err,
            Error::RowSourceSchemaMissingCaseName { record: 2, .. }
        ));

        let csv = "case_name,Re\n,500\n";
        let err = read_rows_str(csv, "runs.csv").unwrap_err();
        assert!(matches!(
            err,
            Error::RowSourceSchemaMissingCaseName { record: 1, .. }
        ));
    }

    #[test]
    fn test_case_name_must_be_plain_directory_name() {
        for name in [".", "..", "a/b", "/abs", "a/", "./a"] {
            let csv = format!("case_name,Re\nok,1\n{},500\n", name);
            let err = read_rows_str(&csv, "runs.csv").unwrap_err();
            assert!(
                matches!(err, Error::InvalidCaseName { record: 2, .. }),
                "{:?} should be rejected",
                name
            );
        }

        let set = read_rows_str("case_name\nRe500.e0\n..hidden\n", "runs.csv").unwrap();
        assert_eq!(set.rows[1].case_name(), "..hidden");
    }

    #[test]
    fn test_short_and_long_records() {
        let csv = "case_name,Re,endTime\na,500\nb,600,20,extra\n";
        let set = read_rows_str(csv, "runs.csv").unwrap();

        assert!(!set.rows[0].contains("endTime"));
        assert_eq!(set.rows[1].get("endTime"), Some("20"));
        assert_eq!(set.rows[1].get("Re"), Some("600"));
    }

    #[test]
    fn test_parse_selection() {
        let wanted = parse_selection(" a, b ,,c ");
        assert_eq!(wanted.len(), 3);
        assert!(wanted.contains("b"));
        assert!(parse_selection("").is_empty());
        assert!(parse_selection(" , ").is_empty());
    }

    #[test]
    fn test_select_rows_keeps_input_order() {
        let set = read_rows_str(RUNS, "runs.csv").unwrap();

        let all = select_rows(&set, &BTreeSet::new()).unwrap();
        assert_eq!(all.len(), 2);

        let wanted = parse_selection("e0.0_Re1000,e0.0_Re500");
        let picked = select_rows(&set, &wanted).unwrap();
        assert_eq!(picked[0].case_name(), "e0.0_Re500");
        assert_eq!(picked[1].case_name(), "e0.0_Re1000");
    }

    #[test]
    fn test_select_rows_no_match() {
        let set = read_rows_str(RUNS, "runs.csv").unwrap();
        let err = select_rows(&set, &parse_selection("nope")).unwrap_err();
        assert!(matches!(err, Error::NoMatchingRowsForFilter { .. }));
    }
}
