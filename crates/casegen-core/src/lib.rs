//! casegen-core: Core library for generating parameterized simulation cases
//!
//! This library provides functionality to:
//! - Load parameter rows (one per case) from a CSV file
//! - Load a JSON mapping of which files and entries to edit
//! - Copy a reference case directory, keeping symlinks
//! - Rewrite `key value;` entries and apply templated regex substitutions
//! - Build a batch of cases, collecting per-row failures into a report

pub mod builder;
pub mod copy;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod patch;
pub mod report;
pub mod table;

pub use builder::{BuildOptions, CaseBuilder, CaseSummary, FileSummary};
pub use copy::copy_reference_case;
pub use error::{Error, Result};
pub use mapping::{FileEdit, MappingSpec, Update};
pub use parser::{parse_selection, read_rows, read_rows_str, select_rows};
pub use patch::{apply_regex, apply_update, fill_template, set_key};
pub use report::{BatchReport, CaseOutcome};
pub use table::{Row, RowSet, CASE_NAME_COLUMN};
