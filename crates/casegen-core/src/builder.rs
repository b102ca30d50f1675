//! Case building: copy the reference case, then apply the mapping to each row
//!
//! Each row goes through copy, then one edit pass per mapped file. A row that
//! fails is recorded in the batch report and the next row is processed.

use crate::copy::copy_reference_case;
use crate::error::{Error, Result};
use crate::mapping::{FileEdit, MappingSpec};
use crate::patch::apply_update;
use crate::report::{BatchReport, CaseOutcome};
use crate::table::Row;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Switches controlling how cases are built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Replace existing case directories
    pub overwrite: bool,
    /// Validate and log only; never touch the filesystem
    pub dry_run: bool,
}

/// What happened to a single mapped file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Path relative to the case directory
    pub path: String,
    /// Number of updates applied
    pub updates_applied: usize,
    /// Whether the text differs from the original
    pub changed: bool,
}

/// Result of building one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    /// Case name from the row
    pub case_name: String,
    /// Case directory (not created in dry-run mode)
    pub destination: PathBuf,
    /// Edited files, in mapping order
    pub files: Vec<FileSummary>,
}

/// Builds case directories from a reference case and a mapping
#[derive(Debug, Clone)]
pub struct CaseBuilder<'a> {
    reference: PathBuf,
    output_root: PathBuf,
    mapping: &'a MappingSpec,
    options: BuildOptions,
}

impl<'a> CaseBuilder<'a> {
    /// Create a builder. The reference case must be an existing directory.
    pub fn new(
        reference: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        mapping: &'a MappingSpec,
        options: BuildOptions,
    ) -> Result<Self> {
        let reference = reference.into();
        if !reference.is_dir() {
            return Err(Error::ReferenceNotFound(reference));
        }

        Ok(Self {
            reference,
            output_root: output_root.into(),
            mapping,
            options,
        })
    }

    /// Directory a row's case is written to
    pub fn destination(&self, row: &Row) -> PathBuf {
        self.output_root.join(row.case_name())
    }

    /// Build every row in order, recording failures without stopping.
    ///
    /// The output root is created first unless this is a dry run.
    pub fn run(&self, rows: &[Row]) -> Result<BatchReport> {
        if !self.options.dry_run {
            fs::create_dir_all(&self.output_root)?;
        }

        let mut report = BatchReport::start(self.options.dry_run);
        for row in rows {
            let outcome = match self.build(row) {
                Ok(summary) => CaseOutcome::Built(summary),
                Err(e) => {
                    tracing::debug!("case {} failed: {}", row.case_name(), e);
                    CaseOutcome::Failed {
                        case_name: row.case_name().to_string(),
                        reason: e.to_string(),
                    }
                }
            };
            report.push(outcome);
        }
        report.finish();

        Ok(report)
    }

    /// Build one case: copy the reference, then apply each mapped file's updates
    pub fn build(&self, row: &Row) -> Result<CaseSummary> {
        let case_name = row.case_name();
        let dest = self.destination(row);

        tracing::info!("==> Building case: {}", case_name);
        tracing::debug!("    from: {}", self.reference.display());
        tracing::debug!("    to  : {}", dest.display());

        // Dry runs read from the reference, which is what the copy would contain
        let case_root: &Path = if self.options.dry_run {
            if !self.options.overwrite && fs::symlink_metadata(&dest).is_ok() {
                return Err(Error::DestinationAlreadyExists(dest));
            }
            &self.reference
        } else {
            copy_reference_case(&self.reference, &dest, self.options.overwrite)?;
            &dest
        };

        let mut files = Vec::with_capacity(self.mapping.files.len());
        for file in &self.mapping.files {
            let rel = file.target()?;
            let path = case_root.join(rel);
            if !path.exists() {
                return Err(Error::FileNotFoundInCase(dest.join(rel)));
            }

            tracing::debug!(" Editing: {}", rel);
            files.push(self.edit_file(&path, file, row)?);
        }

        Ok(CaseSummary {
            case_name: case_name.to_string(),
            destination: dest,
            files,
        })
    }

    /// Apply all updates in memory; write only if every update succeeded
    fn edit_file(&self, path: &Path, file: &FileEdit, row: &Row) -> Result<FileSummary> {
        let original = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut text = original.clone();
        for update in &file.updates {
            text = apply_update(&text, update, row, Path::new(&file.path))?;
        }

        let changed = text != original;
        if changed && !self.options.dry_run {
            fs::write(path, &text).map_err(|e| Error::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        Ok(FileSummary {
            path: file.path.clone(),
            updates_applied: file.updates.len(),
            changed,
        })
    }
}
