//! Batch report: the outcome of every processed row
//!
//! The report can be saved as JSON alongside the generated cases.

use crate::builder::CaseSummary;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Case was built (or would be, in a dry run)
    Built(CaseSummary),
    /// Case failed; later rows were still processed
    Failed { case_name: String, reason: String },
}

impl CaseOutcome {
    /// Case name of the row this outcome belongs to
    pub fn case_name(&self) -> &str {
        match self {
            CaseOutcome::Built(summary) => &summary.case_name,
            CaseOutcome::Failed { case_name, .. } => case_name,
        }
    }

    /// Check if the row failed
    pub fn is_failed(&self) -> bool {
        matches!(self, CaseOutcome::Failed { .. })
    }
}

/// Report for a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the last row finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Outcomes in row order
    pub cases: Vec<CaseOutcome>,
}

impl BatchReport {
    /// Start a new report stamped with the current time
    pub fn start(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            cases: Vec::new(),
        }
    }

    /// Record a row outcome
    pub fn push(&mut self, outcome: CaseOutcome) {
        self.cases.push(outcome);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of rows processed
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Number of rows that failed
    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.is_failed()).count()
    }

    /// Number of rows that were built
    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }

    /// Failed rows as `(case_name, reason)`
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cases.iter().filter_map(|c| match c {
            CaseOutcome::Failed { case_name, reason } => Some((case_name.as_str(), reason.as_str())),
            CaseOutcome::Built(_) => None,
        })
    }

    /// Summaries of the rows that were built
    pub fn built(&self) -> impl Iterator<Item = &CaseSummary> {
        self.cases.iter().filter_map(|c| match c {
            CaseOutcome::Built(summary) => Some(summary),
            CaseOutcome::Failed { .. } => None,
        })
    }

    /// `Ok` if no row failed, otherwise [`Error::BatchFailed`]
    pub fn ensure_success(&self) -> Result<()> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(Error::BatchFailed {
                failed,
                total: self.total(),
            }),
        }
    }

    /// Save the report to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
