//! Mapping file format (JSON) describing which files to edit and how
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "path": "system/controlDict",
//!       "updates": [
//!         {"type": "key", "key": "endTime", "param": "endTime"}
//!       ]
//!     },
//!     {
//!       "path": "0/U",
//!       "updates": [
//!         {"type": "regex",
//!          "pattern": "^(\\s*internalField\\s+uniform\\s+).+?\\s*;",
//!          "replacement": "\\1(0 0 {U0});",
//!          "params": {"U0": "U0"}}
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The full mapping: an ordered list of files to edit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingSpec {
    /// Files to edit, in application order
    #[serde(default)]
    pub files: Vec<FileEdit>,
}

impl MappingSpec {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file edit to the mapping
    pub fn add_file(&mut self, file: FileEdit) {
        self.files.push(file);
    }

    /// Load a mapping from JSON.
    ///
    /// Only the JSON shape is checked here. Entries missing a required field
    /// load fine and fail each row that reaches them.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::InvalidMapping {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Total number of updates across all files
    pub fn update_count(&self) -> usize {
        self.files.iter().map(|f| f.updates.len()).sum()
    }
}

/// Edits to apply to one file, relative to the case root
#[derive(Debug, Clone, Deserialize)]
pub struct FileEdit {
    /// Path relative to the case directory; empty when the entry has none
    #[serde(default)]
    pub path: String,
    /// Updates applied in order to the file text
    #[serde(default)]
    pub updates: Vec<Update>,
}

impl FileEdit {
    /// Create a new file edit with no updates
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            updates: Vec::new(),
        }
    }

    /// Append an update
    pub fn with_update(mut self, update: Update) -> Self {
        self.updates.push(update);
        self
    }

    /// The case-relative path, or `MalformedMapping` if the entry has none
    pub fn target(&self) -> Result<&str> {
        if self.path.is_empty() {
            return Err(Error::MalformedMapping(
                "file entry is missing field 'path'".to_string(),
            ));
        }
        Ok(self.path.as_str())
    }
}

/// A single edit operation, tagged by `type` in JSON
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawUpdate")]
pub enum Update {
    /// Set a `key value;` entry to a row value
    Key {
        /// Entry name in the file
        key: String,
        /// CSV column providing the new value
        param: String,
    },
    /// Regular-expression substitution with a templated replacement
    Regex {
        pattern: String,
        replacement: String,
        /// Placeholder name -> CSV column
        params: BTreeMap<String, String>,
    },
    /// An update whose `type` is not recognised; fails when applied
    Unknown(String),
    /// A known update lacking a required field; fails when applied
    Malformed(String),
}

impl Update {
    /// Create a key update
    pub fn key(key: impl Into<String>, param: impl Into<String>) -> Self {
        Update::Key {
            key: key.into(),
            param: param.into(),
        }
    }

    /// Create a regex update
    pub fn regex<K, V>(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Update::Regex {
            pattern: pattern.into(),
            replacement: replacement.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Wire shape of an update; every field is optional until the tag is known
#[derive(Debug, Default, Deserialize)]
struct RawUpdate {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    param: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    replacement: Option<String>,
    #[serde(default)]
    params: Option<BTreeMap<String, String>>,
}

impl RawUpdate {
    fn malformed(kind: &str, field: &str) -> Update {
        Update::Malformed(format!("{} update is missing field '{}'", kind, field))
    }
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        match raw.kind.as_str() {
            "key" => match (raw.key, raw.param) {
                (Some(key), Some(param)) => Update::Key { key, param },
                (None, _) => RawUpdate::malformed("key", "key"),
                (_, None) => RawUpdate::malformed("key", "param"),
            },
            "regex" => match (raw.pattern, raw.replacement) {
                (Some(pattern), Some(replacement)) => Update::Regex {
                    pattern,
                    replacement,
                    params: raw.params.unwrap_or_default(),
                },
                (None, _) => RawUpdate::malformed("regex", "pattern"),
                (_, None) => RawUpdate::malformed("regex", "replacement"),
            },
            _ => Update::Unknown(raw.kind),
        }
    }
}
