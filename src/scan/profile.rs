//! Table profiles produced by a scan pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::semantic::ColumnAnnotation;

/// Scan-derived metadata snapshot of one source table.
///
/// When `error` is set, every statistical field is empty and must not be
/// read; check [`TableProfile::is_error`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    /// Unique table name (file stem).
    pub name: String,
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    /// Source modification time, seconds since the Unix epoch.
    pub modified_unix: Option<i64>,
    /// Data rows (header excluded). `None` only for failed tables.
    pub row_count: Option<u64>,
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Raw detected type label per column (`int64`, `float64`, `bool`, `object`).
    pub dtypes: BTreeMap<String, String>,
    /// Percentage (0-100) of missing values per column, over the sample.
    pub null_rate: BTreeMap<String, f64>,
    /// Distinct non-null values per column, over the sample.
    pub unique_count: BTreeMap<String, usize>,
    /// Rows actually read for the statistics.
    pub sample_size: usize,
    /// A few leading records, aligned with `columns`. Display only.
    pub sample_rows: Vec<Vec<Option<String>>>,
    pub annotations: Vec<ColumnAnnotation>,
    pub error: Option<String>,
}

impl TableProfile {
    /// An error-state profile carrying only identity and the failure text.
    pub fn failed(
        name: impl Into<String>,
        file_path: impl Into<PathBuf>,
        file_size_bytes: u64,
        modified_unix: Option<i64>,
        error: impl ToString,
    ) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            file_size_bytes,
            modified_unix,
            row_count: None,
            columns: Vec::new(),
            dtypes: BTreeMap::new(),
            null_rate: BTreeMap::new(),
            unique_count: BTreeMap::new(),
            sample_size: 0,
            sample_rows: Vec::new(),
            annotations: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Row count, or zero for failed tables.
    pub fn rows(&self) -> u64 {
        self.row_count.unwrap_or(0)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Distinct values over non-null sample values, in `[0, 1]`.
    ///
    /// `None` for unknown columns or columns with no present values.
    pub fn uniqueness(&self, column: &str) -> Option<f64> {
        let unique = *self.unique_count.get(column)?;
        let null_rate = self.null_rate.get(column).copied().unwrap_or(0.0);
        let present = (self.sample_size as f64 * (1.0 - null_rate / 100.0)).round();
        if present <= 0.0 {
            return None;
        }
        Some((unique as f64 / present).min(1.0))
    }

    pub fn annotation(&self, column: &str) -> Option<&ColumnAnnotation> {
        self.annotations.iter().find(|a| a.column == column)
    }
}

/// Immutable set of profiles from one scan pass, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet {
    tables: BTreeMap<String, TableProfile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile. Returns `false` (and keeps the existing entry) when
    /// the name is already taken.
    pub fn insert(&mut self, profile: TableProfile) -> bool {
        if self.tables.contains_key(&profile.name) {
            return false;
        }
        self.tables.insert(profile.name.clone(), profile);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TableProfile> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// All profiles in name order, failed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &TableProfile> {
        self.tables.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Profiles that scanned cleanly.
    pub fn valid(&self) -> impl Iterator<Item = &TableProfile> {
        self.tables.values().filter(|p| !p.is_error())
    }

    /// Profiles in error state.
    pub fn failed(&self) -> impl Iterator<Item = &TableProfile> {
        self.tables.values().filter(|p| p.is_error())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Write the set as a JSON document.
    pub fn save_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Read a set written by [`ProfileSet::save_json`].
    pub fn load_json(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(std::io::Error::other)
    }
}

impl FromIterator<TableProfile> for ProfileSet {
    fn from_iter<I: IntoIterator<Item = TableProfile>>(iter: I) -> Self {
        let mut set = ProfileSet::new();
        for profile in iter {
            set.insert(profile);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a TableProfile;
    type IntoIter = std::collections::btree_map::Values<'a, String, TableProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.values()
    }
}
