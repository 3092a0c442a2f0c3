//! Table scanner and metadata extractor.
//!
//! Turns a directory of delimited exports into a [`ProfileSet`]. Every
//! per-file failure is captured in that table's profile; only an unreadable
//! directory fails the pass.
//!
//! # Per-file steps
//!
//! 1. Reject UTF-16 byte-order marks
//! 2. Probe the header (bounded rows)
//! 3. Count rows by counting line terminators
//! 4. Read a bounded sample for null rates, distinct counts and annotations

mod discovery;
mod profile;
mod reader;
mod row_count;

pub use discovery::{discover_tables, TableFile, TABLE_EXTENSIONS};
pub use profile::{ProfileSet, TableProfile};
pub use reader::{
    align_record, csv_error, is_missing, normalize_header, open_records, probe_header, raw_dtype,
    read_sample, validate_encoding, RawSample, MISSING_TOKENS,
};
pub use row_count::{count_rows, count_rows_by_lines, count_rows_fast};

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::config::ScanSettings;
use crate::semantic::annotate_values;

/// Errors raised while scanning.
///
/// The per-file variants are recorded in a failed profile's `error` field
/// using their `Display` text.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported encoding in {path}: {encoding}")]
    UnsupportedEncoding { path: PathBuf, encoding: String },

    #[error("Malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("No header row in {0}")]
    NoHeader(PathBuf),
}

impl ScanError {
    pub(crate) fn file_read(path: &Path, source: std::io::Error) -> Self {
        ScanError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Receives progress notifications during a scan. Must not block.
pub trait ProgressObserver {
    fn on_progress(&self, processed: usize, total: usize, table: &str);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _processed: usize, _total: usize, _table: &str) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, &str),
{
    fn on_progress(&self, processed: usize, total: usize, table: &str) {
        self(processed, total, table)
    }
}

/// Scan `dir` and profile every recognized table file.
///
/// At most `settings.max_tables` files are profiled, in file-name order.
pub fn scan_directory(
    dir: &Path,
    settings: &ScanSettings,
    observer: &dyn ProgressObserver,
) -> ScanResult<ProfileSet> {
    let mut files = discover_tables(dir)?;
    if let Some(max) = settings.max_tables {
        files.truncate(max);
    }

    let total = files.len();
    let mut profiles = ProfileSet::new();
    let mut seen = HashSet::new();

    for (idx, file) in files.iter().enumerate() {
        if !seen.insert(file.name.clone()) {
            tracing::warn!(
                table = %file.name,
                path = %file.path.display(),
                "Duplicate table name, keeping the first file"
            );
            observer.on_progress(idx + 1, total, &file.name);
            continue;
        }

        let profile = profile_table(file, settings);
        match &profile.error {
            Some(error) => tracing::warn!(table = %file.name, %error, "Table scan failed"),
            None => tracing::debug!(
                table = %file.name,
                rows = profile.rows(),
                columns = profile.columns.len(),
                "Table scanned"
            ),
        }
        profiles.insert(profile);
        observer.on_progress(idx + 1, total, &file.name);
    }

    tracing::info!(
        dir = %dir.display(),
        tables = profiles.len(),
        failed = profiles.failed().count(),
        "Scan complete"
    );
    Ok(profiles)
}

/// Profile one file. Never fails: errors land in the profile.
pub fn profile_table(file: &TableFile, settings: &ScanSettings) -> TableProfile {
    let (size, modified) = match std::fs::metadata(&file.path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64);
            (meta.len(), modified)
        }
        Err(e) => {
            let error = ScanError::file_read(&file.path, e);
            return TableProfile::failed(&file.name, &file.path, 0, None, error);
        }
    };

    match collect_profile(file, settings, size, modified) {
        Ok(profile) => profile,
        Err(error) => TableProfile::failed(&file.name, &file.path, size, modified, error),
    }
}

fn collect_profile(
    file: &TableFile,
    settings: &ScanSettings,
    size: u64,
    modified: Option<i64>,
) -> ScanResult<TableProfile> {
    let path = file.path.as_path();
    validate_encoding(path)?;
    let columns = probe_header(path, settings.header_probe_rows)?;
    let row_count = count_rows(path).map_err(|e| ScanError::file_read(path, e))?;
    let sample = read_sample(path, settings.sample_size)?;

    let sample_size = sample.rows.len();
    let mut dtypes = BTreeMap::new();
    let mut null_rate = BTreeMap::new();
    let mut unique_count = BTreeMap::new();
    let mut annotations = Vec::with_capacity(columns.len());

    for (idx, column) in columns.iter().enumerate() {
        let values = sample.column_values(idx);
        let missing = values.iter().filter(|v| v.is_none()).count();
        let distinct: HashSet<&str> = values.iter().flatten().copied().collect();
        let rate = if sample_size == 0 {
            0.0
        } else {
            missing as f64 / sample_size as f64 * 100.0
        };

        dtypes.insert(column.clone(), raw_dtype(&values).to_string());
        null_rate.insert(column.clone(), rate);
        unique_count.insert(column.clone(), distinct.len());
        annotations.push(annotate_values(column, &values));
    }

    let sample_rows = sample
        .rows
        .iter()
        .take(settings.preview_rows)
        .cloned()
        .collect();

    Ok(TableProfile {
        name: file.name.clone(),
        file_path: file.path.clone(),
        file_size_bytes: size,
        modified_unix: modified,
        row_count: Some(row_count),
        columns,
        dtypes,
        null_rate,
        unique_count,
        sample_size,
        sample_rows,
        annotations,
        error: None,
    })
}
