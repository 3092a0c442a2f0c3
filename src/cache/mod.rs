//! Columnar cache manager.
//!
//! Two layers behind one key type:
//!
//! - **Artifacts** - Parquet files per `(table, mode)` in the artifact
//!   directory, built on first use and written atomically
//! - **Memory** - materialized results per `(table, request digest)`, shared
//!   across calls in a session; hits and misses are counted
//!
//! Conversions are serialized per table, so concurrent callers asking for
//! the same uncached table trigger exactly one conversion.
//!
//! # Artifact names
//!
//! ```text
//! {table}.parquet                        full table
//! {table}.sample-{n}-seed-{seed}.parquet seeded sample of n rows
//! ```
//!
//! Both kinds are narrowed by [`narrow_frame`]. Integer widths follow the
//! values present in each artifact, so a sample may use a narrower integer
//! type than the full table.
//!
//! Projected and filtered requests are reads over these artifacts and only
//! live in memory.

mod artifact;
mod filter;
mod hash;
mod sample;
mod source;
mod store;

pub use artifact::{artifact_file_name, belongs_to, is_fresh};
pub use filter::{apply_filters, Filter, FilterValue, Predicate};
pub use hash::compute_hash;
pub use sample::{draw_sample, SamplePlan};
pub use source::{narrow_frame, read_full, rows_to_frame, ChunkReader, Rows};
pub use store::{ProfileStore, StoreStats};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{CacheSettings, SettingsError};
use crate::scan::ProfileSet;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Table not found: {table}")]
    NotFound { table: String },

    #[error("Table {table} is unavailable: {reason}")]
    Unavailable { table: String, reason: String },

    #[error("Failed to convert {path} to a columnar artifact: {message}")]
    ConversionFailed { path: PathBuf, message: String },

    #[error("Unknown columns for table {table}: {}", columns.join(", "))]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Columnar engine error: {0}")]
    Polars(#[from] PolarsError),

    #[error("SQLite error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cache settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to determine cache directory")]
    NoCacheDir,
}

impl CacheError {
    pub(crate) fn conversion(path: &Path, error: impl std::fmt::Display) -> Self {
        CacheError::ConversionFailed {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// How much of a table to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Full,
    Sample(usize),
}

/// A load: mode plus optional projection and row filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub mode: LoadMode,
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
}

impl LoadRequest {
    pub fn full() -> Self {
        Self {
            mode: LoadMode::Full,
            columns: None,
            filters: Vec::new(),
        }
    }

    pub fn sample(rows: usize) -> Self {
        Self {
            mode: LoadMode::Sample(rows),
            ..Self::full()
        }
    }

    /// Read only these columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Key of a materialized result in the memory layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryKey {
    pub table: String,
    /// Digest of the full [`LoadRequest`].
    pub digest: String,
}

impl MemoryKey {
    pub fn new(table: &str, request: &LoadRequest) -> CacheResult<Self> {
        Ok(Self {
            table: table.to_string(),
            digest: compute_hash(request)?,
        })
    }
}

/// Shape of the latest load of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableLoadStats {
    pub rows_loaded: usize,
    pub columns_loaded: usize,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub hits: u64,
    pub misses: u64,
    /// Artifacts materialized from source files.
    pub conversions: u64,
    pub memory_entries: usize,
    pub tables: BTreeMap<String, TableLoadStats>,
}

/// Where a registered table comes from.
#[derive(Debug, Clone)]
struct TableSource {
    path: PathBuf,
    columns: Vec<String>,
    error: Option<String>,
}

/// Loads tables through the artifact and memory layers.
pub struct CacheManager {
    settings: CacheSettings,
    artifact_dir: PathBuf,
    sources: DashMap<String, TableSource>,
    memory: DashMap<MemoryKey, DataFrame>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    table_stats: DashMap<String, TableLoadStats>,
    hits: AtomicU64,
    misses: AtomicU64,
    conversions: AtomicU64,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("artifact_dir", &self.artifact_dir)
            .field("tables", &self.sources.len())
            .field("memory_entries", &self.memory.len())
            .finish()
    }
}

impl CacheManager {
    /// Create a manager writing artifacts under `artifact_dir`.
    pub fn new(artifact_dir: impl Into<PathBuf>, settings: CacheSettings) -> Self {
        Self {
            settings,
            artifact_dir: artifact_dir.into(),
            sources: DashMap::new(),
            memory: DashMap::new(),
            locks: DashMap::new(),
            table_stats: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            conversions: AtomicU64::new(0),
        }
    }

    /// Create a manager from settings.
    ///
    /// Uses `settings.dir` when set, else `~/.schemalens/artifacts`.
    pub fn from_settings(settings: &CacheSettings) -> CacheResult<Self> {
        let dir = match settings.resolved_dir()? {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or(CacheError::NoCacheDir)?
                .join(".schemalens")
                .join("artifacts"),
        };
        Ok(Self::new(dir, settings.clone()))
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Replace the known tables with a fresh scan, dropping memory entries.
    pub fn register(&self, profiles: &ProfileSet) {
        self.sources.clear();
        for profile in profiles {
            self.sources.insert(
                profile.name.clone(),
                TableSource {
                    path: profile.file_path.clone(),
                    columns: profile.columns.clone(),
                    error: profile.error.clone(),
                },
            );
        }
        self.memory.clear();
        tracing::debug!(tables = profiles.len(), "Cache sources registered");
    }

    pub fn is_registered(&self, table: &str) -> bool {
        self.sources.contains_key(table)
    }

    /// Load `table` as described by `request`.
    ///
    /// Returns an independent frame; the cached copy is never exposed.
    pub fn load(&self, table: &str, request: &LoadRequest) -> CacheResult<DataFrame> {
        let source = self.source(table)?;
        let key = MemoryKey::new(table, request)?;

        if let Some(hit) = self.memory.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let df = hit.value().clone();
            self.record(table, &df);
            return Ok(df);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        if let Some(columns) = &request.columns {
            let unknown: Vec<String> = columns
                .iter()
                .filter(|c| !source.columns.contains(c))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(CacheError::UnknownColumns {
                    table: table.to_string(),
                    columns: unknown,
                });
            }
        }

        let path = self.ensure_artifact(table, &source, request.mode)?;
        let mut df = artifact::read(&path, request.columns.as_deref())?;
        if !request.filters.is_empty() {
            df = apply_filters(df, &request.filters, table)?;
        }

        self.memory.insert(key, df.clone());
        self.record(table, &df);
        tracing::debug!(
            table,
            mode = ?request.mode,
            rows = df.height(),
            columns = df.width(),
            "Table loaded"
        );
        Ok(df)
    }

    /// Warm the memory layer with `rows`-row samples of `tables`.
    ///
    /// Failures are logged and skipped. Returns the number of tables loaded.
    pub fn preload(&self, tables: &[&str], rows: usize) -> usize {
        let request = LoadRequest::sample(rows);
        tables
            .iter()
            .filter(|table| match self.load(table, &request) {
                Ok(_) => true,
                Err(error) => {
                    tracing::warn!(table = **table, %error, "Preload failed");
                    false
                }
            })
            .count()
    }

    /// Drop memory entries, for every table or only `table`. Artifacts stay.
    pub fn clear(&self, table: Option<&str>) {
        match table {
            Some(table) => self.memory.retain(|key, _| key.table != table),
            None => self.memory.clear(),
        }
    }

    /// Delete on-disk artifacts, for every table or only `table`.
    ///
    /// Matching memory entries are dropped too. Returns the number of files removed.
    pub fn purge_artifacts(&self, table: Option<&str>) -> CacheResult<usize> {
        self.clear(table);
        let removed = artifact::purge(&self.artifact_dir, table)?;
        tracing::info!(table = table.unwrap_or("*"), removed, "Artifacts purged");
        Ok(removed)
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            conversions: self.conversions.load(Ordering::Relaxed),
            memory_entries: self.memory.len(),
            tables: self
                .table_stats
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }

    /// Path of the artifact `table` would use for `mode`.
    pub fn artifact_path(&self, table: &str, mode: LoadMode) -> PathBuf {
        self.artifact_dir
            .join(artifact_file_name(table, mode, self.settings.sample_seed))
    }

    fn source(&self, table: &str) -> CacheResult<TableSource> {
        let source = self
            .sources
            .get(table)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CacheError::NotFound {
                table: table.to_string(),
            })?;
        if let Some(reason) = &source.error {
            return Err(CacheError::Unavailable {
                table: table.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(source)
    }

    fn ensure_artifact(
        &self,
        table: &str,
        source: &TableSource,
        mode: LoadMode,
    ) -> CacheResult<PathBuf> {
        let path = self.artifact_path(table, mode);
        let validity = self.settings.validity;
        if is_fresh(&path, &source.path, validity) {
            return Ok(path);
        }

        let lock = self
            .locks
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another caller may have finished the conversion while we waited.
        if is_fresh(&path, &source.path, validity) {
            return Ok(path);
        }

        let raw = match mode {
            LoadMode::Full => read_full(&source.path, self.settings.chunk_size)?,
            LoadMode::Sample(rows) => draw_sample(
                &source.path,
                &SamplePlan {
                    size: rows,
                    seed: self.settings.sample_seed,
                    oversample: self.settings.sample_oversample,
                    large_threshold: self.settings.large_sample_threshold,
                    chunk_size: self.settings.chunk_size,
                },
            )?,
        };
        let mut df = narrow_frame(&raw).map_err(|e| CacheError::conversion(&source.path, e))?;

        artifact::write_atomic(&mut df, &path)
            .map_err(|e| CacheError::conversion(&source.path, e))?;
        self.conversions.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            table,
            mode = ?mode,
            rows = df.height(),
            artifact = %path.display(),
            "Artifact written"
        );
        Ok(path)
    }

    fn record(&self, table: &str, df: &DataFrame) {
        self.table_stats.insert(
            table.to_string(),
            TableLoadStats {
                rows_loaded: df.height(),
                columns_loaded: df.width(),
            },
        );
    }
}
