//! On-disk Parquet artifacts.
//!
//! Writes go to a uniquely named temp file in the artifact directory and are
//! renamed into place, so readers never observe a partial file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use uuid::Uuid;

use super::{CacheResult, LoadMode};
use crate::config::CacheValidity;

const EXTENSION: &str = "parquet";

/// File name of the artifact for `table` materialized under `mode`.
pub fn artifact_file_name(table: &str, mode: LoadMode, seed: u64) -> String {
    match mode {
        LoadMode::Full => format!("{table}.{EXTENSION}"),
        LoadMode::Sample(n) => format!("{table}.sample-{n}-seed-{seed}.{EXTENSION}"),
    }
}

/// True if `file_name` is one of `table`'s artifacts.
pub fn belongs_to(file_name: &str, table: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(table) else {
        return false;
    };
    rest == format!(".{EXTENSION}")
        || (rest.starts_with(".sample-") && rest.ends_with(&format!(".{EXTENSION}")))
}

/// Whether an existing artifact may be served for `source`.
///
/// Under [`CacheValidity::SourceModified`] both modification times are read
/// now, so edits made after the scan are seen. An unreadable time on either
/// side counts as stale.
pub fn is_fresh(artifact: &Path, source: &Path, validity: CacheValidity) -> bool {
    let Ok(meta) = fs::metadata(artifact) else {
        return false;
    };
    match validity {
        CacheValidity::Trust => true,
        CacheValidity::SourceModified => {
            let source_modified = fs::metadata(source).and_then(|m| m.modified());
            match (meta.modified(), source_modified) {
                (Ok(written), Ok(source)) => written >= source,
                _ => false,
            }
        }
    }
}

/// Write `df` to `path` atomically with Snappy compression.
pub fn write_atomic(df: &mut DataFrame, path: &Path) -> CacheResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp: PathBuf = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let written = write_then_rename(df, &tmp, path);
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_then_rename(df: &mut DataFrame, tmp: &Path, path: &Path) -> CacheResult<()> {
    let file = File::create(tmp)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Read an artifact, deserializing only `columns` when given.
pub fn read(path: &Path, columns: Option<&[String]>) -> CacheResult<DataFrame> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file)
        .with_columns(columns.map(<[String]>::to_vec))
        .finish()?;
    Ok(df)
}

/// Delete every artifact in `dir`, or only `table`'s. Returns the count removed.
pub fn purge(dir: &Path, table: Option<&str>) -> CacheResult<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let matches = match table {
            Some(table) => belongs_to(name, table),
            None => path.extension().is_some_and(|ext| ext == EXTENSION),
        };
        if matches && path.is_file() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
