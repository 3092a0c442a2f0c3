//! Source file discovery.

use std::path::{Path, PathBuf};

use super::{ScanError, ScanResult};

/// Extensions recognized as tabular sources (compared case-insensitively).
pub const TABLE_EXTENSIONS: &[&str] = &["csv"];

/// A source file and the table name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub name: String,
    pub path: PathBuf,
}

/// List recognized table files in `dir`, sorted by file name.
///
/// Subdirectories are not descended into.
pub fn discover_tables(dir: &Path) -> ScanResult<Vec<TableFile>> {
    if !dir.is_dir() {
        return Err(ScanError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ScanError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_table_file(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push(TableFile {
                name: stem.to_string(),
                path,
            });
        }
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

fn is_table_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TABLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
