//! SQLite-backed profile store.
//!
//! Persists the [`ProfileSet`] of a scanned directory so a later session can
//! reuse it without rescanning. Stored at `~/.schemalens/profiles.db`.
//!
//! # Design
//!
//! - One row per table, JSON profile, keyed by a digest of the directory path
//! - No TTL; entries live until replaced or deleted
//! - Versioned; a schema version mismatch clears every entry

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::hash::compute_hash;
use super::{CacheError, CacheResult};
use crate::scan::{ProfileSet, TableProfile};

/// Current store schema version. Bump when the profile format changes.
const STORE_VERSION: i32 = 1;

/// Persistent store of scanned profile sets.
pub struct ProfileStore {
    conn: Connection,
}

/// Entry counts for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub directories: usize,
    pub tables: usize,
}

impl ProfileStore {
    /// Open or create the store at the default location.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Open or create the store at `path`.
    pub fn open_at(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init()?;
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> CacheResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn default_path() -> CacheResult<PathBuf> {
        let base = dirs::home_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join(".schemalens").join("profiles.db"))
    }

    fn init(&self) -> CacheResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                dir_key TEXT NOT NULL,
                table_name TEXT NOT NULL,
                profile TEXT NOT NULL,
                PRIMARY KEY (dir_key, table_name)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                row.get(0)
            })
            .optional()?;

        match stored_version.and_then(|v| v.parse::<i32>().ok()) {
            Some(v) if v == STORE_VERSION => {}
            Some(_) => {
                self.clear_all()?;
                self.set_version()?;
            }
            None => self.set_version()?,
        }
        Ok(())
    }

    fn set_version(&self) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![STORE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Key for a scanned directory.
    pub fn dir_key(dir: &Path) -> CacheResult<String> {
        let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        Ok(compute_hash(&canonical.to_string_lossy())?)
    }

    /// Replace the stored set for `dir`.
    pub fn save(&mut self, dir: &Path, profiles: &ProfileSet) -> CacheResult<()> {
        let key = Self::dir_key(dir)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM profiles WHERE dir_key = ?", params![key])?;
        for profile in profiles {
            let json = serde_json::to_string(profile)?;
            tx.execute(
                "INSERT INTO profiles (dir_key, table_name, profile) VALUES (?, ?, ?)",
                params![key, profile.name, json],
            )?;
        }
        tx.commit()?;
        tracing::debug!(dir = %dir.display(), tables = profiles.len(), "Profiles stored");
        Ok(())
    }

    /// Load the stored set for `dir`, if one was saved.
    pub fn load(&self, dir: &Path) -> CacheResult<Option<ProfileSet>> {
        let key = Self::dir_key(dir)?;
        let mut stmt = self
            .conn
            .prepare("SELECT profile FROM profiles WHERE dir_key = ? ORDER BY table_name")?;
        let rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }
        let profiles = rows
            .iter()
            .map(|json| serde_json::from_str::<TableProfile>(json))
            .collect::<Result<ProfileSet, _>>()?;
        Ok(Some(profiles))
    }

    /// Remove the stored set for `dir`. Returns true if anything was deleted.
    pub fn delete(&self, dir: &Path) -> CacheResult<bool> {
        let key = Self::dir_key(dir)?;
        let rows = self
            .conn
            .execute("DELETE FROM profiles WHERE dir_key = ?", params![key])?;
        Ok(rows > 0)
    }

    pub fn clear_all(&self) -> CacheResult<()> {
        self.conn.execute("DELETE FROM profiles", [])?;
        Ok(())
    }

    pub fn stats(&self) -> CacheResult<StoreStats> {
        let (directories, tables): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(DISTINCT dir_key), COUNT(*) FROM profiles",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreStats {
            directories: directories as usize,
            tables: tables as usize,
        })
    }
}
