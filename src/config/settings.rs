//! TOML-based configuration for schemalens.
//!
//! Supports a config file (`schemalens.toml`) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [scan]
//! sample_size = 1000
//! max_tables = 50
//!
//! [cache]
//! dir = "${HOME}/.schemalens/artifacts"
//! chunk_size = 100000
//! sample_seed = 42
//! validity = "source_modified"
//!
//! [mining]
//! data_pattern_max_rows = 100000
//!
//! [graph]
//! min_confidence = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the config file looked up by [`Settings::discover`].
pub const CONFIG_FILE_NAME: &str = "schemalens.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Table scanning.
    pub scan: ScanSettings,

    /// Columnar cache.
    pub cache: CacheSettings,

    /// Relationship mining.
    pub mining: MiningSettings,

    /// Relationship graph.
    pub graph: GraphSettings,
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Rows read per table to compute null rates and distinct counts.
    pub sample_size: usize,

    /// Maximum number of files profiled in one pass.
    pub max_tables: Option<usize>,

    /// Rows read when probing the header.
    pub header_probe_rows: usize,

    /// Records kept on each profile for display.
    pub preview_rows: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            max_tables: Some(50),
            header_probe_rows: 10,
            preview_rows: 10,
        }
    }
}

/// When an on-disk artifact is considered stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheValidity {
    /// Artifacts stay valid until explicitly purged.
    #[default]
    Trust,
    /// Artifacts older than their source file are rebuilt.
    SourceModified,
}

/// Cache manager configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Artifact directory (supports `${ENV_VAR}` expansion).
    /// Defaults to `~/.schemalens/artifacts`.
    pub dir: Option<String>,

    /// Rows per chunk when streaming a source file.
    pub chunk_size: usize,

    /// Seed for every random sample.
    pub sample_seed: u64,

    /// Small samples read `n * sample_oversample` rows before drawing.
    pub sample_oversample: usize,

    /// Samples above this size are drawn chunk by chunk.
    pub large_sample_threshold: usize,

    /// Artifact staleness policy.
    pub validity: CacheValidity,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            chunk_size: 100_000,
            sample_seed: 42,
            sample_oversample: 3,
            large_sample_threshold: 100_000,
            validity: CacheValidity::Trust,
        }
    }
}

impl CacheSettings {
    /// Resolve the artifact directory, expanding environment variables.
    pub fn resolved_dir(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.dir
            .as_deref()
            .map(|dir| expand_env_vars(dir).map(PathBuf::from))
            .transpose()
    }
}

/// Relationship miner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MiningSettings {
    /// Tables at or above this row count are skipped by the data-pattern detector.
    pub data_pattern_max_rows: u64,

    /// At most this many small tables are compared pairwise.
    pub data_pattern_max_tables: usize,
}

impl Default for MiningSettings {
    fn default() -> Self {
        Self {
            data_pattern_max_rows: 100_000,
            data_pattern_max_tables: 50,
        }
    }
}

/// Relationship graph configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Default confidence floor for graph edges.
    pub min_confidence: f64,

    /// Maximum number of indirect join paths returned.
    pub indirect_path_cap: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            indirect_path_cap: 10,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMALENS_CONFIG`
    /// 2. `./schemalens.toml`
    /// 3. `~/.config/schemalens/config.toml`
    pub fn discover() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCHEMALENS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schemalens").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.scan.sample_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "scan.sample_size must be greater than zero".to_string(),
            ));
        }
        if self.scan.header_probe_rows == 0 {
            return Err(SettingsError::InvalidConfig(
                "scan.header_probe_rows must be greater than zero".to_string(),
            ));
        }
        if self.cache.chunk_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "cache.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.cache.sample_oversample == 0 {
            return Err(SettingsError::InvalidConfig(
                "cache.sample_oversample must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.graph.min_confidence) {
            return Err(SettingsError::InvalidConfig(format!(
                "graph.min_confidence must be within [0, 1], got {}",
                self.graph.min_confidence
            )));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Lone `$`
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
