//! Configuration module for schemalens.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CacheSettings, CacheValidity, GraphSettings, MiningSettings, ScanSettings,
    Settings, SettingsError, CONFIG_FILE_NAME,
};
