//! Configuration file support.
//!
//! A project may keep its generation settings in `gangway.toml` next to
//! the headers instead of repeating them on the command line. Values
//! given on the command line override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{BoolMarshal, StringMarshal};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "gangway.toml";

/// gangway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Input settings
    pub input: InputConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Marshalling settings
    pub marshal: MarshalConfig,
}

/// Header discovery and preprocessing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Directories searched recursively for headers
    pub directories: Vec<PathBuf>,

    /// Header extension without the dot (default `h`)
    pub extension: Option<String>,

    /// Preprocessor defines, `NAME` or `NAME=VALUE`
    pub defines: Vec<String>,

    /// Include search directories
    pub include_dirs: Vec<PathBuf>,
}

/// Output naming settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Target namespace
    pub namespace: Option<String>,

    /// Native library the bindings load
    pub library: Option<String>,

    /// Static class holding functions and constants
    pub class: Option<String>,

    /// Output root directory
    pub root: Option<PathBuf>,
}

/// Marshalling strategy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarshalConfig {
    /// Boolean strategy: `byte` or `int`
    #[serde(rename = "bool")]
    pub bool_marshal: Option<BoolMarshal>,

    /// String strategy: `utf8` or `utf16`
    #[serde(rename = "string")]
    pub string_marshal: Option<StringMarshal>,

    /// Emit fixed-size inline buffers for array fields
    pub fixed_size_buffers: Option<bool>,

    /// Treat pointer-only unknown types as opaque handles
    pub detect_opaque_pointers: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't
    /// exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}
