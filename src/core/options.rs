//! Generation options and their validation.
//!
//! Everything the pipeline needs is collected here up front so that bad
//! configuration is rejected before any parsing starts.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How C `bool` values cross the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolMarshal {
    /// Single byte (C `_Bool`)
    #[default]
    Byte,
    /// 32-bit integer (Win32 `BOOL`)
    Int,
}

impl std::str::FromStr for BoolMarshal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byte" => Ok(BoolMarshal::Byte),
            "int" => Ok(BoolMarshal::Int),
            other => Err(format!("expected `byte` or `int`, got `{}`", other)),
        }
    }
}

/// How C strings cross the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringMarshal {
    /// Null-terminated UTF-8
    #[default]
    Utf8,
    /// Null-terminated UTF-16
    Utf16,
}

impl std::str::FromStr for StringMarshal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utf8" => Ok(StringMarshal::Utf8),
            "utf16" => Ok(StringMarshal::Utf16),
            other => Err(format!("expected `utf8` or `utf16`, got `{}`", other)),
        }
    }
}

/// Options for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directories searched recursively for headers
    pub header_dirs: Vec<PathBuf>,

    /// Header file extension (without the dot)
    pub extension: String,

    /// Additional include search directories, recorded for diagnostics
    pub include_dirs: Vec<PathBuf>,

    /// Preprocessor defines, `NAME` or `NAME=VALUE`
    pub defines: Vec<String>,

    /// Output namespace
    pub namespace: String,

    /// Native library the emitted functions bind to; also names the
    /// output file
    pub library: String,

    /// Name of the static class holding functions and constants
    pub class: String,

    /// Boolean marshalling strategy
    pub bool_marshal: BoolMarshal,

    /// String marshalling strategy
    pub string_marshal: StringMarshal,

    /// Emit fixed-size inline buffers for array fields
    pub fixed_size_buffers: bool,

    /// Treat unknown types referenced only behind pointers as opaque
    /// handles instead of failing emission
    pub detect_opaque_pointers: bool,

    /// Output root directory
    pub output_dir: PathBuf,

    /// Report what would be written without writing it
    pub dry_run: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            header_dirs: Vec::new(),
            extension: "h".to_string(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
            namespace: String::new(),
            library: String::new(),
            class: "Native".to_string(),
            bool_marshal: BoolMarshal::Byte,
            string_marshal: StringMarshal::Utf8,
            fixed_size_buffers: true,
            detect_opaque_pointers: true,
            output_dir: PathBuf::from("bindings"),
            dry_run: false,
        }
    }
}

impl GenerateOptions {
    /// Validate the options. Called before any file is opened.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.header_dirs.is_empty() {
            return Err(ConfigurationError::NoInputDirectories);
        }

        let valid_dirs: Vec<_> = self.header_dirs.iter().filter(|d| d.is_dir()).collect();
        if valid_dirs.is_empty() {
            return Err(ConfigurationError::NoValidDirectories {
                dirs: self
                    .header_dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        check_identifier("namespace", &self.namespace)?;
        check_identifier("library", &self.library)?;
        check_identifier("class", &self.class)?;

        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ConfigurationError::InvalidExtension {
                value: self.extension.clone(),
            });
        }

        for define in &self.defines {
            let name = define.split_once('=').map(|(n, _)| n).unwrap_or(define.as_str());
            if name.is_empty() || !is_identifier(name) {
                return Err(ConfigurationError::InvalidDefine {
                    value: define.clone(),
                });
            }
        }

        Ok(())
    }

    /// The header directories that actually exist.
    pub fn valid_header_dirs(&self) -> Vec<PathBuf> {
        self.header_dirs
            .iter()
            .filter(|d| d.is_dir())
            .cloned()
            .collect()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn check_identifier(what: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.is_empty() || !is_identifier(value) {
        return Err(ConfigurationError::InvalidIdentifier {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Invalid or contradictory configuration, reported before parsing.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigurationError {
    #[error("no input directories given")]
    #[diagnostic(
        code(gangway::config::no_input),
        help("Pass one or more header directories, or set [input] directories in gangway.toml")
    )]
    NoInputDirectories,

    #[error("none of the input directories exist: {dirs}")]
    #[diagnostic(code(gangway::config::no_valid_dirs))]
    NoValidDirectories { dirs: String },

    #[error("no `.{extension}` files found under {dirs}")]
    #[diagnostic(
        code(gangway::config::no_headers),
        help("Check the directories and the --extension value")
    )]
    NoHeadersFound { dirs: String, extension: String },

    #[error("invalid {what}: `{value}` is not a valid identifier")]
    #[diagnostic(code(gangway::config::invalid_identifier))]
    InvalidIdentifier { what: &'static str, value: String },

    #[error("invalid header extension `{value}`")]
    #[diagnostic(
        code(gangway::config::invalid_extension),
        help("Pass the extension without a leading dot, e.g. `h`")
    )]
    InvalidExtension { value: String },

    #[error("invalid define `{value}`")]
    #[diagnostic(
        code(gangway::config::invalid_define),
        help("Defines are `NAME` or `NAME=VALUE` with an identifier name")
    )]
    InvalidDefine { value: String },
}
