//! C header parsing.
//!
//! The parser turns header files into `Declaration` sequences in three
//! steps: a conditional preprocessor driven by an explicit define set, a
//! regex-based declaration extractor, and an order-insensitive merge that
//! collapses duplicates across files.

pub mod header;
pub mod merge;
pub mod preprocess;

pub use header::{HeaderParser, ParsedUnit};
pub use merge::merge_units;
pub use preprocess::{preprocess, DefineSet};

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::SourceLoc;

/// A parse failure. Fatal for its file; parsing continues on other files
/// so all parse errors across the input set are reported together.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ParseError {
    #[error("{}:{}: {}", file.display(), line, message)]
    #[diagnostic(code(gangway::parse::directive))]
    Directive {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("{}:{}: unterminated {}", file.display(), line, construct)]
    #[diagnostic(code(gangway::parse::unterminated))]
    Unterminated {
        file: PathBuf,
        line: u32,
        construct: &'static str,
    },

    #[error("{}:{}: {}", file.display(), line, message)]
    #[diagnostic(code(gangway::parse::malformed))]
    Malformed {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("conflicting declarations of {kind} `{name}`: {first} and {second} disagree")]
    #[diagnostic(
        code(gangway::parse::duplicate_mismatch),
        help("Identical redeclarations merge; differing shapes are an input error")
    )]
    DuplicateMismatch {
        kind: &'static str,
        name: String,
        first: SourceLoc,
        second: SourceLoc,
    },

    #[error("failed to read {}", file.display())]
    #[diagnostic(code(gangway::parse::io))]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// The file this error belongs to, for grouping in reports.
    pub fn file(&self) -> &std::path::Path {
        match self {
            ParseError::Directive { file, .. }
            | ParseError::Unterminated { file, .. }
            | ParseError::Malformed { file, .. }
            | ParseError::Io { file, .. } => file,
            ParseError::DuplicateMismatch { second, .. } => &second.file,
        }
    }
}
