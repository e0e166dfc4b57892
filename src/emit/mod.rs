//! Code emission.
//!
//! Walks the transformed symbol sequence and renders target-language
//! source text. The emitter never guesses a type: reaching an unresolved
//! reference is fatal.

pub mod csharp;
pub mod writer;

pub use csharp::CSharpGenerator;
pub use writer::CodeWriter;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::SourceLoc;

/// Emission failure. Aborts the run; partial output is discarded.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum EmissionError {
    #[error("unresolved type `{type_name}` referenced by `{symbol}` ({loc})")]
    #[diagnostic(
        code(gangway::emit::unresolved_type),
        help("Declare the type in a parsed header, or leave it behind a pointer so it can be \
              bound as an opaque handle")
    )]
    UnresolvedType {
        symbol: String,
        type_name: String,
        loc: SourceLoc,
    },

    #[error("typedef cycle involving `{name}` ({loc})")]
    #[diagnostic(code(gangway::emit::typedef_cycle))]
    TypedefCycle { name: String, loc: SourceLoc },

    #[error("struct definitions form a by-value cycle: {names}")]
    #[diagnostic(
        code(gangway::emit::struct_cycle),
        help("A by-value cycle cannot exist in valid C; check the parsed field types")
    )]
    StructCycle { names: String },
}
