//! Transformed symbols.
//!
//! A `TransformedSymbol` wraps a declaration with its final
//! target-language identifier and the marshalling metadata the emitter
//! consumes verbatim. Created once per declaration during the transform
//! pass and immutable afterward.

use serde::{Deserialize, Serialize};

use super::declaration::{Declaration, SourceLoc};

/// Marshalling strategy for one value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarshalAs {
    /// Boolean as a single byte
    BoolByte,
    /// Boolean as a 32-bit integer
    BoolInt,
    /// Null-terminated UTF-8 string
    StringUtf8,
    /// Null-terminated UTF-16 string
    StringUtf16,
    /// Fixed-size inline buffer of the given length
    FixedBuffer(usize),
}

/// Marshalling metadata for a whole symbol.
///
/// Slots align positionally with the declaration: `params` with the
/// function parameter list, `fields` with the struct field list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marshalling {
    /// Per-parameter hints, one slot per parameter
    pub params: Vec<Option<MarshalAs>>,

    /// Return value hint
    pub ret: Option<MarshalAs>,

    /// Per-field hints, one slot per field
    pub fields: Vec<Option<MarshalAs>>,
}

impl Marshalling {
    pub fn is_empty(&self) -> bool {
        self.ret.is_none()
            && self.params.iter().all(Option::is_none)
            && self.fields.iter().all(Option::is_none)
    }
}

/// A declaration decorated with its final identifier and marshalling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedSymbol {
    /// The name the declaration had in the header, before any rule ran
    pub source_name: String,

    /// Decorated copy of the declaration; carries the final identifier
    pub decl: Declaration,

    /// Marshalling metadata, used verbatim by the emitter
    pub marshal: Marshalling,
}

impl TransformedSymbol {
    /// Seed a symbol from a parsed declaration, before any rule runs.
    pub fn seed(decl: &Declaration) -> Self {
        TransformedSymbol {
            source_name: decl.name().to_string(),
            decl: decl.clone(),
            marshal: Marshalling::default(),
        }
    }

    /// The final target-language identifier.
    pub fn final_name(&self) -> &str {
        self.decl.name()
    }

    /// Source location of the underlying declaration.
    pub fn loc(&self) -> &SourceLoc {
        self.decl.loc()
    }
}
