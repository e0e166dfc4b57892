//! The parsed declaration model.
//!
//! One `Declaration` per top-level C construct. Declarations are immutable
//! once parsed: the transform pass clones and decorates them, it never
//! edits the parse result in place, so the same parse can be re-run
//! through different rule lists.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ctype::CType;

/// Where a declaration was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    /// Source file path
    pub file: PathBuf,
    /// 1-based line of the declaration start
    pub line: u32,
}

impl SourceLoc {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        SourceLoc {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// One parsed top-level C construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Enum(EnumDecl),
    Struct(StructDecl),
    Function(FunctionDecl),
    Typedef(TypedefDecl),
    Constant(ConstantDecl),
}

impl Declaration {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Enum(d) => &d.name,
            Declaration::Struct(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::Typedef(d) => &d.name,
            Declaration::Constant(d) => &d.name,
        }
    }

    /// Source location of the declaration.
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Declaration::Enum(d) => &d.loc,
            Declaration::Struct(d) => &d.loc,
            Declaration::Function(d) => &d.loc,
            Declaration::Typedef(d) => &d.loc,
            Declaration::Constant(d) => &d.loc,
        }
    }

    /// Human-readable construct kind, for diagnostics.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Declaration::Enum(_) => "enum",
            Declaration::Struct(_) => "struct",
            Declaration::Function(_) => "function",
            Declaration::Typedef(_) => "typedef",
            Declaration::Constant(_) => "constant",
        }
    }

    /// Shape equality, ignoring where the declaration came from.
    ///
    /// Two declarations of the same name with equal shape are the same
    /// declaration seen through different files and merge to one; equal
    /// name with differing shape is a hard parse failure.
    pub fn same_shape(&self, other: &Declaration) -> bool {
        match (self, other) {
            (Declaration::Enum(a), Declaration::Enum(b)) => {
                a.name == b.name && a.members == b.members
            }
            (Declaration::Struct(a), Declaration::Struct(b)) => {
                a.name == b.name && a.fields == b.fields && a.packed == b.packed
            }
            (Declaration::Function(a), Declaration::Function(b)) => {
                a.name == b.name
                    && a.return_type == b.return_type
                    && a.params == b.params
                    && a.calling_convention == b.calling_convention
                    && a.variadic == b.variadic
            }
            (Declaration::Typedef(a), Declaration::Typedef(b)) => {
                a.name == b.name && a.underlying == b.underlying
            }
            (Declaration::Constant(a), Declaration::Constant(b)) => {
                a.name == b.name && a.value == b.value
            }
            _ => false,
        }
    }
}

/// A C enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    /// Enum name
    pub name: String,

    /// Members in declaration order
    pub members: Vec<EnumMember>,

    /// Source location
    pub loc: SourceLoc,
}

/// An enum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Member name
    pub name: String,

    /// Value exactly as spelled in the header (None when implicit)
    pub value_text: Option<String>,

    /// Parsed value when the text is a plain integer literal
    pub value: Option<i64>,
}

impl EnumMember {
    /// Create a member with an explicit textual value.
    pub fn new(name: impl Into<String>, value_text: Option<String>) -> Self {
        let value = value_text.as_deref().and_then(parse_int_literal);
        EnumMember {
            name: name.into(),
            value_text,
            value,
        }
    }
}

/// Parse a C integer literal (decimal or hex, optional sign and suffix).
pub fn parse_int_literal(s: &str) -> Option<i64> {
    let s = s.trim();
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, s),
    };
    let s = s
        .trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'))
        .trim();
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        s.parse().ok()?
    };
    Some(if neg { -value } else { value })
}

/// A C structure definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDecl {
    /// Struct name
    pub name: String,

    /// Fields in declaration order; order is binary layout and must
    /// never be changed downstream
    pub fields: Vec<Field>,

    /// Whether this is a packed struct
    pub packed: bool,

    /// Source location
    pub loc: SourceLoc,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Field type (fixed-size arrays are `CType::Array`)
    pub ty: CType,

    /// Bit width for bitfields (None for regular fields)
    pub bit_width: Option<u32>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: CType) -> Self {
        Field {
            name: name.into(),
            ty,
            bit_width: None,
        }
    }
}

/// A C function declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,

    /// Return type
    pub return_type: CType,

    /// Parameters in declaration order
    pub params: Vec<Param>,

    /// Calling convention
    pub calling_convention: CallingConvention,

    /// Whether this is a variadic function
    pub variadic: bool,

    /// Source location
    pub loc: SourceLoc,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name (may be empty for unnamed params)
    pub name: String,

    /// Parameter type
    pub ty: CType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: CType) -> Self {
        Param {
            name: name.into(),
            ty,
        }
    }
}

/// Calling conventions for FFI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    /// C calling convention (default)
    #[default]
    Cdecl,
    /// Windows stdcall
    Stdcall,
    /// Windows fastcall
    Fastcall,
}

/// A C typedef.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefDecl {
    /// Alias name
    pub name: String,

    /// Underlying type
    pub underlying: CType,

    /// Source location
    pub loc: SourceLoc,
}

/// A C constant (from an object-like `#define`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantDecl {
    /// Constant name
    pub name: String,

    /// Value exactly as spelled in the header
    pub value: String,

    /// Inferred type (if possible)
    pub ty: Option<CType>,

    /// Source location
    pub loc: SourceLoc,
}
