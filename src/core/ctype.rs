//! C type representation.
//!
//! `CType` captures the shape of a declared C type as it matters for
//! binding generation: width, signedness, indirection, and references to
//! named declarations. Named references stay unresolved here; a later
//! resolution pass classifies them (see `transform::resolve`).

use serde::{Deserialize, Serialize};

/// C type representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CType {
    /// Void type
    Void,

    /// Signed integer types
    Int8,
    Int16,
    Int32,
    Int64,

    /// Unsigned integer types
    UInt8,
    UInt16,
    UInt32,
    UInt64,

    /// Floating point types
    Float,
    Double,

    /// Boolean
    Bool,

    /// Character types
    Char,
    UChar,
    WChar,

    /// Size types
    Size,
    SSize,
    PtrDiff,

    /// Pointer to another type
    Pointer(Box<CType>),

    /// Const pointer
    ConstPointer(Box<CType>),

    /// Fixed-size array
    Array(Box<CType>, usize),

    /// Reference to a declaration by name, resolved later
    Named(String),

    /// Function pointer
    FunctionPointer {
        return_type: Box<CType>,
        param_types: Vec<CType>,
    },
}

impl CType {
    /// Parse a C type string.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        // Handle pointers
        if let Some(inner) = s.strip_suffix('*') {
            let inner = inner.trim();
            if let Some(stripped) = inner.strip_prefix("const ") {
                return CType::ConstPointer(Box::new(CType::parse(stripped)));
            }
            return CType::Pointer(Box::new(CType::parse(inner)));
        }

        // Handle const prefix
        let s = s.strip_prefix("const ").unwrap_or(s);
        let s = s.strip_suffix(" const").unwrap_or(s).trim();

        // Handle unsigned prefix
        let (is_unsigned, s) = if let Some(stripped) = s.strip_prefix("unsigned") {
            (true, stripped.trim_start())
        } else {
            (false, s)
        };

        // Handle signed prefix (usually explicit)
        let s = s.strip_prefix("signed").map(str::trim_start).unwrap_or(s);

        // "unsigned" / "signed" alone means int
        let s = if s.is_empty() { "int" } else { s };

        match s {
            "void" => CType::Void,
            "bool" | "_Bool" => CType::Bool,
            "char" if is_unsigned => CType::UChar,
            "char" => CType::Char,
            "wchar_t" => CType::WChar,
            "short" | "short int" if is_unsigned => CType::UInt16,
            "short" | "short int" => CType::Int16,
            "int" if is_unsigned => CType::UInt32,
            "int" => CType::Int32,
            "long" | "long int" if is_unsigned => {
                // long is platform-dependent, assume 64-bit on modern systems
                CType::UInt64
            }
            "long" | "long int" => CType::Int64,
            "long long" | "long long int" if is_unsigned => CType::UInt64,
            "long long" | "long long int" => CType::Int64,
            "float" => CType::Float,
            "double" => CType::Double,
            "long double" => CType::Double, // Simplified - long double is complex

            // Fixed-width types
            "int8_t" | "__int8" => CType::Int8,
            "int16_t" | "__int16" => CType::Int16,
            "int32_t" | "__int32" => CType::Int32,
            "int64_t" | "__int64" => CType::Int64,
            "uint8_t" => CType::UInt8,
            "uint16_t" => CType::UInt16,
            "uint32_t" => CType::UInt32,
            "uint64_t" => CType::UInt64,

            // Size types
            "size_t" => CType::Size,
            "ssize_t" => CType::SSize,
            "ptrdiff_t" => CType::PtrDiff,
            "intptr_t" => CType::SSize,
            "uintptr_t" => CType::Size,

            // Named types
            other => {
                let other = other
                    .strip_prefix("struct ")
                    .or_else(|| other.strip_prefix("enum "))
                    .or_else(|| other.strip_prefix("union "))
                    .unwrap_or(other);
                CType::Named(other.trim().to_string())
            }
        }
    }

    /// Check if this is a pointer type.
    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer(_) | CType::ConstPointer(_))
    }

    /// Check if this is a void type.
    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    /// Check if this is `char*` or `const char*`.
    pub fn is_char_pointer(&self) -> bool {
        match self {
            CType::Pointer(inner) | CType::ConstPointer(inner) => {
                matches!(**inner, CType::Char)
            }
            _ => false,
        }
    }

    /// The type directly behind one level of indirection, if any.
    pub fn pointee(&self) -> Option<&CType> {
        match self {
            CType::Pointer(inner) | CType::ConstPointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Walk the type shape, reporting every named reference together with
    /// whether it sits behind a pointer.
    pub fn visit_named(&self, behind_pointer: bool, f: &mut impl FnMut(&str, bool)) {
        match self {
            CType::Named(name) => f(name, behind_pointer),
            CType::Pointer(inner) | CType::ConstPointer(inner) => {
                inner.visit_named(true, f);
            }
            CType::Array(inner, _) => inner.visit_named(behind_pointer, f),
            CType::FunctionPointer {
                return_type,
                param_types,
            } => {
                return_type.visit_named(true, f);
                for p in param_types {
                    p.visit_named(true, f);
                }
            }
            _ => {}
        }
    }
}
