//! Core data model: declarations, C types, options, transformed symbols.

pub mod ctype;
pub mod declaration;
pub mod options;
pub mod symbol;

pub use ctype::CType;
pub use declaration::{
    CallingConvention, ConstantDecl, Declaration, EnumDecl, EnumMember, Field, FunctionDecl,
    Param, SourceLoc, StructDecl, TypedefDecl,
};
pub use options::{BoolMarshal, ConfigurationError, GenerateOptions, StringMarshal};
pub use symbol::{MarshalAs, Marshalling, TransformedSymbol};
