//! gangway - A C header binding generator for managed languages
//!
//! This crate provides the core library functionality for gangway:
//! parsing C headers into an immutable declaration model, transforming
//! names and marshalling through an ordered rule pipeline, and emitting
//! bindings bound to a named native library.

pub mod core;
pub mod emit;
pub mod ops;
pub mod parser;
pub mod transform;
pub mod util;

pub use crate::core::{
    ctype::CType, declaration::Declaration, options::GenerateOptions, symbol::TransformedSymbol,
};
pub use crate::ops::{generate, GenerateError, GenerateOutcome};
pub use crate::parser::HeaderParser;
