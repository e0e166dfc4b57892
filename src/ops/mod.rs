//! High-level operations.
//!
//! This module contains the implementation of gangway commands.

pub mod generate;

pub use generate::{build_symbols, check, generate, GenerateError, GenerateOutcome};
