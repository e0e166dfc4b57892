//! The end-to-end generation operation.
//!
//! discover -> parse (parallel) -> merge -> resolve -> transform -> emit
//! -> atomic commit. The run either completes or fails fast with every
//! collected error; partial output is never written to the final
//! location.

use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;

use crate::core::{ConfigurationError, GenerateOptions, TransformedSymbol};
use crate::emit::{CSharpGenerator, EmissionError};
use crate::parser::{merge_units, DefineSet, HeaderParser, ParseError};
use crate::transform::{
    default_rules, resolve, transform, CollisionError, ResolutionMap, RuleContext,
};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{discover_headers, write_atomic};

/// Any failure of the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error(transparent)]
    Collision(#[from] CollisionError),

    #[error(transparent)]
    Emission(#[from] EmissionError),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl GenerateError {
    /// Render the full structured diagnostic list for this failure.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            GenerateError::Config(e) => {
                let mut diag = Diagnostic::error(e.to_string());
                if matches!(e, ConfigurationError::NoHeadersFound { .. }) {
                    diag = diag.with_suggestion(suggestions::NO_HEADERS);
                }
                vec![diag]
            }
            GenerateError::Parse(errors) => errors
                .iter()
                .map(|e| {
                    Diagnostic::error(e.to_string())
                        .with_location(e.file())
                        .with_suggestion(suggestions::PLATFORM_DEFINES)
                })
                .collect(),
            GenerateError::Collision(e) => {
                vec![Diagnostic::error(e.to_string()).with_suggestion(suggestions::COLLISION)]
            }
            GenerateError::Emission(e) => vec![Diagnostic::error(e.to_string())],
            GenerateError::Io(e) => vec![Diagnostic::error(format!("{:#}", e))],
        }
    }
}

/// Result of a successful generation run.
#[derive(Debug)]
pub struct GenerateOutcome {
    /// Files written (or that would be written under `--dry-run`)
    pub files: Vec<PathBuf>,

    /// Headers parsed
    pub header_count: usize,

    /// Symbols emitted
    pub symbol_count: usize,
}

/// Run the pipeline up to and including the transform pass.
///
/// Shared by `generate` and `check`; everything before emission.
pub fn build_symbols(
    options: &GenerateOptions,
) -> Result<(Vec<TransformedSymbol>, ResolutionMap, usize), GenerateError> {
    options.validate()?;

    let dirs = options.valid_header_dirs();
    let headers = discover_headers(&dirs, &options.extension)?;
    if headers.is_empty() {
        return Err(ConfigurationError::NoHeadersFound {
            dirs: dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            extension: options.extension.clone(),
        }
        .into());
    }
    tracing::info!("parsing {} header file(s)", headers.len());

    let defines = DefineSet::from_args(&options.defines);
    let parser = HeaderParser::new();

    // One task per file, no shared mutable state; the merge below is
    // order-insensitive, so thread interleaving cannot change the result.
    let results: Vec<_> = headers
        .par_iter()
        .map(|path| parser.parse_file(path, &defines))
        .collect();

    let mut units = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(unit) => units.push(unit),
            Err(e) => errors.push(e),
        }
    }
    // Report every file's failure together, not just the first.
    if !errors.is_empty() {
        return Err(GenerateError::Parse(errors));
    }

    let merged = merge_units(units).map_err(GenerateError::Parse)?;
    tracing::debug!("merged into {} declarations", merged.len());

    let resolution = resolve(&merged, options.detect_opaque_pointers);

    let cx = RuleContext { options };
    let symbols = transform(&merged, &default_rules(), &cx)?;

    Ok((symbols, resolution, headers.len()))
}

/// Parse, transform, and emit bindings, committing output atomically.
pub fn generate(options: &GenerateOptions) -> Result<GenerateOutcome, GenerateError> {
    let (symbols, resolution, header_count) = build_symbols(options)?;

    let generator = CSharpGenerator::new(options, &resolution);
    let text = generator.generate(&symbols)?;

    let out_path = options.output_dir.join(generator.output_file_name());
    if options.dry_run {
        tracing::info!("[dry-run] would write {}", out_path.display());
    } else {
        write_atomic(&out_path, &text)?;
        tracing::info!("wrote {}", out_path.display());
    }

    Ok(GenerateOutcome {
        files: vec![out_path],
        header_count,
        symbol_count: symbols.len(),
    })
}

/// Parse and transform without emitting; returns the symbols for
/// inspection.
pub fn check(options: &GenerateOptions) -> Result<Vec<TransformedSymbol>, GenerateError> {
    let (symbols, resolution, _) = build_symbols(options)?;

    // Emission-time failures (unresolved references, by-value cycles)
    // are part of what `check` checks; render and discard.
    let generator = CSharpGenerator::new(options, &resolution);
    generator.generate(&symbols)?;

    Ok(symbols)
}
