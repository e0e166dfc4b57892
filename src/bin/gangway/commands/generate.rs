//! `gangway generate` command
//!
//! Runs the full pipeline and commits the bindings atomically.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use gangway::core::GenerateOptions;
use gangway::ops;
use gangway::util::config::{Config, CONFIG_FILE_NAME};
use gangway::util::diagnostic;

use crate::cli::GenerateArgs;

pub fn execute(args: GenerateArgs, color: bool) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = merge_options(&args, &config);

    println!("Generating bindings...");
    println!("  Namespace: {}", options.namespace);
    println!("  Library:   {}", options.library);
    println!("  Output:    {}", options.output_dir.display());
    println!();

    match ops::generate(&options) {
        Ok(outcome) => {
            println!(
                "Parsed {} header file(s) into {} symbol(s).",
                outcome.header_count, outcome.symbol_count
            );
            for file in &outcome.files {
                if options.dry_run {
                    println!("[dry-run] Would write {}", file.display());
                } else {
                    println!("Wrote {}", file.display());
                }
            }
            Ok(())
        }
        Err(e) => {
            for diag in e.to_diagnostics() {
                diagnostic::emit(&diag, color);
            }
            Err(anyhow!("binding generation failed"))
        }
    }
}

/// Load the configuration file: an explicit path must exist, the
/// default location may be absent.
pub fn load_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            Config::load(path).with_context(|| format!("--config {}", path.display()))
        }
        None => Ok(Config::load_or_default(&PathBuf::from(CONFIG_FILE_NAME))),
    }
}

/// Command-line values override the configuration file.
fn merge_options(args: &GenerateArgs, config: &Config) -> GenerateOptions {
    let defaults = GenerateOptions::default();

    let mut defines = config.input.defines.clone();
    defines.extend(args.defines.iter().cloned());

    let mut include_dirs = config.input.include_dirs.clone();
    include_dirs.extend(args.include_dirs.iter().cloned());

    GenerateOptions {
        header_dirs: if args.dirs.is_empty() {
            config.input.directories.clone()
        } else {
            args.dirs.clone()
        },
        extension: args
            .extension
            .clone()
            .or_else(|| config.input.extension.clone())
            .unwrap_or(defaults.extension),
        include_dirs,
        defines,
        namespace: args
            .namespace
            .clone()
            .or_else(|| config.output.namespace.clone())
            .unwrap_or_default(),
        library: args
            .library
            .clone()
            .or_else(|| config.output.library.clone())
            .unwrap_or_default(),
        class: args
            .class
            .clone()
            .or_else(|| config.output.class.clone())
            .unwrap_or(defaults.class),
        bool_marshal: args
            .marshal_bool
            .or(config.marshal.bool_marshal)
            .unwrap_or(defaults.bool_marshal),
        string_marshal: args
            .marshal_string
            .or(config.marshal.string_marshal)
            .unwrap_or(defaults.string_marshal),
        fixed_size_buffers: if args.no_fixed_size_buffers {
            false
        } else {
            config
                .marshal
                .fixed_size_buffers
                .unwrap_or(defaults.fixed_size_buffers)
        },
        detect_opaque_pointers: if args.no_opaque_detection {
            false
        } else {
            config
                .marshal
                .detect_opaque_pointers
                .unwrap_or(defaults.detect_opaque_pointers)
        },
        output_dir: args
            .output
            .clone()
            .or_else(|| config.output.root.clone())
            .unwrap_or(defaults.output_dir),
        dry_run: args.dry_run,
    }
}
