//! `gangway check` command
//!
//! Parse, merge, resolve, and transform without writing any output.

use anyhow::{anyhow, Result};

use gangway::core::{Declaration, GenerateOptions};
use gangway::ops;
use gangway::util::diagnostic;

use crate::cli::CheckArgs;
use crate::commands::generate::load_config;

pub fn execute(args: CheckArgs, color: bool) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let defaults = GenerateOptions::default();
    let mut defines = config.input.defines.clone();
    defines.extend(args.defines.iter().cloned());

    // Output naming never affects checking; placeholders satisfy
    // validation when the config leaves them unset.
    let options = GenerateOptions {
        header_dirs: if args.dirs.is_empty() {
            config.input.directories.clone()
        } else {
            args.dirs.clone()
        },
        extension: args
            .extension
            .clone()
            .or_else(|| config.input.extension.clone())
            .unwrap_or_else(|| defaults.extension.clone()),
        include_dirs: config.input.include_dirs.clone(),
        defines,
        namespace: config
            .output
            .namespace
            .clone()
            .unwrap_or_else(|| "Bindings".to_string()),
        library: config
            .output
            .library
            .clone()
            .unwrap_or_else(|| "native".to_string()),
        ..defaults
    };

    match ops::check(&options) {
        Ok(symbols) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&symbols)?);
            } else {
                let mut enums = 0;
                let mut structs = 0;
                let mut functions = 0;
                let mut typedefs = 0;
                let mut constants = 0;
                for sym in &symbols {
                    match sym.decl {
                        Declaration::Enum(_) => enums += 1,
                        Declaration::Struct(_) => structs += 1,
                        Declaration::Function(_) => functions += 1,
                        Declaration::Typedef(_) => typedefs += 1,
                        Declaration::Constant(_) => constants += 1,
                    }
                }
                println!(
                    "OK: {} functions, {} structs, {} enums, {} typedefs, {} constants",
                    functions, structs, enums, typedefs, constants
                );
            }
            Ok(())
        }
        Err(e) => {
            for diag in e.to_diagnostics() {
                diagnostic::emit(&diag, color);
            }
            Err(anyhow!("check failed"))
        }
    }
}
