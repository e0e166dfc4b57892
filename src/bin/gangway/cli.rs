//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use gangway::core::{BoolMarshal, StringMarshal};

/// gangway - A C header binding generator for managed languages
#[derive(Parser)]
#[command(name = "gangway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate bindings from C headers
    Generate(GenerateArgs),

    /// Parse and transform without writing output
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Directories to search recursively for headers
    pub dirs: Vec<PathBuf>,

    /// Target namespace for the generated bindings
    #[arg(long)]
    pub namespace: Option<String>,

    /// Native library name the bindings load
    #[arg(long)]
    pub library: Option<String>,

    /// Name of the static class holding functions and constants
    #[arg(long)]
    pub class: Option<String>,

    /// Header file extension, without the dot
    #[arg(long)]
    pub extension: Option<String>,

    /// Preprocessor define, NAME or NAME=VALUE (repeatable)
    #[arg(long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Include search directory (repeatable)
    #[arg(long = "include", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Boolean marshalling strategy: byte or int
    #[arg(long, value_name = "STRATEGY")]
    pub marshal_bool: Option<BoolMarshal>,

    /// String marshalling strategy: utf8 or utf16
    #[arg(long, value_name = "STRATEGY")]
    pub marshal_string: Option<StringMarshal>,

    /// Emit array fields as by-value arrays instead of fixed buffers
    #[arg(long)]
    pub no_fixed_size_buffers: bool,

    /// Fail on unknown pointer-only types instead of binding them as
    /// opaque handles
    #[arg(long)]
    pub no_opaque_detection: bool,

    /// Output root directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report what would be written without writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a gangway.toml configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Directories to search recursively for headers
    pub dirs: Vec<PathBuf>,

    /// Header file extension, without the dot
    #[arg(long)]
    pub extension: Option<String>,

    /// Preprocessor define, NAME or NAME=VALUE (repeatable)
    #[arg(long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Print the transformed symbols as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to a gangway.toml configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
