//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// staticmax asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: staticmax.toml)
    #[arg(short = 'C', long, default_value = "staticmax.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert the asset tree into content-addressed artifacts
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Generate the mapping table without converting anything
    #[command(visible_alias = "m")]
    Mapping {
        #[command(flatten)]
        args: BuildArgs,
    },
}

/// Shared arguments for the Build and Mapping commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Asset root directory, walked recursively
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub asset_root: PathBuf,

    /// Mapping table output file (default: mapping_table.json)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Location of fully static data (default: staticmax)
    #[arg(long = "staticmax-root", value_hint = clap::ValueHint::DirPath)]
    pub staticmax_root: Option<PathBuf>,

    /// Optional output dependency file (in make format)
    #[arg(long = "dep-file", value_hint = clap::ValueHint::FilePath)]
    pub dep_file: Option<PathBuf>,

    /// Extension to be ignored (repeatable)
    #[arg(long = "ignore-ext", value_name = "EXT")]
    pub ignore_exts: Vec<String>,

    /// Number of conversion workers (default: 4)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
