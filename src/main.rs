//! staticmax - a content-addressed, incrementally-rebuilt asset pipeline.

mod build;
mod cli;
mod config;
mod convert;
mod fingerprint;
mod logger;
mod mapping;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Build { args } => {
            logger::set_verbose(args.verbose);
            let config = PipelineConfig::load(&cli.config, args)?;
            cli::build::run_build(&config).map(|_| ())
        }
        Commands::Mapping { args } => {
            logger::set_verbose(args.verbose);
            let config = PipelineConfig::load(&cli.config, args)?;
            cli::build::run_mapping(&config)
        }
    }
}
