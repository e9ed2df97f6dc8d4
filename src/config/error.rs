//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
///
/// All of these are fatal: they are reported before any work begins and
/// abort the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("asset root `{0}` does not exist")]
    AssetRootMissing(PathBuf),

    #[error("asset root `{0}` is not a directory")]
    AssetRootNotDirectory(PathBuf),

    #[error("no mapping table output path configured")]
    MissingOutput,

    #[error("worker count must be at least 1")]
    ZeroWorkers,
}
