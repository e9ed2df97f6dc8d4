//! Asset conversion: per-extension converter registry with raw-copy
//! fallback.
//!
//! Converters are opaque external commands taking an input path and an
//! output path; their exit status is the result. The dispatcher never
//! leaves a partial file at the destination: converters write to a
//! temporary sibling which is renamed into place only on success.

use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::config::{PipelineConfig, is_passthrough};

// ============================================================================
// errors
// ============================================================================

/// Per-asset conversion errors.
///
/// None of these abort the build; the executor counts them and prunes
/// the asset from the final mapping table.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no converter for `{0}`")]
    NoConverter(String),

    #[error("converter `{command}` failed with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

// ============================================================================
// converter capability
// ============================================================================

/// A conversion capability for one source format.
///
/// Implementations must leave a complete file at `dst` on success and
/// may leave anything (or nothing) there on failure; the dispatcher
/// always hands them a temporary path and cleans up after errors.
pub trait Converter: Send + Sync {
    fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConvertError>;
}

/// Converter backed by an external command.
///
/// The configured command vector is invoked with the source and
/// destination paths appended as the final two arguments.
pub struct CommandConverter {
    command: Vec<String>,
}

impl CommandConverter {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }
}

impl Converter for CommandConverter {
    fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConvertError> {
        let output = Command::new(self.program())
            .args(&self.command[1..])
            .arg(src)
            .arg(dst)
            .output()
            .map_err(|e| ConvertError::Spawn {
                command: self.program().to_string(),
                source: e,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ConvertError::CommandFailed {
                command: self.program().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

// ============================================================================
// registry
// ============================================================================

/// Registered converters keyed by source extension.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: FxHashMap<String, Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// Build the registry from the `[converters]` configuration table.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut registry = Self::default();
        for (ext, command) in &config.converters {
            if command.is_empty() {
                crate::log!("warning"; "empty converter command for `{ext}`, ignoring");
                continue;
            }
            registry.register(ext, Box::new(CommandConverter::new(command.clone())));
        }
        registry
    }

    pub fn register(&mut self, extension: &str, converter: Box<dyn Converter>) {
        self.converters.insert(extension.to_string(), converter);
    }

    pub fn get(&self, extension: &str) -> Option<&dyn Converter> {
        self.converters.get(extension).map(Box::as_ref)
    }
}

// ============================================================================
// dispatch
// ============================================================================

/// Convert or copy one asset to its destination.
///
/// Lookup order: registered converter, then binary passthrough copy,
/// then `NoConverter`. On success a complete file exists at `dst`; on
/// failure nothing is left there.
pub fn convert_or_copy(
    registry: &ConverterRegistry,
    src: &Path,
    dst: &Path,
    extension: &str,
) -> Result<(), ConvertError> {
    let tmp = temp_sibling(dst);

    let result = if let Some(converter) = registry.get(extension) {
        converter.convert(src, &tmp)
    } else if is_passthrough(extension) {
        fs::copy(src, &tmp)
            .map(|_| ())
            .map_err(|e| ConvertError::Io(tmp.clone(), e))
    } else {
        return Err(ConvertError::NoConverter(extension.to_string()));
    };

    match result {
        Ok(()) => fs::rename(&tmp, dst).map_err(|e| {
            fs::remove_file(&tmp).ok();
            ConvertError::Io(dst.to_path_buf(), e)
        }),
        Err(e) => {
            fs::remove_file(&tmp).ok();
            Err(e)
        }
    }
}

/// Temporary path next to the destination, so the final rename stays on
/// one filesystem. Destinations are unique within a run, so a fixed
/// suffix cannot collide.
fn temp_sibling(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dst.with_file_name(name)
}
