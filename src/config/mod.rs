//! Pipeline configuration for `staticmax.toml`.
//!
//! Configuration is resolved once at startup from an optional config file
//! merged with CLI arguments, validated, and then passed to every
//! component as an immutable value. No component reads ambient state.
//!
//! # Sections
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[build]`      | staticmax root, mapping path, workers, ignores  |
//! | `[converters]` | external converter command per source extension |

mod error;

pub use error::ConfigError;

use crate::cli::BuildArgs;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Extensions copied byte-for-byte instead of being converted to the
/// JSON intermediate representation. These must keep their native
/// extension for correct MIME/browser handling.
pub const PASSTHROUGH_EXTENSIONS: &[&str] =
    &[".png", ".jpg", ".jpeg", ".dds", ".tga", ".mp3", ".ogg"];

/// Extensions never treated as assets (authoring-tool project files,
/// raw notes). Extended via `[build] ignore` or `--ignore-ext`.
const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[".cgh", ".mb", ".txt"];

/// Default size of the conversion worker pool.
const DEFAULT_WORKERS: usize = 4;

/// Whether an extension belongs to the binary passthrough allow-list.
#[inline]
pub fn is_passthrough(extension: &str) -> bool {
    PASSTHROUGH_EXTENSIONS.contains(&extension)
}

// ============================================================================
// config file sections
// ============================================================================

/// Raw `staticmax.toml` contents before merging with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    build: BuildSection,

    /// Converter command per extension, e.g. `dae = ["dae2json"]`.
    /// Source and destination paths are appended when invoked.
    #[serde(default)]
    converters: FxHashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildSection {
    /// Output directory for content-addressed artifacts.
    staticmax: Option<PathBuf>,
    /// Mapping table output file.
    mapping: Option<PathBuf>,
    /// Worker pool size.
    workers: Option<usize>,
    /// Additional extensions to ignore (with or without leading dot).
    #[serde(default)]
    ignore: Vec<String>,
}

// ============================================================================
// resolved configuration
// ============================================================================

/// Fully-resolved, validated pipeline configuration.
///
/// Immutable after `load`; components borrow it, never mutate it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source asset tree, walked recursively.
    pub asset_root: PathBuf,
    /// Output directory for content-addressed artifacts (created if absent).
    pub staticmax_root: PathBuf,
    /// Mapping table output file.
    pub mapping_path: PathBuf,
    /// Optional make-style dependency file.
    pub dep_file: Option<PathBuf>,
    /// Extensions excluded from the mapping table and build plan.
    pub ignored_extensions: FxHashSet<String>,
    /// Converter command per extension.
    pub converters: FxHashMap<String, Vec<String>>,
    /// Conversion worker pool size.
    pub workers: usize,
}

impl PipelineConfig {
    /// Load configuration from the optional config file, apply CLI
    /// overrides, and validate.
    pub fn load(config_path: &PathBuf, args: &BuildArgs) -> Result<Self, ConfigError> {
        let file = Self::read_file(config_path)?;

        let mut ignored: FxHashSet<String> = DEFAULT_IGNORED_EXTENSIONS
            .iter()
            .map(|e| (*e).to_string())
            .collect();
        ignored.extend(file.build.ignore.iter().map(|e| normalize_extension(e)));
        ignored.extend(args.ignore_exts.iter().map(|e| normalize_extension(e)));

        let converters = file
            .converters
            .into_iter()
            .map(|(ext, cmd)| (normalize_extension(&ext), cmd))
            .collect();

        let config = Self {
            asset_root: args.asset_root.clone(),
            staticmax_root: args
                .staticmax_root
                .clone()
                .or(file.build.staticmax)
                .unwrap_or_else(|| PathBuf::from("staticmax")),
            mapping_path: args
                .output
                .clone()
                .or(file.build.mapping)
                .unwrap_or_else(|| PathBuf::from("mapping_table.json")),
            dep_file: args.dep_file.clone(),
            ignored_extensions: ignored,
            converters,
            workers: args.workers.or(file.build.workers).unwrap_or(DEFAULT_WORKERS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse the config file, falling back to defaults when it is absent.
    fn read_file(path: &PathBuf) -> Result<FileConfig, ConfigError> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        Ok(toml::from_str(&content)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.asset_root.exists() {
            return Err(ConfigError::AssetRootMissing(self.asset_root.clone()));
        }
        if !self.asset_root.is_dir() {
            return Err(ConfigError::AssetRootNotDirectory(self.asset_root.clone()));
        }
        if self.mapping_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutput);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Whether files with this extension are excluded from the pipeline.
    #[inline]
    pub fn is_ignored(&self, extension: &str) -> bool {
        self.ignored_extensions.contains(extension)
    }
}

/// Lower-case an extension and ensure the leading dot.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(root: &std::path::Path) -> BuildArgs {
        BuildArgs {
            asset_root: root.to_path_buf(),
            output: None,
            staticmax_root: None,
            dep_file: None,
            ignore_exts: vec![],
            workers: None,
            verbose: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("staticmax.toml");

        let config = PipelineConfig::load(&config_path, &args_for(dir.path())).unwrap();

        assert_eq!(config.staticmax_root, PathBuf::from("staticmax"));
        assert_eq!(config.mapping_path, PathBuf::from("mapping_table.json"));
        assert_eq!(config.workers, 4);
        assert!(config.is_ignored(".txt"));
        assert!(config.is_ignored(".cgh"));
        assert!(config.is_ignored(".mb"));
        assert!(!config.is_ignored(".png"));
    }

    #[test]
    fn test_config_file_and_cli_merge() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("staticmax.toml");
        fs::write(
            &config_path,
            r#"
[build]
staticmax = "out/static"
workers = 8
ignore = ["psd", ".blend"]

[converters]
dae = ["dae2json"]
"#,
        )
        .unwrap();

        let mut args = args_for(dir.path());
        args.workers = Some(2);
        args.ignore_exts = vec!["XCF".to_string()];

        let config = PipelineConfig::load(&config_path, &args).unwrap();

        assert_eq!(config.staticmax_root, PathBuf::from("out/static"));
        // CLI wins over config file
        assert_eq!(config.workers, 2);
        // extensions normalized to lower case with leading dot
        assert!(config.is_ignored(".psd"));
        assert!(config.is_ignored(".blend"));
        assert!(config.is_ignored(".xcf"));
        assert_eq!(config.converters[".dae"], vec!["dae2json".to_string()]);
    }

    #[test]
    fn test_missing_asset_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("staticmax.toml");
        let mut args = args_for(dir.path());
        args.asset_root = dir.path().join("no_such_dir");

        let err = PipelineConfig::load(&config_path, &args).unwrap_err();
        assert!(matches!(err, ConfigError::AssetRootMissing(_)));
    }

    #[test]
    fn test_asset_root_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("staticmax.toml");
        let file = dir.path().join("a_file");
        fs::write(&file, "x").unwrap();

        let mut args = args_for(dir.path());
        args.asset_root = file;

        let err = PipelineConfig::load(&config_path, &args).unwrap_err();
        assert!(matches!(err, ConfigError::AssetRootNotDirectory(_)));
    }

    #[test]
    fn test_invalid_toml_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("staticmax.toml");
        fs::write(&config_path, "not [valid toml").unwrap();

        let err = PipelineConfig::load(&config_path, &args_for(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_passthrough_list() {
        assert!(is_passthrough(".png"));
        assert!(is_passthrough(".ogg"));
        assert!(!is_passthrough(".dae"));
        assert!(!is_passthrough(".json"));
    }
}
