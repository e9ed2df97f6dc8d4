//! Asset tree scanning (pure, no side effects).

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::PipelineConfig;

use super::AssetRecord;

/// Walk the asset root and collect every buildable source file.
///
/// Filtering rules:
/// - files whose extension is in the configured ignore set never appear
/// - hidden files (leading dot) are not assets
/// - directories are recursed unconditionally
///
/// An unreadable directory is fatal: a partial walk would silently
/// under-report the mapping table.
///
/// # Pure Function
///
/// This function only reads the filesystem and returns data.
/// It does not modify any state.
pub fn scan_assets(config: &PipelineConfig) -> Result<Vec<AssetRecord>> {
    let mut records = Vec::new();
    scan_recursive(&mut records, &config.asset_root, &config.asset_root, config)?;

    // Stable order keeps persisted output deterministic across runs
    records.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
    Ok(records)
}

/// Recursive helper for scanning the asset tree.
fn scan_recursive(
    records: &mut Vec<AssetRecord>,
    dir: &Path,
    asset_root: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to enumerate `{}`", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in `{}`", dir.display()))?;
        let path = entry.path();

        if path.is_dir() {
            scan_recursive(records, &path, asset_root, config)?;
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            crate::log!("warning"; "skipping non-UTF-8 filename in `{}`", dir.display());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let extension = extension_of(name);
        if config.is_ignored(&extension) {
            continue;
        }

        let rel = path.strip_prefix(asset_root).unwrap_or(&path);
        let logical_path = logical_path_of(rel);

        crate::debug!("scan"; "{}", logical_path);

        records.push(AssetRecord {
            logical_path,
            source: path,
            extension,
        });
    }

    Ok(())
}

/// Lower-cased extension with leading dot, empty when the name has none.
fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[idx..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Relative path rendered with forward slashes on every platform.
fn logical_path_of(rel: &Path) -> String {
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    parts.join("/")
}
