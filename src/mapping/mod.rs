//! Logical-to-physical asset mapping.
//!
//! The mapping table is the externally persisted artifact: a lookup from
//! a stable logical asset path (relative to the asset root, forward
//! slashes) to the content-addressed destination name under the
//! staticmax root. The build dependency set is the work list derived
//! from it, carrying filesystem paths instead of logical identifiers.

mod persist;
mod scan;

pub use persist::{write_depfile, write_mapping_table};
pub use scan::scan_assets;

use anyhow::Result;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{PipelineConfig, is_passthrough};
use crate::fingerprint::Fingerprint;

// ============================================================================
// data model
// ============================================================================

/// One discovered source file.
///
/// Created once per tree walk and immutable thereafter; only its derived
/// mapping entry outlives the build pass.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    /// Path relative to the asset root, forward slashes on all platforms.
    /// The stable external key runtime asset loaders resolve against.
    pub logical_path: String,
    /// Actual file on disk.
    pub source: PathBuf,
    /// Lower-cased extension including the leading dot (empty when none).
    pub extension: String,
}

/// Persisted mapping from logical paths to destination names.
#[derive(Debug, Serialize, Deserialize)]
pub struct MappingTable {
    pub version: f64,
    pub urnmapping: FxHashMap<String, String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self {
            version: 1.0,
            urnmapping: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, logical_path: String, destination_name: String) {
        self.urnmapping.insert(logical_path, destination_name);
    }

    /// Drop the entry for a failed asset so the persisted table never
    /// references a non-existent artifact.
    pub fn remove(&mut self, logical_path: &str) {
        self.urnmapping.remove(logical_path);
    }

    /// Drop every entry resolving to a failed destination.
    ///
    /// Deduplicated sources share an artifact, so one failed conversion
    /// can dangle several logical paths. Returns the removed paths.
    pub fn prune_destination(&mut self, destination_name: &str) -> Vec<String> {
        let removed: Vec<String> = self
            .urnmapping
            .iter()
            .filter(|(_, dest)| dest.as_str() == destination_name)
            .map(|(logical, _)| logical.clone())
            .collect();
        for logical in &removed {
            self.urnmapping.remove(logical);
        }
        removed
    }

    pub fn get(&self, logical_path: &str) -> Option<&String> {
        self.urnmapping.get(logical_path)
    }

    pub fn len(&self) -> usize {
        self.urnmapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urnmapping.is_empty()
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of conversion work.
#[derive(Debug, Clone)]
pub struct BuildItem {
    pub logical_path: String,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub extension: String,
}

/// The authoritative work list consumed by the build executor.
///
/// Items are deduplicated by destination: two sources with identical
/// content share one artifact, and producing it twice in one run would
/// race on the destination file.
#[derive(Debug, Default)]
pub struct BuildDependencySet {
    items: Vec<BuildItem>,
}

impl BuildDependencySet {
    pub fn items(&self) -> &[BuildItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(source, dest)` pairs for the make-style dependency file.
    pub fn pairs(&self) -> impl Iterator<Item = (&PathBuf, &PathBuf)> {
        self.items.iter().map(|i| (&i.source, &i.dest))
    }

    /// Append a work item. The caller is responsible for destination
    /// uniqueness; `build_mapping` is the only production writer.
    pub fn push_item(&mut self, item: BuildItem) {
        self.items.push(item);
    }
}

// ============================================================================
// mapping construction
// ============================================================================

/// Compute the destination name for a fingerprinted asset.
///
/// Passthrough media keep their bare extension; everything else gains a
/// `.json` suffix for the engine's JSON intermediate representation.
pub fn destination_name(fingerprint: &Fingerprint, extension: &str) -> String {
    let base = format!("{}{}", fingerprint.encode(), extension);
    if is_passthrough(extension) {
        base
    } else {
        format!("{base}.json")
    }
}

/// Fingerprint the scanned records and assemble the mapping table plus
/// the build dependency set.
///
/// Fingerprints are computed in parallel; an unreadable source file is
/// fatal here (the tree was just enumerated, so it signals a broken
/// walk, not a per-asset conversion problem).
pub fn build_mapping(
    records: &[AssetRecord],
    config: &PipelineConfig,
) -> Result<(MappingTable, BuildDependencySet)> {
    let fingerprints: Vec<Fingerprint> = records
        .par_iter()
        .map(|record| Fingerprint::of_file(&record.source, &record.extension))
        .collect::<Result<_>>()?;

    let mut table = MappingTable::new();
    let mut deps = BuildDependencySet::default();
    let mut seen_dests: FxHashSet<PathBuf> = FxHashSet::default();

    for (record, fingerprint) in records.iter().zip(&fingerprints) {
        let name = destination_name(fingerprint, &record.extension);
        let dest = config.staticmax_root.join(&name);

        crate::debug!("mapping"; "{} ({}) -> {}", record.logical_path, record.extension, name);

        table.insert(record.logical_path.clone(), name);

        // Identical content found twice: one artifact, one conversion.
        if seen_dests.insert(dest.clone()) {
            deps.items.push(BuildItem {
                logical_path: record.logical_path.clone(),
                source: record.source.clone(),
                dest,
                extension: record.extension.clone(),
            });
        }
    }

    Ok((table, deps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            asset_root: root.to_path_buf(),
            staticmax_root: root.join("staticmax"),
            mapping_path: root.join("mapping_table.json"),
            dep_file: None,
            ignored_extensions: Default::default(),
            converters: Default::default(),
            workers: 4,
        }
    }

    fn record(root: &std::path::Path, logical: &str, ext: &str) -> AssetRecord {
        AssetRecord {
            logical_path: logical.to_string(),
            source: root.join(logical),
            extension: ext.to_string(),
        }
    }

    #[test]
    fn test_destination_name_suffix_rule() {
        let fp = Fingerprint::new([7; 20]);
        let encoded = fp.encode();

        // Passthrough media keep their bare extension
        assert_eq!(destination_name(&fp, ".png"), format!("{encoded}.png"));
        assert_eq!(destination_name(&fp, ".ogg"), format!("{encoded}.ogg"));

        // Converted formats gain a .json suffix
        assert_eq!(destination_name(&fp, ".dae"), format!("{encoded}.dae.json"));
        assert_eq!(destination_name(&fp, ""), format!("{encoded}.json"));
    }

    #[test]
    fn test_build_mapping_basic() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();
        fs::write(dir.path().join("models/box.dae"), "<dae/>").unwrap();
        fs::write(dir.path().join("sky.png"), b"png bytes").unwrap();

        let config = test_config(dir.path());
        let records = vec![
            record(dir.path(), "models/box.dae", ".dae"),
            record(dir.path(), "sky.png", ".png"),
        ];

        let (table, deps) = build_mapping(&records, &config).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(deps.len(), 2);

        let dae_name = table.get("models/box.dae").unwrap();
        assert!(dae_name.ends_with(".dae.json"));
        let png_name = table.get("sky.png").unwrap();
        assert!(png_name.ends_with(".png"));
        assert!(!png_name.ends_with(".json"));

        // Dependency set carries filesystem paths under the staticmax root
        for item in deps.items() {
            assert!(item.dest.starts_with(&config.staticmax_root));
        }
    }

    #[test]
    fn test_one_destination_per_logical_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();

        let config = test_config(dir.path());
        let records = vec![
            record(dir.path(), "a.png", ".png"),
            record(dir.path(), "b.png", ".png"),
        ];

        let (table, _) = build_mapping(&records, &config).unwrap();
        assert_ne!(table.get("a.png"), table.get("b.png"));
    }

    #[test]
    fn dedupes_identical_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.png"), b"same bytes").unwrap();
        fs::write(dir.path().join("two.png"), b"same bytes").unwrap();

        let config = test_config(dir.path());
        let records = vec![
            record(dir.path(), "one.png", ".png"),
            record(dir.path(), "two.png", ".png"),
        ];

        let (table, deps) = build_mapping(&records, &config).unwrap();

        // Both logical paths resolve, to the same artifact
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("one.png"), table.get("two.png"));

        // But the artifact is only produced once
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn test_unreadable_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let records = vec![record(dir.path(), "missing.png", ".png")];

        assert!(build_mapping(&records, &config).is_err());
    }

    #[test]
    fn test_prune_destination_removes_all_aliases() {
        let mut table = MappingTable::new();
        table.insert("one.png".into(), "abc.png".into());
        table.insert("two.png".into(), "abc.png".into());
        table.insert("other.png".into(), "def.png".into());

        let mut removed = table.prune_destination("abc.png");
        removed.sort();

        assert_eq!(removed, vec!["one.png".to_string(), "two.png".to_string()]);
        assert_eq!(table.len(), 1);
        assert!(table.get("other.png").is_some());
    }

    #[test]
    fn test_mapping_table_serialization() {
        let mut table = MappingTable::new();
        table.insert("models/box.dae".into(), "abc.dae.json".into());

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"version\":1.0"));
        assert!(json.contains("\"urnmapping\""));
        assert!(json.contains("\"models/box.dae\":\"abc.dae.json\""));

        let parsed: MappingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("models/box.dae").unwrap(), "abc.dae.json");
    }
}
