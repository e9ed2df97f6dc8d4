//! Mapping table and dependency file persistence.
//!
//! The mapping table is written twice per build: a checkpoint right
//! after scanning (so a crashed or concurrent reader sees a superset
//! mapping) and a final write after conversion with failed assets
//! pruned. A consumer must treat an entry whose artifact is missing as
//! "not yet available", never as corrupt.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::log;

use super::{BuildDependencySet, MappingTable};

/// Serialize the mapping table as JSON, overwriting any existing file.
///
/// A failure here is fatal for the build: downstream consumers depend on
/// having a mapping table at all.
pub fn write_mapping_table(path: &Path, table: &MappingTable) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to write mapping table `{}`", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table)
        .with_context(|| format!("failed to serialize mapping table `{}`", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write mapping table `{}`", path.display()))?;

    log!("mapping"; "{} assets -> {}", table.len(), path.display());
    Ok(())
}

/// Write the make-style dependency file: one `dest : source` stanza per
/// target, blank-line separated. Regenerable, never authoritative.
pub fn write_depfile(path: &Path, deps: &BuildDependencySet) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to write dependency file `{}`", path.display()))?;
    let mut writer = BufWriter::new(file);

    for (source, dest) in deps.pairs() {
        writeln!(writer, "{} : {}\n", dest.display(), source.display())
            .with_context(|| format!("failed to write dependency file `{}`", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write dependency file `{}`", path.display()))?;
    Ok(())
}
