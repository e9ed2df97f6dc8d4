//! Build and mapping command entry points.
//!
//! `run_build` is the full incremental pass: scan, fingerprint,
//! checkpoint the mapping table, convert over the worker pool, prune
//! failures, persist the final table. `run_mapping` stops after the
//! first persist and never converts anything.
//!
//! The mapping table is written twice so that a crash mid-build leaves a
//! table that at worst over-reports (entries not yet converted, which a
//! consumer treats as "not yet available") and the final write never
//! references a missing artifact.

use anyhow::{Context, Result};
use std::fs;

use crate::build::{BuildMetrics, execute};
use crate::config::PipelineConfig;
use crate::convert::ConverterRegistry;
use crate::log;
use crate::mapping::{build_mapping, scan_assets, write_depfile, write_mapping_table};

/// Full asset build: conversion plus both mapping table writes.
pub fn run_build(config: &PipelineConfig) -> Result<BuildMetrics> {
    let records = scan_assets(config)?;
    let (mut table, deps) = build_mapping(&records, config)?;

    // Checkpoint: a concurrent or crashed reader sees a superset mapping
    write_mapping_table(&config.mapping_path, &table)?;
    if let Some(dep_path) = &config.dep_file {
        write_depfile(dep_path, &deps)?;
    }

    fs::create_dir_all(&config.staticmax_root).with_context(|| {
        format!(
            "failed to create staticmax root `{}`",
            config.staticmax_root.display()
        )
    })?;

    let registry = ConverterRegistry::from_config(config);
    let outcome = execute(&deps, &registry, config.workers);

    for failure in &outcome.failures {
        for logical in table.prune_destination(&failure.destination_name) {
            log!("build"; "removing asset from mapping table: {logical}");
        }
    }

    // Final write never references an artifact that does not exist
    write_mapping_table(&config.mapping_path, &table)?;

    let m = outcome.metrics;
    log!("build"; "BUILT: {} - SKIPPED: {} - FAILED: {}", m.built, m.skipped, m.failed);
    Ok(m)
}

/// Mapping-only pass: the `genmapping` mode of operation.
pub fn run_mapping(config: &PipelineConfig) -> Result<()> {
    let records = scan_assets(config)?;
    let (table, deps) = build_mapping(&records, config)?;

    write_mapping_table(&config.mapping_path, &table)?;
    if let Some(dep_path) = &config.dep_file {
        write_depfile(dep_path, &deps)?;
    }
    Ok(())
}
