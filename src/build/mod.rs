//! Concurrent build executor.
//!
//! Pending work is partitioned round-robin across a fixed pool of scoped
//! worker threads. Each worker runs the incremental cache gate and the
//! converter dispatcher sequentially over its slice; the only shared
//! mutable state is the outcome accumulator behind a mutex. Ordering
//! between assets is not guaranteed and no asset's conversion may depend
//! on another's output within the same pass.

mod metrics;

pub use metrics::{BuildFailure, BuildMetrics, BuildOutcome};

use parking_lot::Mutex;
use std::thread;

use crate::convert::{ConverterRegistry, convert_or_copy};
use crate::mapping::{BuildDependencySet, BuildItem};
use crate::{debug, log};

/// Round-robin partition of `0..len` into at most `workers` disjoint
/// subsets. Every index lands in exactly one subset.
fn partition_indices(len: usize, workers: usize) -> Vec<Vec<usize>> {
    let workers = workers.max(1);
    let mut partitions: Vec<Vec<usize>> = vec![Vec::new(); workers.min(len.max(1))];
    let bucket_count = partitions.len();
    for index in 0..len {
        partitions[index % bucket_count].push(index);
    }
    partitions
}

/// Convert every pending item, skipping artifacts that already exist at
/// their content-addressed destination.
///
/// Per-asset failures are swallowed here: logged, counted, and recorded
/// for mapping-table pruning. Nothing a single asset does can abort or
/// block the other workers.
pub fn execute(
    deps: &BuildDependencySet,
    registry: &ConverterRegistry,
    workers: usize,
) -> BuildOutcome {
    let items = deps.items();
    let shared = Mutex::new(BuildOutcome::default());

    thread::scope(|scope| {
        for partition in partition_indices(items.len(), workers) {
            if partition.is_empty() {
                continue;
            }
            let shared = &shared;
            scope.spawn(move || {
                for index in partition {
                    process_item(&items[index], registry, shared);
                }
            });
        }
    });

    shared.into_inner()
}

/// Cache gate plus dispatch for a single item.
fn process_item(item: &BuildItem, registry: &ConverterRegistry, shared: &Mutex<BuildOutcome>) {
    // The destination name is content-derived: an existing file is
    // byte-identical to what conversion would produce.
    if item.dest.exists() {
        debug!("build"; "(skipping) {} -> {}", item.source.display(), item.dest.display());
        shared.lock().metrics.skipped += 1;
        return;
    }

    debug!("build"; "{} -> {}", item.source.display(), item.dest.display());

    match convert_or_copy(registry, &item.source, &item.dest, &item.extension) {
        Ok(()) => {
            shared.lock().metrics.built += 1;
        }
        Err(e) => {
            log!("error"; "{}: {}", item.logical_path, e);
            let mut outcome = shared.lock();
            outcome.metrics.failed += 1;
            outcome.failures.push(BuildFailure {
                logical_path: item.logical_path.clone(),
                destination_name: destination_name_of(item),
            });
        }
    }
}

fn destination_name_of(item: &BuildItem) -> String {
    item.dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
