//! Build outcome accounting shared across workers.

/// Per-build counters, mutated only under the executor's lock and read
/// after all workers join.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildMetrics {
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BuildMetrics {
    pub fn total(&self) -> usize {
        self.built + self.skipped + self.failed
    }
}

/// One failed conversion.
///
/// The destination name is recorded alongside the logical path because
/// deduplicated sources share an artifact: when it fails, every logical
/// path mapped to it must be pruned from the table.
#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub logical_path: String,
    pub destination_name: String,
}

/// Aggregate result of one executor pass.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub metrics: BuildMetrics,
    pub failures: Vec<BuildFailure>,
}
