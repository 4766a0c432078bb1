//! Per-VM allocation bookkeeping shared by all policies.

use rustc_hash::FxHashMap;

/// Cumulative number of allocations made to each VM during the current run.
///
/// Counts are used as a load approximation: they only grow and are never reset within a run.
#[derive(Debug, Clone, Default)]
pub struct AllocationTracker {
    counts: FxHashMap<usize, u64>,
}

impl AllocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates tracker with preset counts, e.g. to resume from a previous state.
    pub fn from_counts<I: IntoIterator<Item = (usize, u64)>>(counts: I) -> Self {
        Self {
            counts: counts.into_iter().collect(),
        }
    }

    /// Registers one more allocation to the VM.
    pub fn record(&mut self, vm: usize) {
        *self.counts.entry(vm).or_insert(0) += 1;
    }

    /// Returns the number of allocations to the VM (zero for VMs not seen yet).
    pub fn count(&self, vm: usize) -> u64 {
        self.counts.get(&vm).copied().unwrap_or(0)
    }

    /// Returns true if the VM received at least one allocation.
    pub fn contains(&self, vm: usize) -> bool {
        self.counts.contains_key(&vm)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Returns (vm, count) pairs ordered by VM index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> {
        let mut entries: Vec<(usize, u64)> = self.counts.iter().map(|(&vm, &count)| (vm, count)).collect();
        entries.sort_unstable();
        entries.into_iter()
    }
}
