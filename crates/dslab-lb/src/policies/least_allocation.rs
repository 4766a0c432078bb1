//! Least allocation (Max-Min) policy.
//!
//! "Max" refers to ordering of tasks upstream, the VM itself is selected by minimal load here.

use std::str::FromStr;

use log::debug;
use rand_pcg::Pcg64;

use crate::error::LbError;
use crate::policy::LoadBalancingPolicy;
use crate::tracker::AllocationTracker;
use crate::vm::{vm_mips, VmRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeastAllocationMode {
    /// VM with the minimal allocation count.
    #[default]
    LeastLoaded,
    /// VM with the maximal `allocations * mips` score, VMs without allocations are scored by their index.
    BusyPreference,
}

impl FromStr for LeastAllocationMode {
    type Err = LbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "least" | "leastloaded" => Ok(LeastAllocationMode::LeastLoaded),
            "busy" | "busypreference" => Ok(LeastAllocationMode::BusyPreference),
            _ => Err(LbError::InvalidOption {
                option: "mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Uses the least loaded VM by the number of allocations, the lowest index wins ties.
#[derive(Default)]
pub struct LeastAllocationPolicy {
    mode: LeastAllocationMode,
    tracker: AllocationTracker,
}

impl LeastAllocationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: LeastAllocationMode) -> Self {
        Self {
            mode,
            tracker: AllocationTracker::new(),
        }
    }

    pub fn with_tracker(mut self, tracker: AllocationTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn mode(&self) -> LeastAllocationMode {
        self.mode
    }

    /// Returns the VM which would be selected now, without recording the allocation.
    pub fn choose(&self, vms: &dyn VmRegistry) -> Option<usize> {
        match self.mode {
            LeastAllocationMode::LeastLoaded => self.choose_least_loaded(vms),
            LeastAllocationMode::BusyPreference => self.choose_busy(vms),
        }
    }

    fn choose_least_loaded(&self, vms: &dyn VmRegistry) -> Option<usize> {
        (0..vms.vm_count()).min_by_key(|&vm| (self.tracker.count(vm), vm))
    }

    fn choose_busy(&self, vms: &dyn VmRegistry) -> Option<usize> {
        let mut result = None;
        let mut max_score = f64::NEG_INFINITY;
        for vm in 0..vms.vm_count() {
            let count = self.tracker.count(vm);
            let score = if count == 0 {
                vm as f64
            } else {
                count as f64 * vm_mips(vms, vm)
            };
            if score > max_score {
                max_score = score;
                result = Some(vm);
            }
        }
        result
    }
}

impl LoadBalancingPolicy for LeastAllocationPolicy {
    fn select_vm(&mut self, vms: &dyn VmRegistry, _rng: &mut Pcg64) -> Result<usize, LbError> {
        let vm = self.choose(vms).ok_or(LbError::NoVmAvailable)?;
        self.tracker.record(vm);
        debug!(target: "LeastAllocation", "allocated to VM {}", vm);
        Ok(vm)
    }

    fn tracker(&self) -> &AllocationTracker {
        &self.tracker
    }

    fn name(&self) -> String {
        match self.mode {
            LeastAllocationMode::LeastLoaded => "LeastAllocation".to_string(),
            LeastAllocationMode::BusyPreference => "LeastAllocation[mode=busy]".to_string(),
        }
    }
}
