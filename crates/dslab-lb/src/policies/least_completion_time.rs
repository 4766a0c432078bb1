//! Least completion time (Min-Min) policy.

use log::debug;
use rand_pcg::Pcg64;

use crate::error::LbError;
use crate::policy::LoadBalancingPolicy;
use crate::tracker::AllocationTracker;
use crate::vm::{vm_mips, VmRegistry};

/// Uses the VM with the minimal estimated time to complete the next cloudlet.
///
/// The estimate is the number of allocations made to the VM divided by its MIPS estimate.
/// Ties are resolved in favor of the lowest VM index.
#[derive(Default)]
pub struct LeastCompletionTimePolicy {
    tracker: AllocationTracker,
}

impl LeastCompletionTimePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracker(mut self, tracker: AllocationTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Estimated time to complete the next cloudlet on the VM.
    pub fn load_metric(&self, vms: &dyn VmRegistry, vm: usize) -> f64 {
        self.tracker.count(vm) as f64 / vm_mips(vms, vm)
    }

    /// Returns the VM which would be selected now, without recording the allocation.
    pub fn choose(&self, vms: &dyn VmRegistry) -> Option<usize> {
        let mut result = None;
        let mut min_metric = f64::MAX;
        for vm in 0..vms.vm_count() {
            let metric = self.load_metric(vms, vm);
            if result.is_none() || metric < min_metric {
                min_metric = metric;
                result = Some(vm);
            }
        }
        result
    }
}

impl LoadBalancingPolicy for LeastCompletionTimePolicy {
    fn select_vm(&mut self, vms: &dyn VmRegistry, _rng: &mut Pcg64) -> Result<usize, LbError> {
        let vm = self.choose(vms).ok_or(LbError::NoVmAvailable)?;
        self.tracker.record(vm);
        debug!(target: "LeastCompletionTime", "allocated to VM {}", vm);
        Ok(vm)
    }

    fn tracker(&self) -> &AllocationTracker {
        &self.tracker
    }

    fn name(&self) -> String {
        "LeastCompletionTime".to_string()
    }
}
