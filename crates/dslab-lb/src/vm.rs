//! VM descriptors consumed by load balancing policies.

use serde::{Deserialize, Serialize};

/// Capacity returned for VM indices which are not present in the registry.
pub const DEFAULT_CAPACITY: f64 = 1.0;
/// MIPS estimate returned for VMs without cores and for unknown VM indices.
pub const DEFAULT_MIPS: f64 = 1000.0;

/// Read-only description of a datacenter VM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSpec {
    /// Stable VM index in `0..n`.
    pub id: usize,
    pub cores: u32,
    pub bandwidth: u64,
}

impl VmSpec {
    pub fn new(id: usize, cores: u32, bandwidth: u64) -> Self {
        Self { id, cores, bandwidth }
    }

    /// Capacity estimate combining CPU cores and bandwidth.
    pub fn capacity(&self) -> f64 {
        self.cores as f64 * 1000. + self.bandwidth as f64 / 1000.
    }

    /// Coarse MIPS estimate derived from the number of cores.
    pub fn mips(&self) -> f64 {
        if self.cores > 0 {
            self.cores as f64 * 1000.
        } else {
            DEFAULT_MIPS
        }
    }
}

/// Access to the VMs currently known to the datacenter, by stable index.
pub trait VmRegistry {
    fn vm_count(&self) -> usize;

    fn vm(&self, index: usize) -> Option<&VmSpec>;
}

impl VmRegistry for Vec<VmSpec> {
    fn vm_count(&self) -> usize {
        self.len()
    }

    fn vm(&self, index: usize) -> Option<&VmSpec> {
        self.get(index)
    }
}

/// Returns VM capacity or [`DEFAULT_CAPACITY`] if there is no VM with such index.
pub fn vm_capacity(vms: &dyn VmRegistry, index: usize) -> f64 {
    vms.vm(index).map(|vm| vm.capacity()).unwrap_or(DEFAULT_CAPACITY)
}

/// Returns VM MIPS estimate or [`DEFAULT_MIPS`] if there is no VM with such index.
pub fn vm_mips(vms: &dyn VmRegistry, index: usize) -> f64 {
    vms.vm(index).map(|vm| vm.mips()).unwrap_or(DEFAULT_MIPS)
}

/// Builds VM list with sequential indices from (cores, bandwidth) pairs.
pub fn vms_from_specs(specs: &[(u32, u64)]) -> Vec<VmSpec> {
    specs
        .iter()
        .enumerate()
        .map(|(id, &(cores, bandwidth))| VmSpec::new(id, cores, bandwidth))
        .collect()
}
