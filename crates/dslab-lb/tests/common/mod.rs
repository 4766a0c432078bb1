use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_lb::vm::{vms_from_specs, VmSpec};

/// VMs with the given core counts and zero bandwidth, so that capacity equals `cores * 1000`.
#[allow(dead_code)]
pub fn vms_with_cores(cores: &[u32]) -> Vec<VmSpec> {
    let specs: Vec<(u32, u64)> = cores.iter().map(|&c| (c, 0)).collect();
    vms_from_specs(&specs)
}

#[allow(dead_code)]
pub fn rng() -> Pcg64 {
    Pcg64::seed_from_u64(123)
}

#[allow(dead_code)]
pub fn no_vms() -> Vec<VmSpec> {
    Vec::new()
}

/// Shows log records of the library in test output, level is controlled by `RUST_LOG`.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
