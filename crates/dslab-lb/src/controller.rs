//! Datacenter controller dispatching cloudlets to VMs.

use log::{debug, info};
use rand_pcg::Pcg64;

use crate::dispatch_log::DispatchLog;
use crate::error::LbError;
use crate::policy::LoadBalancingPolicy;
use crate::vm::{VmRegistry, VmSpec};

/// Unit of work submitted to the datacenter.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloudlet {
    pub id: u64,
    pub arrival_time: f64,
}

/// Owns the live VM list and invokes the active load balancing policy once per cloudlet arrival.
pub struct DatacenterController {
    vms: Vec<VmSpec>,
    policy: Box<dyn LoadBalancingPolicy>,
    vm_cloudlets: Vec<u64>,
    dispatch_log: DispatchLog,
    started: bool,
}

impl DatacenterController {
    pub fn new(vms: Vec<VmSpec>, policy: Box<dyn LoadBalancingPolicy>) -> Self {
        let vm_cloudlets = vec![0; vms.len()];
        Self {
            vms,
            policy,
            vm_cloudlets,
            dispatch_log: DispatchLog::disabled(),
            started: false,
        }
    }

    /// Enables recording of dispatching decisions, the trace is disabled by default.
    pub fn with_dispatch_log(mut self, dispatch_log: DispatchLog) -> Self {
        self.dispatch_log = dispatch_log;
        self
    }

    /// Initializes the policy for a new run.
    pub fn start(&mut self) -> Result<(), LbError> {
        self.policy.initialize(&self.vms)?;
        self.started = true;
        info!(
            target: "DatacenterController",
            "started with {} VMs and policy {}",
            self.vms.len(),
            self.policy.name()
        );
        Ok(())
    }

    /// Selects VM for the arrived cloudlet and dispatches the cloudlet to it.
    pub fn on_cloudlet_arrival(&mut self, cloudlet: &Cloudlet, rng: &mut Pcg64) -> Result<usize, LbError> {
        if !self.started {
            return Err(LbError::NotInitialized);
        }
        let vm = self.policy.select_vm(&self.vms, rng)?;
        if vm >= self.vms.len() {
            return Err(LbError::VmIndexOutOfRange {
                index: vm,
                count: self.vms.len(),
            });
        }
        self.vm_cloudlets[vm] += 1;
        self.dispatch_log
            .record(cloudlet.arrival_time, cloudlet.id, vm, &self.policy.name());
        debug!(
            target: "DatacenterController",
            "[{:.3}] cloudlet {} dispatched to VM {}",
            cloudlet.arrival_time,
            cloudlet.id,
            vm
        );
        Ok(vm)
    }

    /// Periodic maintenance, decays the learned state of the policy.
    pub fn on_time_step(&mut self) {
        if self.started {
            self.policy.evaporate();
        }
    }

    /// Adds new VM to the datacenter and returns its index.
    pub fn add_vm(&mut self, cores: u32, bandwidth: u64) -> usize {
        let id = self.vms.len();
        self.vms.push(VmSpec::new(id, cores, bandwidth));
        self.vm_cloudlets.push(0);
        id
    }

    pub fn vms(&self) -> &[VmSpec] {
        &self.vms
    }

    pub fn vm_count(&self) -> usize {
        self.vms.vm_count()
    }

    pub fn policy(&self) -> &dyn LoadBalancingPolicy {
        self.policy.as_ref()
    }

    /// Number of cloudlets dispatched to each VM.
    pub fn vm_cloudlets(&self) -> &[u64] {
        &self.vm_cloudlets
    }

    pub fn dispatch_log(&self) -> &DispatchLog {
        &self.dispatch_log
    }
}
