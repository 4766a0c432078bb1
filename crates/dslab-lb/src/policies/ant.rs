//! Stochastic pheromone sampling with a population of ants.

use log::debug;
use rand::Rng;
use rand_pcg::Pcg64;

use crate::config::PheromoneConfig;
use crate::error::LbError;
use crate::policies::pheromone::{ensure_matrix_size, PheromoneMatrix};
use crate::policy::LoadBalancingPolicy;
use crate::tracker::AllocationTracker;
use crate::vm::VmRegistry;

/// Ant samples VMs with probability proportional to `pheromone(v) ^ alpha`,
/// where `pheromone(v)` is the total pheromone in the VM column.
#[derive(Debug, Clone)]
pub struct Ant {
    id: usize,
    alpha: f64,
    pheromone_unit: f64,
}

impl Ant {
    pub fn new(id: usize, config: &PheromoneConfig) -> Self {
        Self {
            id,
            alpha: config.alpha,
            pheromone_unit: config.pheromone_unit,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns normalized selection probabilities of all VMs.
    ///
    /// If the total weight is zero, the weights are returned unnormalized (all zeros).
    pub fn probabilities(&self, matrix: &PheromoneMatrix) -> Vec<f64> {
        let mut probability: Vec<f64> = (0..matrix.size())
            .map(|vm| matrix.column_sum(vm).powf(self.alpha))
            .collect();
        let sum: f64 = probability.iter().sum();
        if sum > 0. {
            for p in probability.iter_mut() {
                *p /= sum;
            }
        }
        probability
    }

    /// Samples VM by walking the VMs in index order and accumulating probability mass.
    /// Falls back to VM 0 if the accumulated mass never reaches the random draw.
    pub fn select_vm_by_pheromone(&self, matrix: &PheromoneMatrix, rng: &mut Pcg64) -> usize {
        let probability = self.probabilities(matrix);
        let draw: f64 = rng.gen();
        let mut cumulative = 0.;
        for (vm, p) in probability.iter().enumerate() {
            cumulative += p;
            if draw <= cumulative {
                return vm;
            }
        }
        0
    }

    /// Samples VM and reinforces the path from origin to it.
    pub fn send(&self, matrix: &mut PheromoneMatrix, rng: &mut Pcg64) -> usize {
        let vm = self.select_vm_by_pheromone(matrix, rng);
        self.update_pheromone(matrix, 0, vm);
        vm
    }

    /// Samples VM without changing the pheromone matrix.
    pub fn fetch_final_vm(&self, matrix: &PheromoneMatrix, rng: &mut Pcg64) -> usize {
        self.select_vm_by_pheromone(matrix, rng)
    }

    /// Deposits one pheromone unit on the `prev -> next` cell. Out of range indices are ignored.
    pub fn update_pheromone(&self, matrix: &mut PheromoneMatrix, prev: usize, next: usize) -> bool {
        matrix.add(prev, next, self.pheromone_unit)
    }
}

/// Selects VMs by sending ants over the pheromone matrix.
///
/// Ants take turns in round-robin order, every sent ant reinforces the chosen VM with one pheromone unit.
/// Unlike [`PheromonePolicy`](crate::policies::pheromone::PheromonePolicy) the choice is stochastic,
/// so the result depends on the random generator passed by the run.
pub struct AntSamplingPolicy {
    config: PheromoneConfig,
    matrix: Option<PheromoneMatrix>,
    ants: Vec<Ant>,
    next_ant: usize,
    tracker: AllocationTracker,
}

impl AntSamplingPolicy {
    pub fn new(config: PheromoneConfig) -> Self {
        Self {
            config,
            matrix: None,
            ants: Vec::new(),
            next_ant: 0,
            tracker: AllocationTracker::new(),
        }
    }

    pub fn pheromones(&self) -> Option<&PheromoneMatrix> {
        self.matrix.as_ref()
    }

    pub fn ants(&self) -> &[Ant] {
        &self.ants
    }
}

impl Default for AntSamplingPolicy {
    fn default() -> Self {
        Self::new(PheromoneConfig::default())
    }
}

impl LoadBalancingPolicy for AntSamplingPolicy {
    fn initialize(&mut self, vms: &dyn VmRegistry) -> Result<(), LbError> {
        if vms.vm_count() == 0 {
            return Err(LbError::NoVmAvailable);
        }
        self.matrix = Some(PheromoneMatrix::from_capacities(vms));
        self.ants = (0..self.config.ant_count.max(1))
            .map(|id| Ant::new(id, &self.config))
            .collect();
        self.next_ant = 0;
        Ok(())
    }

    fn select_vm(&mut self, vms: &dyn VmRegistry, rng: &mut Pcg64) -> Result<usize, LbError> {
        let matrix = self.matrix.as_mut().ok_or(LbError::NotInitialized)?;
        if vms.vm_count() == 0 {
            return Err(LbError::NoVmAvailable);
        }
        ensure_matrix_size(matrix, vms, "AntSampling");

        let ant = &self.ants[self.next_ant % self.ants.len()];
        self.next_ant = (self.next_ant + 1) % self.ants.len();
        let vm = ant.send(matrix, rng);
        self.tracker.record(vm);
        debug!(target: "AntSampling", "ant {} allocated to VM {}", ant.id(), vm);
        Ok(vm)
    }

    fn evaporate(&mut self) {
        if let Some(matrix) = self.matrix.as_mut() {
            matrix.evaporate(self.config.evaporation, self.config.pheromone_floor);
        }
    }

    fn tracker(&self) -> &AllocationTracker {
        &self.tracker
    }

    fn name(&self) -> String {
        "AntSampling".to_string()
    }
}
