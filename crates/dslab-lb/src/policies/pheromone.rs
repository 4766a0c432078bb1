//! Pheromone-based (ant colony) policy.

use log::{debug, warn};
use rand_pcg::Pcg64;

use crate::config::PheromoneConfig;
use crate::error::LbError;
use crate::policy::LoadBalancingPolicy;
use crate::tracker::AllocationTracker;
use crate::vm::{vm_capacity, VmRegistry};

const PHEROMONE_SCORE_WEIGHT: f64 = 2.;
const CAPACITY_SCORE_WEIGHT: f64 = 3.;
const LOAD_PENALTY: f64 = 0.5;

/// Square matrix of pheromone values between a notional origin (row) and a VM (column).
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneMatrix {
    size: usize,
    values: Vec<f64>,
}

impl PheromoneMatrix {
    /// Creates matrix filled with the given value.
    pub fn filled(size: usize, value: f64) -> Self {
        Self {
            size,
            values: vec![value; size * size],
        }
    }

    /// Creates matrix for the current VM set, initial values are proportional to VM capacity:
    /// `pheromone[i][j] = capacity(j) / 1000` for all rows.
    pub fn from_capacities(vms: &dyn VmRegistry) -> Self {
        let size = vms.vm_count();
        let mut values = Vec::with_capacity(size * size);
        for _ in 0..size {
            for j in 0..size {
                values.push(initial_pheromone(vms, j));
            }
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns value of the cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not less than the matrix size.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size + col]
    }

    /// Overwrites value of the cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not less than the matrix size.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.size + col] = value;
    }

    /// Returns pheromone values of the origin over all VMs.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not less than the matrix size.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }

    /// Total pheromone deposited on the VM over all rows.
    ///
    /// # Panics
    ///
    /// Panics if `col` is not less than the matrix size.
    pub fn column_sum(&self, col: usize) -> f64 {
        (0..self.size).map(|row| self.get(row, col)).sum()
    }

    /// Adds pheromone to a single cell. Returns false if any index is out of range.
    pub fn add(&mut self, row: usize, col: usize, amount: f64) -> bool {
        if row >= self.size || col >= self.size {
            return false;
        }
        self.values[row * self.size + col] += amount;
        true
    }

    /// Decays the column by `retain` factor and deposits `amount` to each of its cells.
    ///
    /// # Panics
    ///
    /// Panics if `col` is not less than the matrix size.
    pub fn reinforce_column(&mut self, col: usize, retain: f64, amount: f64) {
        for row in 0..self.size {
            let value = self.get(row, col);
            self.set(row, col, value * retain + amount);
        }
    }

    /// Multiplies every value by `factor`, values never drop below `floor`.
    pub fn evaporate(&mut self, factor: f64, floor: f64) {
        for value in self.values.iter_mut() {
            *value *= factor;
            if *value < floor {
                *value = floor;
            }
        }
    }

    /// Adapts the matrix to a changed VM set.
    ///
    /// Values of the preserved VMs are kept, rows and columns of new VMs get initial capacity-based values.
    pub fn resize(&mut self, vms: &dyn VmRegistry) {
        let new_size = vms.vm_count();
        let mut values = Vec::with_capacity(new_size * new_size);
        for i in 0..new_size {
            for j in 0..new_size {
                if i < self.size && j < self.size {
                    values.push(self.get(i, j));
                } else {
                    values.push(initial_pheromone(vms, j));
                }
            }
        }
        self.size = new_size;
        self.values = values;
    }

    /// Returns all values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

fn initial_pheromone(vms: &dyn VmRegistry, vm: usize) -> f64 {
    vm_capacity(vms, vm) / 1000.
}

/// Resizes the matrix if the VM count has changed since its creation.
pub(crate) fn ensure_matrix_size(matrix: &mut PheromoneMatrix, vms: &dyn VmRegistry, policy: &str) {
    if matrix.size() != vms.vm_count() {
        warn!(
            target: policy,
            "VM count changed from {} to {}, resizing pheromone matrix",
            matrix.size(),
            vms.vm_count()
        );
        matrix.resize(vms);
    }
}

/// Uses the VM with the best combination of pheromone strength, capacity and load.
///
/// Each VM is scored as `pheromone * alpha * 2 + capacity * beta * 3 - allocations * 0.5`,
/// where `pheromone` is the column sum of the matrix. The selected VM column is reinforced immediately.
/// Evaporation is not performed during selection and must be triggered by the controller.
pub struct PheromonePolicy {
    config: PheromoneConfig,
    matrix: Option<PheromoneMatrix>,
    tracker: AllocationTracker,
}

impl PheromonePolicy {
    pub fn new(config: PheromoneConfig) -> Self {
        Self {
            config,
            matrix: None,
            tracker: AllocationTracker::new(),
        }
    }

    pub fn with_tracker(mut self, tracker: AllocationTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn config(&self) -> &PheromoneConfig {
        &self.config
    }

    /// Returns the pheromone matrix, if the policy is initialized.
    pub fn pheromones(&self) -> Option<&PheromoneMatrix> {
        self.matrix.as_ref()
    }

    /// Returns selection score of the VM, if the policy is initialized.
    pub fn score(&self, vms: &dyn VmRegistry, vm: usize) -> Option<f64> {
        self.matrix
            .as_ref()
            .map(|matrix| vm_score(matrix, &self.tracker, &self.config, vms, vm))
    }
}

impl Default for PheromonePolicy {
    fn default() -> Self {
        Self::new(PheromoneConfig::default())
    }
}

fn vm_score(
    matrix: &PheromoneMatrix,
    tracker: &AllocationTracker,
    config: &PheromoneConfig,
    vms: &dyn VmRegistry,
    vm: usize,
) -> f64 {
    let pheromone = if vm < matrix.size() { matrix.column_sum(vm) } else { 0. };
    pheromone * config.alpha * PHEROMONE_SCORE_WEIGHT + vm_capacity(vms, vm) * config.beta * CAPACITY_SCORE_WEIGHT
        - tracker.count(vm) as f64 * LOAD_PENALTY
}

impl LoadBalancingPolicy for PheromonePolicy {
    fn initialize(&mut self, vms: &dyn VmRegistry) -> Result<(), LbError> {
        if vms.vm_count() == 0 {
            return Err(LbError::NoVmAvailable);
        }
        self.matrix = Some(PheromoneMatrix::from_capacities(vms));
        debug!(target: "Pheromone", "initialized {0}x{0} pheromone matrix", vms.vm_count());
        Ok(())
    }

    fn select_vm(&mut self, vms: &dyn VmRegistry, _rng: &mut Pcg64) -> Result<usize, LbError> {
        let matrix = self.matrix.as_mut().ok_or(LbError::NotInitialized)?;
        if vms.vm_count() == 0 {
            return Err(LbError::NoVmAvailable);
        }
        ensure_matrix_size(matrix, vms, "Pheromone");

        let mut best_vm = 0;
        let mut best_score = f64::NEG_INFINITY;
        for vm in 0..vms.vm_count() {
            let score = vm_score(matrix, &self.tracker, &self.config, vms, vm);
            if score > best_score {
                best_score = score;
                best_vm = vm;
            }
        }

        matrix.reinforce_column(
            best_vm,
            1. - self.config.evaporation,
            self.config.pheromone_unit * self.config.reinforcement_multiplier,
        );
        self.tracker.record(best_vm);
        debug!(target: "Pheromone", "allocated to VM {} (score = {:.3})", best_vm, best_score);
        Ok(best_vm)
    }

    fn evaporate(&mut self) {
        if let Some(matrix) = self.matrix.as_mut() {
            matrix.evaporate(self.config.evaporation, self.config.pheromone_floor);
            debug!(target: "Pheromone", "pheromone evaporated");
        }
    }

    fn tracker(&self) -> &AllocationTracker {
        &self.tracker
    }

    fn name(&self) -> String {
        "Pheromone".to_string()
    }
}
