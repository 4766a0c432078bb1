//! Simulation run driving the datacenter controller.

use log::info;
use rand::prelude::*;
use rand_distr::Exp;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::controller::{Cloudlet, DatacenterController};
use crate::dispatch_log::DispatchLog;
use crate::error::LbError;
use crate::policy::{policy_resolver, LoadBalancingPolicy};

/// Summary of a finished run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunStats {
    pub policy: String,
    pub seed: u64,
    pub simulation_length: f64,
    pub cloudlets: u64,
    pub evaporations: u64,
    /// number of cloudlets dispatched to each VM
    pub vm_cloudlets: Vec<u64>,
    /// ratio between the maximal and the mean number of cloudlets per VM
    pub imbalance: f64,
}

impl RunStats {
    fn new(policy: String, config: &SimulationConfig, controller: &DatacenterController, evaporations: u64) -> Self {
        let vm_cloudlets = controller.vm_cloudlets().to_vec();
        let cloudlets: u64 = vm_cloudlets.iter().sum();
        let max = vm_cloudlets.iter().copied().max().unwrap_or(0);
        let imbalance = if cloudlets > 0 {
            max as f64 / (cloudlets as f64 / vm_cloudlets.len() as f64)
        } else {
            0.
        };
        Self {
            policy,
            seed: config.seed,
            simulation_length: config.simulation_length,
            cloudlets,
            evaporations,
            vm_cloudlets,
            imbalance,
        }
    }
}

/// Single simulation run with its own seeded random generator.
///
/// Cloudlets arrive with exponentially distributed inter-arrival times, the controller is asked to evaporate
/// the policy state every `evaporation_period` time units. Runs with the same config produce the same results.
pub struct LoadBalancingSimulation {
    config: SimulationConfig,
    controller: DatacenterController,
    rng: Pcg64,
    finished: bool,
}

impl LoadBalancingSimulation {
    /// Creates simulation using the policy named in config.
    pub fn new(config: SimulationConfig) -> Result<Self, LbError> {
        let policy = policy_resolver(&config.policy)?;
        Self::with_policy(config, policy)
    }

    /// Creates simulation with the given policy instance.
    pub fn with_policy(config: SimulationConfig, policy: Box<dyn LoadBalancingPolicy>) -> Result<Self, LbError> {
        config.validate()?;
        let mut controller = DatacenterController::new(config.vm_specs(), policy);
        controller.start()?;
        let rng = Pcg64::seed_from_u64(config.seed);
        Ok(Self {
            config,
            controller,
            rng,
            finished: false,
        })
    }

    pub fn with_dispatch_log(mut self, dispatch_log: DispatchLog) -> Self {
        self.controller = self.controller.with_dispatch_log(dispatch_log);
        self
    }

    /// Runs the simulation until `simulation_length` and returns the run summary.
    ///
    /// Each simulation can be run only once, subsequent calls return [`LbError::RunFinished`].
    pub fn run(&mut self) -> Result<RunStats, LbError> {
        if self.finished {
            return Err(LbError::RunFinished);
        }
        self.finished = true;
        let arrivals = Exp::new(1. / self.config.cloudlet_interval).map_err(|_| LbError::InvalidOption {
            option: "cloudlet_interval".to_string(),
            value: self.config.cloudlet_interval.to_string(),
        })?;
        let evaporation_period = self.config.evaporation_period;
        let mut next_evaporation = if evaporation_period > 0. {
            evaporation_period
        } else {
            f64::INFINITY
        };
        let mut evaporations = 0;
        let mut time = 0.;
        let mut cloudlet_id = 0;

        loop {
            time += arrivals.sample(&mut self.rng);
            if time > self.config.simulation_length {
                break;
            }
            while next_evaporation <= time {
                self.controller.on_time_step();
                evaporations += 1;
                next_evaporation += evaporation_period;
            }
            let cloudlet = Cloudlet {
                id: cloudlet_id,
                arrival_time: time,
            };
            self.controller.on_cloudlet_arrival(&cloudlet, &mut self.rng)?;
            cloudlet_id += 1;
        }
        while next_evaporation <= self.config.simulation_length {
            self.controller.on_time_step();
            evaporations += 1;
            next_evaporation += evaporation_period;
        }

        let stats = RunStats::new(self.controller.policy().name(), &self.config, &self.controller, evaporations);
        info!(
            target: "LoadBalancingSimulation",
            "{}: {} cloudlets dispatched to {} VMs, imbalance = {:.3}",
            stats.policy,
            stats.cloudlets,
            stats.vm_cloudlets.len(),
            stats.imbalance
        );
        Ok(stats)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn controller(&self) -> &DatacenterController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DatacenterController {
        &mut self.controller
    }
}
