//! Load balancing policies.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rand_pcg::Pcg64;

use crate::config::{parse_config_value, parse_options, PheromoneConfig};
use crate::error::LbError;
use crate::policies::ant::AntSamplingPolicy;
use crate::policies::least_allocation::{LeastAllocationMode, LeastAllocationPolicy};
use crate::policies::least_completion_time::LeastCompletionTimePolicy;
use crate::policies::pheromone::PheromonePolicy;
use crate::tracker::AllocationTracker;
use crate::vm::VmRegistry;

/// Trait for implementation of load balancing policies.
///
/// The policy is invoked once per cloudlet arrival and returns the index of VM which should receive the cloudlet.
/// Every successful selection is recorded in the policy's [`AllocationTracker`].
///
/// The random generator is owned by the simulation run and is passed to the policy so that runs with the same
/// seed are reproducible. Deterministic policies ignore it.
pub trait LoadBalancingPolicy {
    /// Prepares the policy for a new run. Must be called once before the first selection.
    fn initialize(&mut self, vms: &dyn VmRegistry) -> Result<(), LbError> {
        if vms.vm_count() == 0 {
            return Err(LbError::NoVmAvailable);
        }
        Ok(())
    }

    /// Selects VM for the next cloudlet and records the allocation.
    fn select_vm(&mut self, vms: &dyn VmRegistry, rng: &mut Pcg64) -> Result<usize, LbError>;

    /// Decays the policy's learned state. Does nothing for stateless policies.
    fn evaporate(&mut self) {}

    fn tracker(&self) -> &AllocationTracker;

    fn name(&self) -> String;
}

/// Identifiers of the supported policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    LeastCompletionTime,
    LeastAllocation,
    Pheromone,
    AntSampling,
}

impl PolicyKind {
    pub fn all() -> [PolicyKind; 4] {
        [
            PolicyKind::LeastCompletionTime,
            PolicyKind::LeastAllocation,
            PolicyKind::Pheromone,
            PolicyKind::AntSampling,
        ]
    }
}

impl FromStr for PolicyKind {
    type Err = LbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "leastcompletiontime" | "minmin" => Ok(PolicyKind::LeastCompletionTime),
            "leastallocation" | "maxmin" => Ok(PolicyKind::LeastAllocation),
            "pheromone" | "antcolony" => Ok(PolicyKind::Pheromone),
            "antsampling" => Ok(PolicyKind::AntSampling),
            _ => Err(LbError::UnknownPolicy(s.to_string())),
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PolicyKind::LeastCompletionTime => "LeastCompletionTime",
            PolicyKind::LeastAllocation => "LeastAllocation",
            PolicyKind::Pheromone => "Pheromone",
            PolicyKind::AntSampling => "AntSampling",
        };
        write!(f, "{}", name)
    }
}

/// Creates policy from config string such as `LeastAllocation[mode=busy]` or `Pheromone[alpha=1.5,ants=10]`.
pub fn policy_resolver(config_str: &str) -> Result<Box<dyn LoadBalancingPolicy>, LbError> {
    let (policy_name, options_str) = parse_config_value(config_str);
    let options = parse_options(options_str.as_deref().unwrap_or(""));
    match policy_name.parse::<PolicyKind>()? {
        PolicyKind::LeastCompletionTime => Ok(Box::new(LeastCompletionTimePolicy::new())),
        PolicyKind::LeastAllocation => {
            let mode = match options.get("mode") {
                Some(value) => value.parse::<LeastAllocationMode>()?,
                None => LeastAllocationMode::default(),
            };
            Ok(Box::new(LeastAllocationPolicy::with_mode(mode)))
        }
        PolicyKind::Pheromone => Ok(Box::new(PheromonePolicy::new(PheromoneConfig::from_options(
            &options,
        )?))),
        PolicyKind::AntSampling => Ok(Box::new(AntSamplingPolicy::new(PheromoneConfig::from_options(
            &options,
        )?))),
    }
}
