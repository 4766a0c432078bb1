//! Policy and simulation configuration.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LbError;
use crate::vm::VmSpec;

/// Upper bound on the expected number of cloudlet arrivals and evaporation ticks in one run.
pub const MAX_RUN_STEPS: f64 = 1e7;

/// Tunables of the pheromone-based policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PheromoneConfig {
    /// weight of pheromone attractiveness
    pub alpha: f64,
    /// weight of VM capacity
    pub beta: f64,
    /// multiplicative decay factor used by reinforcement and evaporation
    pub evaporation: f64,
    /// amount of pheromone deposited by one reinforcement unit
    pub pheromone_unit: f64,
    /// number of units deposited on the selected VM column per selection
    pub reinforcement_multiplier: f64,
    /// minimal pheromone value kept after evaporation
    pub pheromone_floor: f64,
    /// size of ant population
    pub ant_count: usize,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self {
            alpha: 1.,
            beta: 2.,
            evaporation: 0.5,
            pheromone_unit: 1.,
            reinforcement_multiplier: 5.,
            pheromone_floor: 0.01,
            ant_count: 5,
        }
    }
}

impl PheromoneConfig {
    /// Builds config from parsed options, absent options keep their default values.
    ///
    /// Supported options: `alpha`, `beta`, `evaporation`, `unit`, `reinforcement`, `floor`, `ants`.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, LbError> {
        let mut config = Self::default();
        if let Some(value) = options.get("alpha") {
            config.alpha = parse_finite("alpha", value, f64::MIN)?;
        }
        if let Some(value) = options.get("beta") {
            config.beta = parse_finite("beta", value, f64::MIN)?;
        }
        if let Some(value) = options.get("evaporation") {
            config.evaporation = parse_option("evaporation", value)?;
            if !(0. ..=1.).contains(&config.evaporation) {
                return Err(invalid_option("evaporation", value));
            }
        }
        if let Some(value) = options.get("unit") {
            config.pheromone_unit = parse_finite("unit", value, 0.)?;
        }
        if let Some(value) = options.get("reinforcement") {
            config.reinforcement_multiplier = parse_finite("reinforcement", value, 0.)?;
        }
        if let Some(value) = options.get("floor") {
            config.pheromone_floor = parse_finite("floor", value, 0.)?;
        }
        if let Some(value) = options.get("ants") {
            config.ant_count = parse_option("ants", value)?;
            if config.ant_count == 0 {
                return Err(invalid_option("ants", value));
            }
        }
        Ok(config)
    }
}

/// Parses single option value.
pub fn parse_option<T: FromStr>(option: &str, value: &str) -> Result<T, LbError> {
    value.trim().parse::<T>().map_err(|_| invalid_option(option, value))
}

/// Parses finite numeric option value not less than `min`.
fn parse_finite(option: &str, value: &str, min: f64) -> Result<f64, LbError> {
    let result: f64 = parse_option(option, value)?;
    if !result.is_finite() || result < min {
        return Err(invalid_option(option, value));
    }
    Ok(result)
}

fn invalid_option(option: &str, value: &str) -> LbError {
    LbError::InvalidOption {
        option: option.to_string(),
        value: value.to_string(),
    }
}

/// VM group in the datacenter config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmConfig {
    /// number of CPU cores
    pub cores: u32,
    /// network bandwidth
    #[serde(default)]
    pub bandwidth: u64,
    /// number of such VMs
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDataRaw {
    /// seed of the random generator owned by the run
    pub seed: Option<u64>,
    /// length of simulation
    pub simulation_length: Option<f64>,
    /// mean time between cloudlet arrivals
    pub cloudlet_interval: Option<f64>,
    /// period of pheromone evaporation, zero disables it
    pub evaporation_period: Option<f64>,
    /// load balancing policy
    pub policy: Option<String>,
    /// datacenter VMs
    pub vms: Option<Vec<VmConfig>>,
}

/// Represents simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// seed of the random generator owned by the run
    pub seed: u64,
    /// length of simulation
    pub simulation_length: f64,
    /// mean time between cloudlet arrivals
    pub cloudlet_interval: f64,
    /// period of pheromone evaporation, zero disables it
    pub evaporation_period: f64,
    /// load balancing policy
    pub policy: String,
    /// datacenter VMs
    pub vms: Vec<VmConfig>,
}

impl SimulationConfig {
    /// Creates simulation config with default parameter values.
    pub fn new() -> Self {
        Self {
            seed: 123,
            simulation_length: 60. * 1000.,
            cloudlet_interval: 100.,
            evaporation_period: 1000.,
            policy: "LeastCompletionTime".to_string(),
            vms: vec![
                VmConfig {
                    cores: 4,
                    bandwidth: 1000,
                    count: Some(2),
                },
                VmConfig {
                    cores: 2,
                    bandwidth: 1000,
                    count: Some(3),
                },
            ],
        }
    }

    /// Creates simulation config by reading parameter values from .yaml file (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, LbError> {
        let content = std::fs::read_to_string(file_name)?;
        Self::from_yaml(&content)
    }

    /// Creates simulation config from YAML string (uses default values if some parameters are absent).
    pub fn from_yaml(content: &str) -> Result<Self, LbError> {
        let data: ConfigDataRaw = serde_yaml::from_str(content)?;
        let default = Self::new();
        let config = Self {
            seed: data.seed.unwrap_or(default.seed),
            simulation_length: data.simulation_length.unwrap_or(default.simulation_length),
            cloudlet_interval: data.cloudlet_interval.unwrap_or(default.cloudlet_interval),
            evaporation_period: data.evaporation_period.unwrap_or(default.evaporation_period),
            policy: data.policy.unwrap_or(default.policy),
            vms: data.vms.unwrap_or(default.vms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that time parameters are usable.
    ///
    /// Lengths and periods must be finite, and a run may not require more than [`MAX_RUN_STEPS`]
    /// arrivals or evaporation ticks on average.
    pub fn validate(&self) -> Result<(), LbError> {
        if !(self.simulation_length >= 0.) || !self.simulation_length.is_finite() {
            return Err(invalid_option("simulation_length", &self.simulation_length.to_string()));
        }
        let arrival_rate = 1. / self.cloudlet_interval;
        if !(self.cloudlet_interval > 0.)
            || !self.cloudlet_interval.is_finite()
            || !arrival_rate.is_finite()
            || self.simulation_length * arrival_rate > MAX_RUN_STEPS
        {
            return Err(invalid_option("cloudlet_interval", &self.cloudlet_interval.to_string()));
        }
        let evaporation_ticks = if self.evaporation_period > 0. {
            self.simulation_length / self.evaporation_period
        } else {
            0.
        };
        if !(self.evaporation_period >= 0.) || !self.evaporation_period.is_finite() || evaporation_ticks > MAX_RUN_STEPS {
            return Err(invalid_option(
                "evaporation_period",
                &self.evaporation_period.to_string(),
            ));
        }
        Ok(())
    }

    /// Returns total VMs count
    pub fn number_of_vms(&self) -> usize {
        self.vms.iter().map(|vm| vm.count.unwrap_or(1) as usize).sum()
    }

    /// Expands VM groups into the list of VM descriptors with sequential indices.
    pub fn vm_specs(&self) -> Vec<VmSpec> {
        let mut result = Vec::with_capacity(self.number_of_vms());
        for group in &self.vms {
            for _ in 0..group.count.unwrap_or(1) {
                result.push(VmSpec::new(result.len(), group.cores, group.bandwidth));
            }
        }
        result
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses config value string, which consists of two parts - name and options.
/// Example: Pheromone[alpha=1.5] parts are name Pheromone and options string "alpha=1.5".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_value() {
        assert_eq!(parse_config_value("MinMin"), ("MinMin".to_string(), None));
        assert_eq!(
            parse_config_value("Pheromone[alpha=0.8,ants=3]"),
            ("Pheromone".to_string(), Some("alpha=0.8,ants=3".to_string()))
        );
    }

    #[test]
    fn test_parse_options() {
        let options = parse_options("option1=0.8, option2=something");
        assert_eq!(options.get("option1").unwrap(), "0.8");
        assert_eq!(options.get("option2").unwrap(), "something");
        assert_eq!(options.get("option3"), None);
    }

    #[test]
    fn test_pheromone_config_options() {
        let config = PheromoneConfig::from_options(&parse_options("alpha=2,ants=3")).unwrap();
        assert_eq!(config.alpha, 2.);
        assert_eq!(config.ant_count, 3);
        assert_eq!(config.evaporation, 0.5);

        assert!(PheromoneConfig::from_options(&parse_options("beta=abc")).is_err());
        assert!(PheromoneConfig::from_options(&parse_options("evaporation=1.5")).is_err());
        assert!(PheromoneConfig::from_options(&parse_options("ants=0")).is_err());
        assert!(PheromoneConfig::from_options(&parse_options("evaporation=NaN")).is_err());
    }

    #[test]
    fn test_pheromone_config_rejects_non_finite_and_negative() {
        for options in ["alpha=NaN", "beta=inf", "unit=-1", "reinforcement=NaN", "floor=-1", "floor=inf"] {
            assert!(
                matches!(
                    PheromoneConfig::from_options(&parse_options(options)),
                    Err(LbError::InvalidOption { .. })
                ),
                "{}",
                options
            );
        }
        let config = PheromoneConfig::from_options(&parse_options("alpha=-0.5,floor=0")).unwrap();
        assert_eq!(config.alpha, -0.5);
        assert_eq!(config.pheromone_floor, 0.);
    }
}
