//! Load balancing errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LbError {
    #[error("no VM available")]
    NoVmAvailable,

    #[error("VM index {index} is out of range (VM count = {count})")]
    VmIndexOutOfRange { index: usize, count: usize },

    #[error("policy is not initialized, call initialize() before selecting VMs")]
    NotInitialized,

    #[error("simulation run has already finished")]
    RunFinished,

    #[error("unknown load balancing policy: {0}")]
    UnknownPolicy(String),

    #[error("invalid value for option {option}: {value}")]
    InvalidOption { option: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("can't write CSV: {0}")]
    Csv(#[from] csv::Error),
}
