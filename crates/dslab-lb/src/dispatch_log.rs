//! Trace of dispatching decisions made during simulation.

use std::fs::File;

use serde::Serialize;

use crate::error::LbError;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DispatchEntry {
    pub timestamp: f64,
    pub cloudlet_id: u64,
    pub vm: usize,
    pub policy: String,
}

/// Collects dispatching decisions and saves them as CSV.
///
/// The log is a diagnostic side channel, a disabled log silently drops all entries.
pub struct DispatchLog {
    entries: Vec<DispatchEntry>,
    enabled: bool,
}

impl Default for DispatchLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            enabled: true,
        }
    }
}

impl DispatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            entries: Vec::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, timestamp: f64, cloudlet_id: u64, vm: usize, policy: &str) {
        if !self.enabled {
            return;
        }
        self.entries.push(DispatchEntry {
            timestamp,
            cloudlet_id,
            vm,
            policy: policy.to_string(),
        });
    }

    pub fn entries(&self) -> &[DispatchEntry] {
        &self.entries
    }

    pub fn save(&self, path: &str) -> Result<(), LbError> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for entry in &self.entries {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
