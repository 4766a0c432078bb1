//! Load balancing policy implementations.

pub mod ant;
pub mod least_allocation;
pub mod least_completion_time;
pub mod pheromone;
