#![doc = include_str!("../readme.md")]

pub mod config;
pub mod controller;
pub mod dispatch_log;
pub mod error;
pub mod policies;
pub mod policy;
pub mod simulation;
pub mod tracker;
pub mod vm;
