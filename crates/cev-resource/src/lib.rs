//! CPU and memory sampling for evaluation child processes.

pub mod monitor;

pub use monitor::{ResourceMonitor, ResourceStats, SAMPLE_INTERVAL};
