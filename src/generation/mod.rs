pub mod monitor;

pub use monitor::{package_file_name, GenerationMonitor, WatchOutcome};
