pub mod config;
pub mod replications;
pub mod simulation_engine;
pub mod summary;

// Re-export commonly used types
pub use config::{ConcurrencyMode, MachineConfig};
pub use replications::run_replications;
pub use simulation_engine::{SimulationEngine, SimulationObserver};
pub use summary::RunSummary;
