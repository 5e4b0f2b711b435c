pub mod core;

// Re-export commonly used types
pub use crate::core::errors::ConfigError;
pub use crate::core::events::{EventContext, EventEngine, EventRecord, Resolution};
pub use crate::core::execution::{
    run_replications, ConcurrencyMode, MachineConfig, RunSummary, SimulationEngine,
    SimulationObserver,
};
pub use crate::core::felt::{FeltCondition, FeltUnit};
pub use crate::core::machine::{ContinuousMachine, TickOutcome};
pub use crate::core::parameters::ProcessParameterSet;
pub use crate::core::program::{OrderAdvance, ProductionProgram};
pub use crate::core::reel::{Reel, ReelRecord};
pub use crate::core::tracker::ProgressTracker;
pub use crate::core::types::{
    EventKind, MachineState, OrderOverrides, ProductKind, ProductionOrder, ProgramState,
};
