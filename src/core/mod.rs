pub mod clock;
pub mod errors;
pub mod events;
pub mod execution;
pub mod felt;
pub mod machine;
pub mod parameters;
pub mod probability;
pub mod program;
pub mod reel;
pub mod tracker;
pub mod types;
