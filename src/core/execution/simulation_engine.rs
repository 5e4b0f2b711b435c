use log::{debug, warn};

use crate::core::errors::ConfigError;
use crate::core::execution::config::MachineConfig;
use crate::core::execution::summary::RunSummary;
use crate::core::machine::{ContinuousMachine, TickOutcome};
use crate::core::types::ProductionOrder;

/// Observer trait for simulation progress
pub trait SimulationObserver {
    /// Called after every tick
    fn on_tick(&mut self, machine: &ContinuousMachine, outcome: &TickOutcome);

    /// Called when an order has been completed
    fn on_order_complete(&mut self, _machine: &ContinuousMachine, _order_index: usize) {}
}

/// Drives a machine until every order is done or the tick cap is hit
pub struct SimulationEngine {
    machine: ContinuousMachine,
    max_ticks: Option<u64>,
    ticks: u64,
    seed: Option<u64>,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl SimulationEngine {
    /// Create a new SimulationEngine with optional tick limit
    pub fn new(machine: ContinuousMachine, max_ticks: Option<u64>) -> Self {
        Self {
            machine,
            max_ticks,
            ticks: 0,
            seed: None,
            observers: Vec::new(),
        }
    }

    /// Build the machine from `orders` and `config`, tick cap included
    pub fn from_config(
        orders: Vec<ProductionOrder>,
        config: &MachineConfig,
    ) -> Result<Self, ConfigError> {
        let machine = ContinuousMachine::new(orders, config)?;
        let mut engine = Self::new(machine, config.max_ticks);
        engine.seed = config.seed;
        Ok(engine)
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// Run to completion or to the tick cap
    pub fn run(&mut self) -> RunSummary {
        while !self.machine.is_finished() {
            if let Some(max) = self.max_ticks {
                if self.ticks >= max {
                    warn!(
                        "tick cap of {} reached with order {} of {} still running",
                        max,
                        self.machine.program().current_order_index() + 1,
                        self.machine.program().orders().len()
                    );
                    break;
                }
            }
            self.step();
        }
        self.summary()
    }

    /// Advance the machine by one tick and notify observers
    pub fn step(&mut self) -> TickOutcome {
        let outcome = self.machine.advance_one_tick();
        if outcome == TickOutcome::Finished {
            return outcome;
        }
        self.ticks += 1;

        for observer in &mut self.observers {
            observer.on_tick(&self.machine, &outcome);
        }
        if let TickOutcome::OrderCompleted { order_index, .. } = outcome {
            debug!(
                "order {} done at t={}s",
                order_index + 1,
                self.machine.elapsed_seconds()
            );
            for observer in &mut self.observers {
                observer.on_order_complete(&self.machine, order_index);
            }
        }
        outcome
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_machine(&self.machine, self.ticks, self.seed)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn machine(&self) -> &ContinuousMachine {
        &self.machine
    }

    pub fn into_machine(self) -> ContinuousMachine {
        self.machine
    }
}
