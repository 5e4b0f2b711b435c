use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::machine::ContinuousMachine;
use crate::core::types::EventKind;

/// Headline figures of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed the run was built with, when known
    pub seed: Option<u64>,
    pub ticks: u64,
    pub simulated_seconds: u64,
    /// Seconds spent with the line down
    pub lost_seconds: u64,
    /// Total paper credited to orders, kg
    pub produced_mass: f64,
    pub reel_count: usize,
    pub orders_completed: usize,
    pub finished: bool,
    pub events_by_kind: BTreeMap<EventKind, usize>,
    /// Mean absolute gap between drawn and target basis weight, g/m2
    pub mean_basis_weight_deviation: f64,
}

impl RunSummary {
    pub fn from_machine(machine: &ContinuousMachine, ticks: u64, seed: Option<u64>) -> Self {
        let reels = machine.completed_reels();
        let mean_basis_weight_deviation = if reels.is_empty() {
            0.0
        } else {
            reels
                .iter()
                .map(|r| (r.basis_weight - r.target_basis_weight).abs())
                .sum::<f64>()
                / reels.len() as f64
        };

        Self {
            seed,
            ticks,
            simulated_seconds: machine.elapsed_seconds(),
            lost_seconds: machine.lost_seconds(),
            produced_mass: machine.accumulated_mass_total(),
            reel_count: reels.len(),
            orders_completed: machine.program().current_order_index()
                + usize::from(machine.is_finished()),
            finished: machine.is_finished(),
            events_by_kind: machine.events().counts_by_kind(),
            mean_basis_weight_deviation,
        }
    }

    /// Share of simulated time the line was down, 0 to 1
    pub fn downtime_ratio(&self) -> f64 {
        if self.simulated_seconds == 0 {
            return 0.0;
        }
        self.lost_seconds as f64 / self.simulated_seconds as f64
    }
}
