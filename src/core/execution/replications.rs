//! Independent seeded runs of the same order queue.
//!
//! Each seed gets its own machine and generator, so replications never
//! share state and can run on a Rayon pool without changing their results.

use log::info;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::core::errors::ConfigError;
use crate::core::execution::config::{ConcurrencyMode, MachineConfig};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::execution::summary::RunSummary;
use crate::core::types::ProductionOrder;

/// Run one machine per seed and collect their summaries in seed order
pub fn run_replications(
    orders: &[ProductionOrder],
    config: &MachineConfig,
    seeds: &[u64],
) -> Result<Vec<RunSummary>, ConfigError> {
    config.validate()?;

    let run_one = |seed: u64| -> Result<RunSummary, ConfigError> {
        let config = config.clone().with_seed(seed);
        let mut engine = SimulationEngine::from_config(orders.to_vec(), &config)?;
        Ok(engine.run())
    };

    info!(
        "running {} replications ({:?})",
        seeds.len(),
        config.concurrency_mode
    );

    match config.concurrency_mode {
        ConcurrencyMode::Sequential => seeds.iter().map(|&seed| run_one(seed)).collect(),
        ConcurrencyMode::Rayon => {
            let run_all = || {
                seeds
                    .par_iter()
                    .map(|&seed| run_one(seed))
                    .collect::<Result<Vec<_>, _>>()
            };
            match config.thread_pool_size {
                Some(threads) => {
                    let pool = ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
                    pool.install(run_all)
                }
                None => run_all(),
            }
        }
    }
}
