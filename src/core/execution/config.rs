//! Configuration for papersim runs
//!
//! The fixed tick, the machine geometry and the random seed of a run, plus
//! how independent replications are scheduled.
use serde::{Deserialize, Serialize};

use crate::core::errors::{positive_finite, ConfigError};
use crate::core::reel::DEFAULT_MAX_REEL_LENGTH;

/// Default simulated seconds per tick
pub const DEFAULT_TICK_SECONDS: u64 = 5;
/// Default machine width, m
pub const DEFAULT_MACHINE_WIDTH: f64 = 2.75;

/// How independent replications are executed
///
/// A single machine always ticks sequentially; this only decides whether
/// several seeded runs share one thread or a Rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    #[default]
    Sequential,
    /// Replications run in parallel on a Rayon pool
    Rayon,
}

/// Configuration for a simulated production line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Simulated seconds per tick
    pub tick_seconds: u64,
    /// Machine width in meters
    pub machine_width: f64,
    /// Reel length in meters unless an order overrides it
    pub max_reel_length: f64,
    /// Seed for the machine's random source; `None` draws from entropy
    pub seed: Option<u64>,
    /// Stop a driven run after this many ticks
    pub max_ticks: Option<u64>,
    /// How replications are scheduled
    pub concurrency_mode: ConcurrencyMode,
    /// Rayon pool size for replications; only relevant in `Rayon` mode
    pub thread_pool_size: Option<usize>,
}

impl MachineConfig {
    /// Create a configuration with default values
    ///
    /// 5 s ticks, a 2.75 m machine, 50 km reels, no seed, no tick cap,
    /// sequential replications.
    pub fn new() -> Self {
        Self {
            tick_seconds: DEFAULT_TICK_SECONDS,
            machine_width: DEFAULT_MACHINE_WIDTH,
            max_reel_length: DEFAULT_MAX_REEL_LENGTH,
            seed: None,
            max_ticks: None,
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    pub fn with_tick_seconds(mut self, seconds: u64) -> Self {
        self.tick_seconds = seconds;
        self
    }

    pub fn with_machine_width(mut self, width: f64) -> Self {
        self.machine_width = width;
        self
    }

    pub fn with_max_reel_length(mut self, length: f64) -> Self {
        self.max_reel_length = length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Set the concurrency mode used for replications
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the Rayon pool size for replications
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_seconds == 0 {
            return Err(ConfigError::ZeroTickDuration);
        }
        if !positive_finite(self.machine_width) {
            return Err(ConfigError::InvalidMachineWidth(self.machine_width));
        }
        if !positive_finite(self.max_reel_length) {
            return Err(ConfigError::InvalidReelLength(self.max_reel_length));
        }
        if self.thread_pool_size == Some(0) {
            return Err(ConfigError::ThreadPool(
                "thread pool size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MachineConfig::default();
        assert_eq!(config.tick_seconds, 5);
        assert_eq!(config.machine_width, 2.75);
        assert_eq!(config.max_reel_length, 50_000.0);
        assert_eq!(config.seed, None);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.thread_pool_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MachineConfig::new()
            .with_tick_seconds(10)
            .with_machine_width(5.4)
            .with_seed(42)
            .with_max_ticks(1_000)
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(4);

        assert_eq!(config.tick_seconds, 10);
        assert_eq!(config.machine_width, 5.4);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_ticks, Some(1_000));
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.thread_pool_size, Some(4));
    }

    #[test]
    fn test_validation() {
        let config = MachineConfig::new().with_tick_seconds(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickDuration));

        let config = MachineConfig::new().with_machine_width(0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMachineWidth(0.0)));

        let config = MachineConfig::new().with_max_reel_length(-5.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidReelLength(-5.0)));

        let config = MachineConfig::new().with_thread_pool_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::ThreadPool(_))));
    }
}
