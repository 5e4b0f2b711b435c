//! Press felt wear model.
//!
//! Wear drives three derived quantities (condition, efficiency and the
//! per-tick breakage hazard) which are always recomputed together from
//! the current wear fraction.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::probability::tick_probability;

/// Shortest rated felt life, in hours (18 days)
pub const MIN_RATED_LIFE_HOURS: u32 = 432;
/// Longest rated felt life, in hours (20 days)
pub const MAX_RATED_LIFE_HOURS: u32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeltCondition {
    Excellent,
    Good,
    Degraded,
    Critical,
}

impl FeltCondition {
    pub fn from_wear(wear_fraction: f64) -> Self {
        if wear_fraction >= 0.90 {
            FeltCondition::Critical
        } else if wear_fraction >= 0.80 {
            FeltCondition::Degraded
        } else if wear_fraction >= 0.50 {
            FeltCondition::Good
        } else {
            FeltCondition::Excellent
        }
    }

    /// Efficiency multiplier contributed to the quality index
    pub fn efficiency(&self) -> f64 {
        match self {
            FeltCondition::Critical => 0.60,
            FeltCondition::Degraded => 0.80,
            FeltCondition::Good => 0.95,
            FeltCondition::Excellent => 1.00,
        }
    }

    /// Chance (in %) of breaking over the rated life window
    pub fn breakage_total_percent(&self) -> f64 {
        match self {
            FeltCondition::Critical => 99.99,
            FeltCondition::Degraded => 10.0,
            FeltCondition::Good => 5.0,
            FeltCondition::Excellent => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeltUnit {
    wear_fraction: f64,
    rated_life_hours: u32,
    used_hours: f64,
    tick_seconds: u64,
    condition: FeltCondition,
    efficiency: f64,
    breakage_probability_per_tick: f64,
}

impl FeltUnit {
    /// A felt already in service: random wear, random rated life
    pub fn new<R: Rng + ?Sized>(rng: &mut R, tick_seconds: u64) -> Self {
        let wear_fraction = rng.gen::<f64>();
        let rated_life_hours = rng.gen_range(MIN_RATED_LIFE_HOURS..=MAX_RATED_LIFE_HOURS);
        Self::with_wear(wear_fraction, rated_life_hours, tick_seconds)
    }

    /// A felt at a known wear level; `wear_fraction` is clamped to [0, 1]
    pub fn with_wear(wear_fraction: f64, rated_life_hours: u32, tick_seconds: u64) -> Self {
        let wear_fraction = wear_fraction.clamp(0.0, 1.0);
        let mut felt = Self {
            wear_fraction,
            rated_life_hours,
            used_hours: wear_fraction * rated_life_hours as f64,
            tick_seconds,
            condition: FeltCondition::Excellent,
            efficiency: 1.0,
            breakage_probability_per_tick: 0.0,
        };
        felt.refresh();
        felt
    }

    fn refresh(&mut self) {
        self.condition = FeltCondition::from_wear(self.wear_fraction);
        self.efficiency = self.condition.efficiency();
        self.breakage_probability_per_tick = tick_probability(
            self.tick_seconds as f64,
            self.condition.breakage_total_percent(),
            self.rated_life_hours as f64 * 3600.0,
        );
    }

    /// Credit `tick_seconds` of running time to the felt
    pub fn advance_wear(&mut self, tick_seconds: u64) {
        self.used_hours += tick_seconds as f64 / 3600.0;
        self.wear_fraction = if self.rated_life_hours == 0 {
            1.0
        } else {
            (self.used_hours / self.rated_life_hours as f64).min(1.0)
        };
        self.refresh();
    }

    /// Install a new felt
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.wear_fraction = 0.0;
        self.rated_life_hours = rng.gen_range(MIN_RATED_LIFE_HOURS..=MAX_RATED_LIFE_HOURS);
        self.used_hours = 0.0;
        self.refresh();
    }

    /// Whole seconds of rated life left, used to arm the end-of-life timer
    pub fn remaining_life_seconds(&self) -> i64 {
        ((self.rated_life_hours as f64 - self.used_hours) * 3600.0) as i64
    }

    pub fn wear_fraction(&self) -> f64 {
        self.wear_fraction
    }

    pub fn rated_life_hours(&self) -> u32 {
        self.rated_life_hours
    }

    pub fn used_hours(&self) -> f64 {
        self.used_hours
    }

    pub fn condition(&self) -> FeltCondition {
        self.condition
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn breakage_probability_per_tick(&self) -> f64 {
        self.breakage_probability_per_tick
    }
}
