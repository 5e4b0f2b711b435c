use rand::Rng;
use serde::{Deserialize, Serialize};

use super::probability::sample_normal;
use super::types::ProductKind;

/// Default reel length, m
pub const DEFAULT_MAX_REEL_LENGTH: f64 = 50_000.0;
/// Reel-up speed as a fraction of wire speed
pub const REEL_UP_SPEED_RATIO: f64 = 0.85;

/// The roll currently being wound.
///
/// Basis weight is drawn once, when the reel is started, and holds for
/// its whole length.
#[derive(Debug, Clone)]
pub struct Reel {
    produced_length: f64,
    accumulated_mass: f64,
    target_basis_weight: f64,
    basis_weight: f64,
    sigma: f64,
    max_length: f64,
    is_complete: bool,
    quality_index: f64,
}

impl Reel {
    /// Start a reel, drawing its basis weight from Normal(target, sigma)
    pub fn new<R: Rng + ?Sized>(
        target_basis_weight: f64,
        sigma: f64,
        quality_index: f64,
        max_length: f64,
        rng: &mut R,
    ) -> Self {
        let basis_weight = sample_normal(rng, target_basis_weight, sigma).max(0.0);
        let mut reel = Self::with_basis_weight(target_basis_weight, basis_weight, max_length);
        reel.sigma = sigma;
        reel.quality_index = quality_index;
        reel
    }

    /// Start a reel with a known basis weight
    pub fn with_basis_weight(target_basis_weight: f64, basis_weight: f64, max_length: f64) -> Self {
        Self {
            produced_length: 0.0,
            accumulated_mass: 0.0,
            target_basis_weight,
            basis_weight,
            sigma: 0.0,
            max_length,
            is_complete: false,
            quality_index: 1.0,
        }
    }

    /// Wind one tick of paper; returns the mass added, in kg
    pub fn accumulate(&mut self, tick_seconds: u64, line_speed: f64, machine_width: f64) -> f64 {
        let reel_speed = line_speed * REEL_UP_SPEED_RATIO;
        let delta_length = reel_speed * tick_seconds as f64;
        let delta_mass = delta_length * self.basis_weight * machine_width / 1000.0;

        self.produced_length += delta_length;
        self.accumulated_mass += delta_mass;
        if self.produced_length >= self.max_length {
            self.is_complete = true;
        }
        delta_mass
    }

    pub fn produced_length(&self) -> f64 {
        self.produced_length
    }

    pub fn accumulated_mass(&self) -> f64 {
        self.accumulated_mass
    }

    pub fn target_basis_weight(&self) -> f64 {
        self.target_basis_weight
    }

    pub fn basis_weight(&self) -> f64 {
        self.basis_weight
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn quality_index(&self) -> f64 {
        self.quality_index
    }
}

/// A finished reel, kept for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelRecord {
    pub order_index: usize,
    pub product: ProductKind,
    /// 1-based position of the reel within its order
    pub reel_index: u32,
    pub target_basis_weight: f64,
    pub basis_weight: f64,
    pub length: f64,
    pub mass: f64,
    pub quality_index: f64,
    /// Simulated second at which the reel was cut
    pub completed_at: u64,
}

impl ReelRecord {
    pub fn from_reel(
        reel: &Reel,
        order_index: usize,
        product: ProductKind,
        reel_index: u32,
        completed_at: u64,
    ) -> Self {
        Self {
            order_index,
            product,
            reel_index,
            target_basis_weight: reel.target_basis_weight(),
            basis_weight: reel.basis_weight(),
            length: reel.produced_length(),
            mass: reel.accumulated_mass(),
            quality_index: reel.quality_index(),
            completed_at,
        }
    }
}
