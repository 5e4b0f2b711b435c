//! Per-order operating point of the line.
//!
//! Each parameter carries its nominal value and an efficiency factor drawn
//! when the order starts. The efficiencies, together with the felt's,
//! feed the quality index that widens the basis-weight spread of every reel.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::probability::reflected_normal;
use super::types::{ProductKind, ProductionOrder};

/// Stock flow to the headbox, L/s
pub const PULP_FLOW_LPS: f64 = 616.67;
/// Fastest allowed wire speed, m/s
pub const MAX_LINE_SPEED: f64 = 30.0;
/// Candidate stock consistencies, coarsest first
pub const CONSISTENCY_CANDIDATES: [f64; 4] = [0.005, 0.004, 0.003, 0.002];

/// Spread of the line-speed efficiency draw
pub const SPEED_SIGMA: f64 = 0.10;
/// Spread of the other operator-driven efficiency draws
pub const EFFICIENCY_SIGMA: f64 = 0.05;

const SPEED_WEIGHT: f64 = 3.0;
const CONSISTENCY_WEIGHT: f64 = 2.0;
const REFINING_WEIGHT: f64 = 4.0;
const TEMPERATURE_WEIGHT: f64 = 1.0;
const ADDITIVE_WEIGHT: f64 = 1.0;
const FELT_WEIGHT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameter {
    pub value: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdditiveKind {
    Whitener,
    WetStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Additive {
    pub kind: AdditiveKind,
    pub efficiency: f64,
}

/// Fixed settings that depend only on the product family
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecipe {
    /// Refining grade, 0 (unrefined) to 100
    pub refining_grade: f64,
    /// Hood temperature, degrees C
    pub hood_temperature: f64,
    pub additives: Vec<AdditiveKind>,
}

impl ProductRecipe {
    pub fn for_product(product: ProductKind) -> Self {
        match product {
            ProductKind::Tissue => Self {
                refining_grade: 20.0,
                hood_temperature: 410.0,
                additives: vec![AdditiveKind::Whitener],
            },
            ProductKind::Napkin => Self {
                refining_grade: 30.0,
                hood_temperature: 400.0,
                additives: vec![AdditiveKind::Whitener, AdditiveKind::WetStrength],
            },
            ProductKind::Towel => Self {
                refining_grade: 60.0,
                hood_temperature: 450.0,
                additives: vec![AdditiveKind::Whitener, AdditiveKind::WetStrength],
            },
        }
    }
}

/// Theoretical wire speed for a basis weight.
///
/// Picks the coarsest consistency whose speed stays within
/// [`MAX_LINE_SPEED`]; when none does, the finest candidate is used anyway.
/// Returns `(speed m/s, consistency fraction)`.
pub fn line_speed_for(basis_weight: f64, machine_width: f64) -> (f64, f64) {
    let mut chosen = (0.0, CONSISTENCY_CANDIDATES[0]);
    for consistency in CONSISTENCY_CANDIDATES {
        let dry_flow = PULP_FLOW_LPS * consistency;
        let speed = dry_flow / ((basis_weight / 1000.0) * machine_width);
        chosen = (speed, consistency);
        if speed <= MAX_LINE_SPEED {
            break;
        }
    }
    chosen
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameterSet {
    pub line_speed: ProcessParameter,
    pub stock_consistency: ProcessParameter,
    pub refining_grade: ProcessParameter,
    pub hood_temperature: ProcessParameter,
    pub additives: Vec<Additive>,
}

impl ProcessParameterSet {
    /// Operating point for `order`, with fresh efficiency draws
    pub fn for_order<R: Rng + ?Sized>(
        order: &ProductionOrder,
        machine_width: f64,
        rng: &mut R,
    ) -> Self {
        let (speed, consistency) = line_speed_for(order.target_basis_weight, machine_width);
        let speed = order
            .overrides
            .line_speed
            .unwrap_or((speed * 100.0).round() / 100.0);
        let recipe = ProductRecipe::for_product(order.product);

        Self {
            line_speed: ProcessParameter {
                value: speed,
                efficiency: reflected_normal(rng, SPEED_SIGMA),
            },
            stock_consistency: ProcessParameter {
                value: consistency,
                efficiency: reflected_normal(rng, EFFICIENCY_SIGMA),
            },
            refining_grade: ProcessParameter {
                value: recipe.refining_grade,
                efficiency: rng.gen_range(0.60..=1.0),
            },
            hood_temperature: ProcessParameter {
                value: recipe.hood_temperature,
                efficiency: reflected_normal(rng, EFFICIENCY_SIGMA),
            },
            additives: recipe
                .additives
                .into_iter()
                .map(|kind| Additive {
                    kind,
                    efficiency: reflected_normal(rng, EFFICIENCY_SIGMA),
                })
                .collect(),
        }
    }

    /// Weighted mean of every efficiency, felt included
    pub fn weighted_efficiency(&self, felt_efficiency: f64) -> f64 {
        let mut weighted = vec![
            (self.line_speed.efficiency, SPEED_WEIGHT),
            (self.stock_consistency.efficiency, CONSISTENCY_WEIGHT),
            (self.refining_grade.efficiency, REFINING_WEIGHT),
            (self.hood_temperature.efficiency, TEMPERATURE_WEIGHT),
        ];
        weighted.extend(self.additives.iter().map(|a| (a.efficiency, ADDITIVE_WEIGHT)));
        weighted.push((felt_efficiency, FELT_WEIGHT));

        let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
        weighted.iter().map(|(e, w)| e * w).sum::<f64>() / total_weight
    }
}

/// Basis-weight standard deviation for a quality index.
///
/// Grows with the square of the inefficiency: a perfect line gives 0.
pub fn basis_weight_sigma(target_basis_weight: f64, weighted_efficiency: f64) -> f64 {
    let inefficiency = (1.0 - weighted_efficiency).max(0.0);
    target_basis_weight * 0.6 * inefficiency.powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn perfect_set(additives: usize) -> ProcessParameterSet {
        let perfect = ProcessParameter {
            value: 1.0,
            efficiency: 1.0,
        };
        ProcessParameterSet {
            line_speed: perfect,
            stock_consistency: perfect,
            refining_grade: perfect,
            hood_temperature: perfect,
            additives: vec![
                Additive {
                    kind: AdditiveKind::Whitener,
                    efficiency: 1.0
                };
                additives
            ],
        }
    }

    #[test]
    fn test_line_speed_prefers_coarsest_consistency() {
        // 616.67 * 0.005 / (0.018 * 2.75) = 62.3 m/s, too fast; 0.002 gives 24.9 m/s
        let (speed, consistency) = line_speed_for(18.0, 2.75);
        assert_eq!(consistency, 0.002);
        assert!((speed - 24.916).abs() < 0.01);

        // heavy towel grade runs at 0.003: 616.67 * 0.003 / (0.028 * 2.75) = 24.03 m/s
        let (speed, consistency) = line_speed_for(28.0, 2.75);
        assert_eq!(consistency, 0.003);
        assert!(speed <= MAX_LINE_SPEED);
    }

    #[test]
    fn test_line_speed_falls_back_to_finest() {
        let (speed, consistency) = line_speed_for(5.0, 2.75);
        assert_eq!(consistency, 0.002);
        assert!(speed > MAX_LINE_SPEED);
    }

    #[test]
    fn test_recipes() {
        let towel = ProductRecipe::for_product(ProductKind::Towel);
        assert_eq!(towel.refining_grade, 60.0);
        assert_eq!(towel.hood_temperature, 450.0);
        assert_eq!(towel.additives.len(), 2);

        let tissue = ProductRecipe::for_product(ProductKind::Tissue);
        assert_eq!(tissue.additives, vec![AdditiveKind::Whitener]);
    }

    #[test]
    fn test_for_order_draws_bounded_efficiencies() {
        let mut rng = StdRng::seed_from_u64(5);
        let order = ProductionOrder::new(ProductKind::Napkin, 15.0, 20_000.0);
        for _ in 0..200 {
            let set = ProcessParameterSet::for_order(&order, 2.75, &mut rng);
            assert!(set.line_speed.efficiency <= 1.0);
            assert!(set.stock_consistency.efficiency <= 1.0);
            assert!(set.hood_temperature.efficiency <= 1.0);
            assert!((0.60..=1.0).contains(&set.refining_grade.efficiency));
            assert_eq!(set.additives.len(), 2);
            assert!(set.line_speed.value <= MAX_LINE_SPEED);
        }
    }

    #[test]
    fn test_line_speed_override() {
        let mut rng = StdRng::seed_from_u64(5);
        let order = ProductionOrder::new(ProductKind::Tissue, 17.0, 20_000.0).with_line_speed(12.5);
        let set = ProcessParameterSet::for_order(&order, 2.75, &mut rng);
        assert_eq!(set.line_speed.value, 12.5);
    }

    #[test]
    fn test_weighted_efficiency_weights() {
        let set = perfect_set(1);
        assert!((set.weighted_efficiency(1.0) - 1.0).abs() < 1e-12);

        // felt counts 3 out of 3 + 2 + 4 + 1 + 1 + 3 = 14
        let expected = (14.0 - 3.0 * 0.4) / 14.0;
        assert!((set.weighted_efficiency(0.6) - expected).abs() < 1e-12);

        let mut set = perfect_set(2);
        set.refining_grade.efficiency = 0.5;
        // refining counts 4 out of 15
        let expected = (15.0 - 4.0 * 0.5) / 15.0;
        assert!((set.weighted_efficiency(1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_basis_weight_sigma_is_quadratic() {
        assert_eq!(basis_weight_sigma(18.0, 1.0), 0.0);
        assert!((basis_weight_sigma(18.0, 0.9) - 18.0 * 0.6 * 0.01).abs() < 1e-12);
        assert!((basis_weight_sigma(18.0, 0.8) - 18.0 * 0.6 * 0.04).abs() < 1e-12);
        assert_eq!(basis_weight_sigma(18.0, 1.2), 0.0);
    }
}
