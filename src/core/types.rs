use serde::{Deserialize, Serialize};

use super::errors::{positive_finite, ConfigError};

/// Product family of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    /// Toilet tissue
    Tissue,
    /// Kitchen towel
    Towel,
    /// Napkins
    Napkin,
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProductKind::Tissue => "tissue",
            ProductKind::Towel => "towel",
            ProductKind::Napkin => "napkin",
        };
        write!(f, "{}", name)
    }
}

/// Optional per-order overrides of the computed operating point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderOverrides {
    /// Reel length in meters, replacing the configured default
    pub max_reel_length: Option<f64>,
    /// Line speed in m/s, replacing the consistency-driven calculation
    pub line_speed: Option<f64>,
}

/// One manufacturing order in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub product: ProductKind,
    /// Target basis weight in g/m2
    pub target_basis_weight: f64,
    /// Target mass in kg
    pub target_mass: f64,
    #[serde(default)]
    pub overrides: OrderOverrides,
}

impl ProductionOrder {
    pub fn new(product: ProductKind, target_basis_weight: f64, target_mass: f64) -> Self {
        Self {
            product,
            target_basis_weight,
            target_mass,
            overrides: OrderOverrides::default(),
        }
    }

    pub fn with_max_reel_length(mut self, length: f64) -> Self {
        self.overrides.max_reel_length = Some(length);
        self
    }

    pub fn with_line_speed(mut self, speed: f64) -> Self {
        self.overrides.line_speed = Some(speed);
        self
    }

    /// Check the order's own invariants; `index` is its queue position
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !positive_finite(self.target_mass) {
            return Err(ConfigError::InvalidTargetMass {
                order_index: index,
                value: self.target_mass,
            });
        }
        if !positive_finite(self.target_basis_weight) {
            return Err(ConfigError::InvalidBasisWeight {
                order_index: index,
                value: self.target_basis_weight,
            });
        }
        if let Some(length) = self.overrides.max_reel_length {
            if !positive_finite(length) {
                return Err(ConfigError::InvalidReelLength(length));
            }
        }
        if let Some(speed) = self.overrides.line_speed {
            if !positive_finite(speed) {
                return Err(ConfigError::InvalidLineSpeed {
                    order_index: index,
                    value: speed,
                });
            }
        }
        Ok(())
    }
}

/// Every kind of stop the event engine knows about.
///
/// Declaration order is the resolution order: concurrent events are
/// sampled and logged in this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    FeltChange,
    MachineFailure,
    WebBreak,
    Cleaning,
    BladeChange,
    ReelChange,
    OrderChangeover,
    /// Opportunistic cleaning appended to an unplanned stop; logged only
    DeepCleaning,
}

impl EventKind {
    /// Kinds counted down by a timer rather than rolled
    pub fn is_scheduled(&self) -> bool {
        matches!(
            self,
            EventKind::FeltChange | EventKind::Cleaning | EventKind::BladeChange
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::FeltChange => "felt change",
            EventKind::MachineFailure => "machine failure",
            EventKind::WebBreak => "web break",
            EventKind::Cleaning => "cleaning",
            EventKind::BladeChange => "blade change",
            EventKind::ReelChange => "reel change",
            EventKind::OrderChangeover => "order changeover",
            EventKind::DeepCleaning => "deep cleaning",
        };
        write!(f, "{}", name)
    }
}

/// Line status as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Producing,
    /// Down for maintenance, failure or a break
    Stopped,
    ReelChange,
    OrderChangeover,
    /// Every order is done
    Finished,
}

/// Order-level state machine of the production program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramState {
    Running,
    Stopped,
}
