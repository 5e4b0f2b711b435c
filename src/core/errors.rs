/// Errors raised while building a machine or a run from external input.
///
/// Every variant is fatal and surfaces before the first tick. Once a
/// machine exists, ticking it cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The order queue has no orders
    EmptyOrderQueue,
    /// An order's target mass is zero, negative or not finite
    InvalidTargetMass { order_index: usize, value: f64 },
    /// An order's target basis weight is zero, negative or not finite
    InvalidBasisWeight { order_index: usize, value: f64 },
    /// An order's line-speed override is zero, negative or not finite
    InvalidLineSpeed { order_index: usize, value: f64 },
    /// The tick duration is zero seconds
    ZeroTickDuration,
    /// The machine width is zero, negative or not finite
    InvalidMachineWidth(f64),
    /// A reel length (default or order override) is zero, negative or not finite
    InvalidReelLength(f64),
    /// The rayon thread pool for parallel replications could not be built
    ThreadPool(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyOrderQueue => write!(f, "Order queue is empty"),
            ConfigError::InvalidTargetMass { order_index, value } => write!(
                f,
                "Order {} has invalid target mass {} kg (must be > 0)",
                order_index, value
            ),
            ConfigError::InvalidBasisWeight { order_index, value } => write!(
                f,
                "Order {} has invalid target basis weight {} g/m2 (must be > 0)",
                order_index, value
            ),
            ConfigError::InvalidLineSpeed { order_index, value } => write!(
                f,
                "Order {} has invalid line speed override {} m/s (must be > 0)",
                order_index, value
            ),
            ConfigError::ZeroTickDuration => write!(f, "Tick duration must be greater than 0"),
            ConfigError::InvalidMachineWidth(width) => {
                write!(f, "Machine width must be greater than 0, got {}", width)
            }
            ConfigError::InvalidReelLength(length) => {
                write!(f, "Reel length must be greater than 0, got {}", length)
            }
            ConfigError::ThreadPool(msg) => write!(f, "Thread pool error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub(crate) fn positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
