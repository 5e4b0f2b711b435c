//! Sampling helpers shared by the felt, program, reel and event models.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Converts a total probability over a time window into a per-tick hazard.
///
/// `total_percent` is the chance (in %) that the event happens at least once
/// over `window_seconds`. The returned value `p` satisfies
/// `1 - (1 - p)^(window / tick) == total`, i.e. the tick rolls compound back
/// to the total over the window. Empty windows and non-positive totals give 0.
pub fn tick_probability(tick_seconds: f64, total_percent: f64, window_seconds: f64) -> f64 {
    if window_seconds <= 0.0 || total_percent <= 0.0 {
        return 0.0;
    }
    let total = (total_percent / 100.0).min(1.0);
    1.0 - (1.0 - total).powf(tick_seconds / window_seconds)
}

/// Bernoulli trial: true with probability `p`
pub fn roll<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Draw from Normal(mean, std_dev).
///
/// A degenerate deviation (negative or not finite) yields the mean.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    }
}

/// Normal(1, sigma) folded at 1: values above 1 are mirrored to `2 - x`.
///
/// Never exceeds 1, with a tail toward low efficiency.
pub fn reflected_normal<R: Rng + ?Sized>(rng: &mut R, sigma: f64) -> f64 {
    let x = sample_normal(rng, 1.0, sigma);
    if x > 1.0 {
        2.0 - x
    } else {
        x
    }
}
