/// Collects (x, y) progress points for plotting.
///
/// `x` is simulated seconds since the last reset and advances by one tick
/// per point; the series always starts at the origin.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    name: String,
    tick_seconds: u64,
    x: Vec<u64>,
    y: Vec<f64>,
}

impl ProgressTracker {
    pub fn new(name: impl Into<String>, tick_seconds: u64) -> Self {
        Self {
            name: name.into(),
            tick_seconds,
            x: vec![0],
            y: vec![0.0],
        }
    }

    /// Append the value reached at the end of the next tick
    pub fn record(&mut self, y: f64) {
        let next_x = self.x.last().copied().unwrap_or(0) + self.tick_seconds;
        self.x.push(next_x);
        self.y.push(y);
    }

    /// Drop every point except the origin
    pub fn reset(&mut self) {
        self.x.clear();
        self.y.clear();
        self.x.push(0);
        self.y.push(0.0);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Number of points, origin included; never below 1
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false: the origin survives every reset
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn last(&self) -> Option<(u64, f64)> {
        self.x.last().copied().zip(self.y.last().copied())
    }
}
