/// Simulated time, in whole seconds since the start of the run.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    elapsed_seconds: u64,
    tick_seconds: u64,
}

impl SimulationClock {
    pub fn new(tick_seconds: u64) -> Self {
        Self {
            elapsed_seconds: 0,
            tick_seconds,
        }
    }

    /// Move forward by one tick
    pub fn advance(&mut self) {
        self.elapsed_seconds += self.tick_seconds;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn tick_seconds(&self) -> u64 {
        self.tick_seconds
    }
}
