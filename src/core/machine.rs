//! The continuous tissue machine: owns every component and drives one tick.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::SimulationClock;
use super::errors::ConfigError;
use super::events::{EventContext, EventEngine, EventRecord, Resolution};
use super::execution::config::MachineConfig;
use super::felt::{FeltCondition, FeltUnit};
use super::parameters::{basis_weight_sigma, ProcessParameterSet};
use super::program::{OrderAdvance, ProductionProgram};
use super::reel::{Reel, ReelRecord};
use super::tracker::ProgressTracker;
use super::types::{EventKind, MachineState, ProductionOrder, ProgramState};

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The line was down; nothing was produced
    Downtime { remaining: u64 },
    /// A stop started this tick
    Stopped(Resolution),
    /// Paper was wound on the current reel
    Produced { delta_mass: f64 },
    /// A reel was cut and the reel change resolved
    ReelCompleted {
        record: ReelRecord,
        resolution: Resolution,
    },
    /// The current order finished; `next` tells whether another one started
    OrderCompleted {
        order_index: usize,
        record: ReelRecord,
        resolution: Resolution,
        next: OrderAdvance,
    },
    /// Every order is done; the machine no longer changes
    Finished,
}

#[derive(Debug, Clone)]
pub struct ContinuousMachine {
    clock: SimulationClock,
    felt: FeltUnit,
    program: ProductionProgram,
    events: EventEngine,
    reel: Reel,
    rng: StdRng,
    machine_width: f64,
    max_reel_length: f64,
    state: MachineState,
    lost_seconds: u64,
    reels_per_order: Vec<u32>,
    completed_reels: Vec<ReelRecord>,
    order_progress: ProgressTracker,
    run_progress: ProgressTracker,
}

impl ContinuousMachine {
    /// Build a machine, seeding its generator from `config.seed` or entropy
    pub fn new(orders: Vec<ProductionOrder>, config: &MachineConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(orders, config, rng)
    }

    /// Build a machine around a caller-provided generator
    pub fn with_rng(
        orders: Vec<ProductionOrder>,
        config: &MachineConfig,
        mut rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let tick_seconds = config.tick_seconds;

        let felt = FeltUnit::new(&mut rng, tick_seconds);
        let program = ProductionProgram::new(orders, config.machine_width, &mut rng)?;
        let events = EventEngine::new(&felt, tick_seconds, &mut rng);
        let reel = Self::setup_reel(&program, &felt, config.max_reel_length, &mut rng);
        let order_count = program.orders().len();

        debug!(
            "felt at {:.0}% wear ({:?}), rated {}h",
            felt.wear_fraction() * 100.0,
            felt.condition(),
            felt.rated_life_hours()
        );

        Ok(Self {
            clock: SimulationClock::new(tick_seconds),
            felt,
            program,
            events,
            reel,
            rng,
            machine_width: config.machine_width,
            max_reel_length: config.max_reel_length,
            state: MachineState::Producing,
            lost_seconds: 0,
            reels_per_order: vec![0; order_count],
            completed_reels: Vec::new(),
            order_progress: ProgressTracker::new("order progress", tick_seconds),
            run_progress: ProgressTracker::new("run progress", tick_seconds),
        })
    }

    /// Start a reel for the current order at the current quality index
    fn setup_reel(
        program: &ProductionProgram,
        felt: &FeltUnit,
        default_max_length: f64,
        rng: &mut StdRng,
    ) -> Reel {
        let order = program.current_order();
        let quality_index = program.parameters().weighted_efficiency(felt.efficiency());
        let sigma = basis_weight_sigma(order.target_basis_weight, quality_index);
        let max_length = order.overrides.max_reel_length.unwrap_or(default_max_length);
        Reel::new(order.target_basis_weight, sigma, quality_index, max_length, rng)
    }

    fn start_new_reel(&mut self) {
        self.reel = Self::setup_reel(&self.program, &self.felt, self.max_reel_length, &mut self.rng);
    }

    /// Snapshot handed to the event engine for logging
    pub fn event_context(&self) -> EventContext {
        let order_index = self.program.current_order_index();
        EventContext {
            order_index,
            product: self.program.current_order().product,
            reel_index: self.reels_per_order[order_index],
            simulated_time: self.clock.elapsed_seconds(),
        }
    }

    fn record_progress(&mut self) {
        self.order_progress.record(self.program.order_progress_percent());
        self.run_progress
            .record(self.program.accumulated_mass_total() / 1000.0);
    }

    /// Run one tick: downtime first, then event evaluation, then production
    pub fn advance_one_tick(&mut self) -> TickOutcome {
        if self.state == MachineState::Finished {
            return TickOutcome::Finished;
        }

        self.clock.advance();
        let tick_seconds = self.clock.tick_seconds();

        if self.events.total_downtime_remaining() > 0 {
            self.lost_seconds += tick_seconds;
            let remaining = self.events.consume_downtime(tick_seconds);
            self.record_progress();
            if remaining == 0 {
                self.events.reset(&mut self.felt, &mut self.rng);
                self.state = MachineState::Producing;
            }
            return TickOutcome::Downtime { remaining };
        }

        let ctx = self.event_context();
        let scheduled = self.events.evaluate_scheduled(&ctx, &mut self.rng);
        let random = self.events.evaluate_random(
            self.felt.breakage_probability_per_tick(),
            &ctx,
            &mut self.rng,
        );
        if let Some(resolution) = random.or(scheduled) {
            if resolution.downtime > 0 {
                self.state = MachineState::Stopped;
                self.record_progress();
                return TickOutcome::Stopped(resolution);
            }
            // a stop that sampled to zero seconds is over immediately
            self.events.reset(&mut self.felt, &mut self.rng);
        }

        self.state = MachineState::Producing;
        self.felt.advance_wear(tick_seconds);
        let line_speed = self.program.parameters().line_speed.value;
        let delta_mass = self
            .reel
            .accumulate(tick_seconds, line_speed, self.machine_width);
        let reel_complete = self.reel.is_complete();
        self.program.absorb_mass(delta_mass, reel_complete);
        self.record_progress();
        trace!(
            "t={}s +{:.3} kg, reel at {:.0} m",
            self.clock.elapsed_seconds(),
            delta_mass,
            self.reel.produced_length()
        );

        if reel_complete {
            self.complete_reel()
        } else {
            TickOutcome::Produced { delta_mass }
        }
    }

    fn complete_reel(&mut self) -> TickOutcome {
        // the last tick's mass is already credited; settle the order check against it
        self.program.absorb_mass(0.0, true);

        let order_index = self.program.current_order_index();
        self.reels_per_order[order_index] += 1;
        let record = ReelRecord::from_reel(
            &self.reel,
            order_index,
            self.program.current_order().product,
            self.reels_per_order[order_index],
            self.clock.elapsed_seconds(),
        );
        debug!(
            "reel {} of order {} cut: {:.0} m, {:.1} kg, {:.2} g/m2",
            record.reel_index,
            order_index + 1,
            record.length,
            record.mass,
            record.basis_weight
        );
        self.completed_reels.push(record.clone());
        self.felt.advance_wear(self.clock.tick_seconds());

        match self.program.state() {
            ProgramState::Running => {
                self.state = MachineState::ReelChange;
                if self.felt.condition() == FeltCondition::Critical {
                    self.events.schedule(EventKind::FeltChange);
                }
                self.events.schedule(EventKind::ReelChange);
                let ctx = self.event_context();
                let resolution = self.events.resolve(&ctx, &mut self.rng);
                self.start_new_reel();
                TickOutcome::ReelCompleted { record, resolution }
            }
            ProgramState::Stopped => {
                self.state = MachineState::OrderChangeover;
                self.events.schedule(EventKind::OrderChangeover);
                let ctx = self.event_context();
                let resolution = self.events.resolve(&ctx, &mut self.rng);
                let next = self.program.advance_to_next_order(&mut self.rng);
                match next {
                    OrderAdvance::Started(_) => {
                        self.order_progress.reset();
                        self.start_new_reel();
                    }
                    OrderAdvance::QueueExhausted => {
                        // nothing follows the last changeover; it stays logged but is never served
                        self.events.consume_downtime(u64::MAX);
                        self.events.reset(&mut self.felt, &mut self.rng);
                        self.state = MachineState::Finished;
                        info!(
                            "all {} orders complete after {}s ({}s lost), {:.1} t produced",
                            self.program.orders().len(),
                            self.clock.elapsed_seconds(),
                            self.lost_seconds,
                            self.program.accumulated_mass_total() / 1000.0
                        );
                    }
                }
                TickOutcome::OrderCompleted {
                    order_index,
                    record,
                    resolution,
                    next,
                }
            }
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn program_state(&self) -> ProgramState {
        self.program.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state == MachineState::Finished
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn tick_seconds(&self) -> u64 {
        self.clock.tick_seconds()
    }

    pub fn machine_width(&self) -> f64 {
        self.machine_width
    }

    pub fn reel(&self) -> &Reel {
        &self.reel
    }

    pub fn felt(&self) -> &FeltUnit {
        &self.felt
    }

    pub fn program(&self) -> &ProductionProgram {
        &self.program
    }

    pub fn parameters(&self) -> &ProcessParameterSet {
        self.program.parameters()
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }

    pub fn active_events(&self) -> Vec<EventKind> {
        self.events.active_events().collect()
    }

    pub fn event_log(&self) -> &[EventRecord] {
        self.events.event_log()
    }

    /// Seconds spent with the line down
    pub fn lost_seconds(&self) -> u64 {
        self.lost_seconds
    }

    pub fn total_downtime_remaining(&self) -> u64 {
        self.events.total_downtime_remaining()
    }

    /// Completed reels per order, indexed like the queue
    pub fn reels_per_order(&self) -> &[u32] {
        &self.reels_per_order
    }

    pub fn completed_reels(&self) -> &[ReelRecord] {
        &self.completed_reels
    }

    pub fn accumulated_mass_total(&self) -> f64 {
        self.program.accumulated_mass_total()
    }

    pub fn partial_mass(&self) -> f64 {
        self.program.partial_mass()
    }

    pub fn order_progress(&self) -> &ProgressTracker {
        &self.order_progress
    }

    pub fn run_progress(&self) -> &ProgressTracker {
        &self.run_progress
    }
}
