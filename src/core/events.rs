//! Stochastic stop model of the line.
//!
//! Two sources feed the set of active events: countdown timers for planned
//! maintenance (felt end-of-life, creping blade, cleaning) and per-tick
//! Bernoulli rolls for breakdowns (felt breakage, machine failure, web
//! break). The orchestrator can also schedule reel changes and order
//! changeovers directly.
//!
//! Concurrent events overlap: each gets its own sampled duration, but the
//! line is down for the longest of them, not for their sum.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::felt::FeltUnit;
use super::probability::{roll, sample_normal, tick_probability};
use super::types::{EventKind, ProductKind};

/// Machine failures: 50% chance within 10 days
pub const MACHINE_FAILURE_WINDOW_SECONDS: f64 = 10.0 * 24.0 * 3600.0;
/// Web breaks: 50% chance within 4 hours
pub const WEB_BREAK_WINDOW_SECONDS: f64 = 4.0 * 3600.0;
/// Fresh splice: 10% chance of a web break within 15 seconds
pub const SPLICE_WINDOW_SECONDS: u64 = 15;
/// Fixed interval between machine cleanings
pub const CLEANING_INTERVAL_SECONDS: i64 = 8 * 3600;
/// Chance that an unplanned stop is extended by a deep cleaning
pub const DEEP_CLEANING_PROBABILITY: f64 = 0.60;
/// Fixed duration of a reel change
pub const REEL_CHANGE_SECONDS: u64 = 15;

/// Read-only view of the machine handed to the engine for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventContext {
    pub order_index: usize,
    pub product: ProductKind,
    /// Reels completed so far for the current order
    pub reel_index: u32,
    pub simulated_time: u64,
}

/// One triggered event, as kept in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    /// Sampled stop duration, seconds
    pub duration: u64,
    pub simulated_time: u64,
    pub order_index: usize,
    pub product: ProductKind,
    pub reel_index: u32,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Sampled duration of each active event, in resolution order
    pub durations: Vec<(EventKind, u64)>,
    /// Deep-cleaning extension, when one was added
    pub deep_cleaning: Option<u64>,
    /// Downtime left after resolving
    pub downtime: u64,
}

/// Countdown toward a planned maintenance event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    interval: i64,
    remaining: i64,
}

impl Countdown {
    pub fn new(interval: i64) -> Self {
        Self {
            interval,
            remaining: interval,
        }
    }

    /// Subtract `seconds`; true once the countdown has run out
    fn tick(&mut self, seconds: u64) -> bool {
        self.remaining -= seconds as i64;
        self.remaining <= 0
    }

    fn rearm(&mut self, interval: i64) {
        self.interval = interval;
        self.remaining = interval;
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }
}

fn sample_blade_interval<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(22..=27) * 3600
}

/// Draw a stop duration, in seconds, for `kind`
pub fn sample_duration<R: Rng + ?Sized>(kind: EventKind, rng: &mut R) -> u64 {
    match kind {
        EventKind::FeltChange => sample_normal(rng, 7200.0, 900.0).max(0.0) as u64,
        EventKind::MachineFailure => rng.gen_range(300..=21_600),
        EventKind::WebBreak => rng.gen_range(60..=420),
        EventKind::Cleaning => rng.gen_range(210..=390),
        EventKind::BladeChange => rng.gen_range(240..=360),
        EventKind::ReelChange => REEL_CHANGE_SECONDS,
        EventKind::OrderChangeover => rng.gen_range(900..=1_500),
        EventKind::DeepCleaning => rng.gen_range(210..=360),
    }
}

#[derive(Debug, Clone)]
pub struct EventEngine {
    tick_seconds: u64,
    machine_failure_probability: f64,
    web_break_probability: f64,
    splice_break_probability: f64,
    active_events: BTreeSet<EventKind>,
    total_downtime_remaining: u64,
    felt_timer: Countdown,
    blade_timer: Countdown,
    cleaning_timer: Countdown,
    splice_window_remaining: u64,
    event_log: Vec<EventRecord>,
}

impl EventEngine {
    pub fn new<R: Rng + ?Sized>(felt: &FeltUnit, tick_seconds: u64, rng: &mut R) -> Self {
        let tick = tick_seconds as f64;
        Self {
            tick_seconds,
            machine_failure_probability: tick_probability(tick, 50.0, MACHINE_FAILURE_WINDOW_SECONDS),
            web_break_probability: tick_probability(tick, 50.0, WEB_BREAK_WINDOW_SECONDS),
            splice_break_probability: tick_probability(tick, 10.0, SPLICE_WINDOW_SECONDS as f64),
            active_events: BTreeSet::new(),
            total_downtime_remaining: 0,
            felt_timer: Countdown::new(felt.remaining_life_seconds()),
            blade_timer: Countdown::new(sample_blade_interval(rng)),
            cleaning_timer: Countdown::new(CLEANING_INTERVAL_SECONDS),
            splice_window_remaining: 0,
            event_log: Vec::new(),
        }
    }

    /// Add an event to the active set without resolving it
    pub fn schedule(&mut self, kind: EventKind) {
        self.active_events.insert(kind);
    }

    /// Count down the maintenance timers and resolve whatever is active
    pub fn evaluate_scheduled<R: Rng + ?Sized>(
        &mut self,
        ctx: &EventContext,
        rng: &mut R,
    ) -> Option<Resolution> {
        let timers = [
            (EventKind::FeltChange, &mut self.felt_timer),
            (EventKind::Cleaning, &mut self.cleaning_timer),
            (EventKind::BladeChange, &mut self.blade_timer),
        ];
        for (kind, timer) in timers {
            if !self.active_events.contains(&kind) && timer.tick(self.tick_seconds) {
                self.active_events.insert(kind);
            }
        }

        if self.active_events.is_empty() {
            None
        } else {
            Some(self.resolve(ctx, rng))
        }
    }

    /// Roll the breakdowns for this tick; only when nothing is active yet
    pub fn evaluate_random<R: Rng + ?Sized>(
        &mut self,
        felt_breakage_probability: f64,
        ctx: &EventContext,
        rng: &mut R,
    ) -> Option<Resolution> {
        if !self.active_events.is_empty() {
            return None;
        }

        if roll(rng, felt_breakage_probability) {
            self.active_events.insert(EventKind::FeltChange);
        }
        if roll(rng, self.machine_failure_probability) {
            self.active_events.insert(EventKind::MachineFailure);
        }
        if roll(rng, self.web_break_probability) {
            self.active_events.insert(EventKind::WebBreak);
        }
        if self.splice_window_remaining > 0 {
            self.splice_window_remaining = self.splice_window_remaining.saturating_sub(self.tick_seconds);
            if roll(rng, self.splice_break_probability) {
                self.active_events.insert(EventKind::WebBreak);
            }
        }

        if self.active_events.is_empty() {
            None
        } else {
            Some(self.resolve(ctx, rng))
        }
    }

    /// Sample a duration for every active event and set the downtime to
    /// the longest one. Stops other than reel changes may be extended by
    /// a deep cleaning.
    pub fn resolve<R: Rng + ?Sized>(&mut self, ctx: &EventContext, rng: &mut R) -> Resolution {
        let mut durations = Vec::with_capacity(self.active_events.len());
        for &kind in &self.active_events {
            let duration = sample_duration(kind, rng);
            self.total_downtime_remaining = self.total_downtime_remaining.max(duration);
            durations.push((kind, duration));
        }
        for &(kind, duration) in &durations {
            self.log(kind, duration, ctx);
        }

        let mut deep_cleaning = None;
        if self.total_downtime_remaining != 0
            && !self.active_events.contains(&EventKind::ReelChange)
            && roll(rng, DEEP_CLEANING_PROBABILITY)
        {
            let extra = sample_duration(EventKind::DeepCleaning, rng);
            self.total_downtime_remaining += extra;
            self.cleaning_timer.rearm(CLEANING_INTERVAL_SECONDS);
            self.log(EventKind::DeepCleaning, extra, ctx);
            deep_cleaning = Some(extra);
        }

        debug!(
            "t={}s stop {:?} (deep cleaning {:?}), down for {}s",
            ctx.simulated_time, durations, deep_cleaning, self.total_downtime_remaining
        );

        Resolution {
            durations,
            deep_cleaning,
            downtime: self.total_downtime_remaining,
        }
    }

    /// Spend one tick of downtime; returns what is left
    pub fn consume_downtime(&mut self, seconds: u64) -> u64 {
        self.total_downtime_remaining = self.total_downtime_remaining.saturating_sub(seconds);
        self.total_downtime_remaining
    }

    /// Close the current stop: re-arm the timers of planned events that
    /// fired, install a new felt if one was changed, and clear the set.
    pub fn reset<R: Rng + ?Sized>(&mut self, felt: &mut FeltUnit, rng: &mut R) {
        if self.active_events.contains(&EventKind::FeltChange) {
            felt.reset(rng);
            self.felt_timer.rearm(felt.remaining_life_seconds());
            debug!("felt replaced, rated life {}h", felt.rated_life_hours());
        }
        if self.active_events.contains(&EventKind::Cleaning) {
            self.cleaning_timer.rearm(CLEANING_INTERVAL_SECONDS);
        }
        if self.active_events.contains(&EventKind::BladeChange) {
            let interval = sample_blade_interval(rng);
            self.blade_timer.rearm(interval);
        }
        if self.active_events.contains(&EventKind::ReelChange) {
            self.splice_window_remaining = SPLICE_WINDOW_SECONDS;
        }
        self.active_events.clear();
    }

    fn log(&mut self, kind: EventKind, duration: u64, ctx: &EventContext) {
        self.event_log.push(EventRecord {
            kind,
            duration,
            simulated_time: ctx.simulated_time,
            order_index: ctx.order_index,
            product: ctx.product,
            reel_index: ctx.reel_index,
        });
    }

    pub fn active_events(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.active_events.iter().copied()
    }

    pub fn is_active(&self, kind: EventKind) -> bool {
        self.active_events.contains(&kind)
    }

    pub fn total_downtime_remaining(&self) -> u64 {
        self.total_downtime_remaining
    }

    pub fn event_log(&self) -> &[EventRecord] {
        &self.event_log
    }

    /// Number of logged events per kind
    pub fn counts_by_kind(&self) -> BTreeMap<EventKind, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.event_log {
            *counts.entry(record.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn felt_timer(&self) -> Countdown {
        self.felt_timer
    }

    pub fn blade_timer(&self) -> Countdown {
        self.blade_timer
    }

    pub fn cleaning_timer(&self) -> Countdown {
        self.cleaning_timer
    }

    pub fn splice_window_remaining(&self) -> u64 {
        self.splice_window_remaining
    }

    pub fn machine_failure_probability(&self) -> f64 {
        self.machine_failure_probability
    }

    pub fn web_break_probability(&self) -> f64 {
        self.web_break_probability
    }

    pub fn splice_break_probability(&self) -> f64 {
        self.splice_break_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx() -> EventContext {
        EventContext {
            order_index: 0,
            product: ProductKind::Tissue,
            reel_index: 2,
            simulated_time: 3600,
        }
    }

    #[test]
    fn test_downtime_is_max_not_sum() {
        let mut rng = StdRng::seed_from_u64(42);
        let felt = FeltUnit::with_wear(0.2, 450, 5);
        for _ in 0..200 {
            let mut engine = EventEngine::new(&felt, 5, &mut rng);
            engine.schedule(EventKind::MachineFailure);
            engine.schedule(EventKind::WebBreak);
            engine.schedule(EventKind::BladeChange);
            let resolution = engine.resolve(&ctx(), &mut rng);

            let longest = resolution.durations.iter().map(|(_, d)| *d).max().unwrap();
            assert_eq!(resolution.durations.len(), 3);
            // overlapping stops are intentional: the sum is never used
            assert_eq!(
                engine.total_downtime_remaining(),
                longest + resolution.deep_cleaning.unwrap_or(0)
            );
            assert_eq!(resolution.downtime, engine.total_downtime_remaining());
        }
    }

    #[test]
    fn test_every_sampled_event_is_logged() {
        let mut rng = StdRng::seed_from_u64(8);
        let felt = FeltUnit::with_wear(0.2, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        engine.schedule(EventKind::FeltChange);
        engine.schedule(EventKind::Cleaning);
        let resolution = engine.resolve(&ctx(), &mut rng);

        let expected = 2 + usize::from(resolution.deep_cleaning.is_some());
        assert_eq!(engine.event_log().len(), expected);
        assert_eq!(engine.event_log()[0].kind, EventKind::FeltChange);
        assert_eq!(engine.event_log()[1].kind, EventKind::Cleaning);
        assert_eq!(engine.event_log()[0].reel_index, 2);
        assert_eq!(engine.event_log()[0].simulated_time, 3600);
    }

    #[test]
    fn test_reel_change_is_never_extended() {
        let mut rng = StdRng::seed_from_u64(3);
        let felt = FeltUnit::with_wear(0.2, 450, 5);
        for _ in 0..100 {
            let mut engine = EventEngine::new(&felt, 5, &mut rng);
            engine.schedule(EventKind::ReelChange);
            let resolution = engine.resolve(&ctx(), &mut rng);
            assert_eq!(resolution.deep_cleaning, None);
            assert_eq!(engine.total_downtime_remaining(), REEL_CHANGE_SECONDS);
        }
    }

    #[test]
    fn test_deep_cleaning_rate() {
        let mut rng = StdRng::seed_from_u64(17);
        let felt = FeltUnit::with_wear(0.2, 450, 5);
        let mut extended = 0;
        for _ in 0..2_000 {
            let mut engine = EventEngine::new(&felt, 5, &mut rng);
            engine.schedule(EventKind::WebBreak);
            if let Some(extra) = engine.resolve(&ctx(), &mut rng).deep_cleaning {
                assert!((210..=360).contains(&extra));
                assert_eq!(engine.cleaning_timer().remaining(), CLEANING_INTERVAL_SECONDS);
                extended += 1;
            }
        }
        let rate = extended as f64 / 2_000.0;
        assert!((rate - DEEP_CLEANING_PROBABILITY).abs() < 0.05, "rate was {}", rate);
    }

    #[test]
    fn test_duration_ranges() {
        let mut rng = StdRng::seed_from_u64(29);
        for _ in 0..500 {
            assert!((300..=21_600).contains(&sample_duration(EventKind::MachineFailure, &mut rng)));
            assert!((60..=420).contains(&sample_duration(EventKind::WebBreak, &mut rng)));
            assert!((210..=390).contains(&sample_duration(EventKind::Cleaning, &mut rng)));
            assert!((240..=360).contains(&sample_duration(EventKind::BladeChange, &mut rng)));
            assert!((900..=1_500).contains(&sample_duration(EventKind::OrderChangeover, &mut rng)));
            assert_eq!(sample_duration(EventKind::ReelChange, &mut rng), 15);
        }
    }

    #[test]
    fn test_scheduled_events_fire_and_rearm() {
        let mut rng = StdRng::seed_from_u64(101);
        // under half an hour of rated life left
        let mut felt = FeltUnit::with_wear(0.999, 432, 5);
        let tick = 28 * 3600;
        let mut engine = EventEngine::new(&felt, tick, &mut rng);

        let resolution = engine.evaluate_scheduled(&ctx(), &mut rng).unwrap();
        let kinds: Vec<_> = resolution.durations.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![EventKind::FeltChange, EventKind::Cleaning, EventKind::BladeChange]
        );

        engine.reset(&mut felt, &mut rng);
        assert_eq!(engine.active_events().count(), 0);
        assert_eq!(felt.wear_fraction(), 0.0);
        assert_eq!(engine.felt_timer().remaining(), felt.rated_life_hours() as i64 * 3600);
        assert_eq!(engine.cleaning_timer().remaining(), CLEANING_INTERVAL_SECONDS);
        let blade = engine.blade_timer();
        assert!(blade.remaining() > 0);
        assert!((22 * 3600..=27 * 3600).contains(&blade.remaining()));
        assert_eq!(blade.remaining(), blade.interval());
    }

    #[test]
    fn test_timers_only_count_while_idle() {
        let mut rng = StdRng::seed_from_u64(4);
        let felt = FeltUnit::with_wear(0.0, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        let before = engine.cleaning_timer().remaining();
        assert!(engine.evaluate_scheduled(&ctx(), &mut rng).is_none());
        assert_eq!(engine.cleaning_timer().remaining(), before - 5);

        engine.schedule(EventKind::Cleaning);
        engine.evaluate_scheduled(&ctx(), &mut rng);
        assert_eq!(engine.cleaning_timer().remaining(), before - 5);
    }

    #[test]
    fn test_random_rolls_skip_while_events_active() {
        let mut rng = StdRng::seed_from_u64(12);
        let felt = FeltUnit::with_wear(0.0, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        engine.schedule(EventKind::Cleaning);
        assert!(engine.evaluate_random(1.0, &ctx(), &mut rng).is_none());
        assert!(!engine.is_active(EventKind::FeltChange));
    }

    #[test]
    fn test_certain_felt_breakage_triggers_change() {
        let mut rng = StdRng::seed_from_u64(12);
        let felt = FeltUnit::with_wear(0.0, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        let resolution = engine.evaluate_random(1.0, &ctx(), &mut rng).unwrap();
        assert_eq!(resolution.durations[0].0, EventKind::FeltChange);
        assert!(engine.total_downtime_remaining() > 0);
    }

    #[test]
    fn test_reel_change_opens_splice_window() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut felt = FeltUnit::with_wear(0.0, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        engine.schedule(EventKind::ReelChange);
        engine.resolve(&ctx(), &mut rng);
        while engine.consume_downtime(5) > 0 {}
        engine.reset(&mut felt, &mut rng);
        assert_eq!(engine.splice_window_remaining(), SPLICE_WINDOW_SECONDS);

        for _ in 0..3 {
            engine.evaluate_random(0.0, &ctx(), &mut rng);
            while engine.consume_downtime(5) > 0 {}
            engine.reset(&mut felt, &mut rng);
        }
        assert_eq!(engine.splice_window_remaining(), 0);
    }

    #[test]
    fn test_tick_probabilities() {
        let mut rng = StdRng::seed_from_u64(0);
        let felt = FeltUnit::with_wear(0.0, 450, 5);
        let engine = EventEngine::new(&felt, 5, &mut rng);
        let expected = 1.0 - 0.5f64.powf(5.0 / (4.0 * 3600.0));
        assert_eq!(engine.web_break_probability(), expected);
        let splice = 1.0 - 0.9f64.powf(5.0 / 15.0);
        assert!((engine.splice_break_probability() - splice).abs() < 1e-12);
        assert!(engine.machine_failure_probability() < engine.web_break_probability());
    }

    #[test]
    fn test_counts_by_kind() {
        let mut rng = StdRng::seed_from_u64(9);
        let felt = FeltUnit::with_wear(0.0, 450, 5);
        let mut engine = EventEngine::new(&felt, 5, &mut rng);
        engine.schedule(EventKind::ReelChange);
        engine.resolve(&ctx(), &mut rng);
        engine.schedule(EventKind::ReelChange);
        engine.resolve(&ctx(), &mut rng);
        assert_eq!(engine.counts_by_kind().get(&EventKind::ReelChange), Some(&2));
    }
}
