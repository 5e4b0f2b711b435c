use papersim::{
    run_replications, ConcurrencyMode, ContinuousMachine, EventKind, MachineConfig,
    ProductKind, ProductionOrder, SimulationEngine, SimulationObserver, TickOutcome,
};

/// Prints a status line once per simulated hour
struct HourlyReport;

impl SimulationObserver for HourlyReport {
    fn on_tick(&mut self, machine: &ContinuousMachine, _outcome: &TickOutcome) {
        if machine.elapsed_seconds() % 3600 != 0 {
            return;
        }
        let reel = machine.reel();
        println!(
            "  {:>4}h  {:?}  order {} at {:5.1}%  reel {:6.0} m / {:6.1} kg  felt {:4.1}% {:?}",
            machine.elapsed_seconds() / 3600,
            machine.state(),
            machine.program().current_order_index() + 1,
            machine.program().order_progress_percent(),
            reel.produced_length(),
            reel.accumulated_mass(),
            machine.felt().wear_fraction() * 100.0,
            machine.felt().condition(),
        );
    }

    fn on_order_complete(&mut self, machine: &ContinuousMachine, order_index: usize) {
        println!(
            "  order {} closed after {} reels",
            order_index + 1,
            machine.reels_per_order()[order_index]
        );
    }
}

fn order_queue() -> Vec<ProductionOrder> {
    vec![
        ProductionOrder::new(ProductKind::Tissue, 16.0, 20_000.0),
        ProductionOrder::new(ProductKind::Towel, 28.0, 35_000.0),
        ProductionOrder::new(ProductKind::Napkin, 18.0, 12_000.0).with_max_reel_length(30_000.0),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let config = MachineConfig::new()
        .with_seed(42)
        .with_max_ticks(2_000_000);

    println!("Configuration:");
    println!(
        "  tick={}s, width={} m, reel length={} m, seed={:?}",
        config.tick_seconds, config.machine_width, config.max_reel_length, config.seed
    );
    for (index, order) in order_queue().iter().enumerate() {
        println!(
            "  order {}: {} {} g/m2, {} kg",
            index + 1,
            order.product,
            order.target_basis_weight,
            order.target_mass
        );
    }
    println!();

    let mut engine = SimulationEngine::from_config(order_queue(), &config)?;
    engine.add_observer(Box::new(HourlyReport));
    let summary = engine.run();

    println!();
    println!("Run summary:");
    println!(
        "  simulated {:.1} h, lost {:.1} h ({:.1}%)",
        summary.simulated_seconds as f64 / 3600.0,
        summary.lost_seconds as f64 / 3600.0,
        summary.downtime_ratio() * 100.0
    );
    println!(
        "  {:.1} t in {} reels, mean basis weight deviation {:.3} g/m2",
        summary.produced_mass / 1000.0,
        summary.reel_count,
        summary.mean_basis_weight_deviation
    );
    for (kind, count) in &summary.events_by_kind {
        println!("  {:<18} {}", kind.to_string(), count);
    }

    let seeds: Vec<u64> = (100..116).collect();
    let replication_config = config.with_concurrency(ConcurrencyMode::Rayon);
    let summaries = run_replications(&order_queue(), &replication_config, &seeds)?;

    let runs = summaries.len() as f64;
    let mean_hours = summaries
        .iter()
        .map(|s| s.simulated_seconds as f64 / 3600.0)
        .sum::<f64>()
        / runs;
    let mean_lost = summaries.iter().map(|s| s.downtime_ratio()).sum::<f64>() / runs;
    let web_breaks = summaries
        .iter()
        .map(|s| s.events_by_kind.get(&EventKind::WebBreak).copied().unwrap_or(0))
        .sum::<usize>() as f64
        / runs;

    println!();
    println!("{} replications:", summaries.len());
    println!("  mean run length {:.1} h", mean_hours);
    println!("  mean downtime {:.1}%", mean_lost * 100.0);
    println!("  mean web breaks per run {:.1}", web_breaks);

    Ok(())
}
