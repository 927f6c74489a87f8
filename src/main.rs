use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::Path;
use std::time::{Duration, Instant};

use intersection_sim::{
    config::SimulationConfig,
    engine::Simulation,
    simulation::{Direction, VehicleClass},
};

#[derive(Parser)]
#[command(name = "intersection-sim")]
#[command(about = "Signalized intersection simulation with emergency vehicle preemption")]
struct Args {
    /// Intersection configuration file (defaults are used when absent)
    #[arg(short, long, default_value = "intersection.toml")]
    config: String,

    /// Random seed for reproducible simulations
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated seconds to run
    #[arg(short, long, default_value_t = 30.0)]
    duration: f32,

    /// Emergency vehicle to dispatch, as DIRECTION:CLASS@SECONDS (e.g. west:ambulance@3)
    #[arg(short, long, value_parser = parse_emergency)]
    emergency: Vec<ScheduledEmergency>,

    /// Pace the run against the wall clock instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Drive the simulation from the async runner (implies --realtime)
    #[arg(long = "async")]
    use_async: bool,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledEmergency {
    direction: Direction,
    class: VehicleClass,
    at: Duration,
}

fn parse_emergency(s: &str) -> Result<ScheduledEmergency, String> {
    let (what, at) = s.split_once('@').unwrap_or((s, "0"));
    let (direction, class) = what
        .split_once(':')
        .ok_or_else(|| format!("expected DIRECTION:CLASS, got '{}'", what))?;

    let direction: Direction = direction.parse().map_err(|e| format!("{}", e))?;
    let class: VehicleClass = class.parse().map_err(|e| format!("{}", e))?;
    if !class.is_emergency() {
        return Err(format!("{} is not an emergency vehicle", class));
    }

    let secs: f32 = at.parse().map_err(|_| format!("invalid dispatch time '{}'", at))?;
    Ok(ScheduledEmergency {
        direction,
        class,
        at: intersection_sim::config::secs_to_duration(secs),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting Intersection Simulator (Console Mode)");

    let mut config = if Path::new(&args.config).exists() {
        info!("Loading configuration from: {}", &args.config);
        SimulationConfig::load_from_file(&args.config)?
    } else {
        info!("No configuration at {}, using defaults", &args.config);
        SimulationConfig::default()
    };
    if args.seed.is_some() {
        config.traffic.random.seed = args.seed;
    }

    info!("Signal timing: {:.1}s green, {:.1}s yellow, {:.1}s emergency hold",
          config.signals.green_time,
          config.signals.yellow_time,
          config.signals.emergency_hold);

    let mut emergencies = args.emergency.clone();
    emergencies.sort_by_key(|e| e.at);
    let duration = intersection_sim::config::secs_to_duration(args.duration);

    if args.use_async {
        #[cfg(feature = "async")]
        return run_async(config, emergencies, duration);

        #[cfg(not(feature = "async"))]
        log::warn!("Built without the async feature, running stepped");
    }

    let mut simulation = Simulation::new(config);
    run_stepped(&mut simulation, &emergencies, duration, args.realtime);
    report(&simulation);
    Ok(())
}

fn run_stepped(simulation: &mut Simulation, emergencies: &[ScheduledEmergency], duration: Duration, realtime: bool) {
    let step = simulation.config().traffic.animation_interval();
    let start_time = Instant::now();
    let mut last_update = Duration::ZERO;
    let mut pending = emergencies.iter().peekable();

    simulation.start();

    while simulation.timeline().now() < duration {
        let now = simulation.timeline().now();
        while let Some(emergency) = pending.next_if(|e| e.at <= now) {
            if let Err(e) = simulation.spawn_emergency(emergency.direction, emergency.class) {
                log::warn!("Could not dispatch emergency: {}", e);
            }
        }

        simulation.advance_time(step);

        if now - last_update >= Duration::from_secs(1) {
            info!("t={:>5.1}s: {} vehicles active, {}",
                  now.as_secs_f32(),
                  simulation.registry().live_count(),
                  simulation.controller().status());
            last_update = now;
        }

        if realtime {
            let target = simulation.timeline().now();
            let elapsed = start_time.elapsed();
            if elapsed < target {
                std::thread::sleep(target - elapsed);
            }
        }
    }

    simulation.stop();
}

#[cfg(feature = "async")]
fn run_async(config: SimulationConfig, emergencies: Vec<ScheduledEmergency>, duration: Duration) -> Result<()> {
    use intersection_sim::engine::runner::{spawn_runner, Command};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let simulation = runtime.block_on(async move {
        let (handle, join) = spawn_runner(Simulation::new(config));
        handle.send(Command::Start)?;

        let started = tokio::time::Instant::now();
        for emergency in emergencies {
            tokio::time::sleep_until(started + emergency.at).await;
            handle.spawn_emergency(emergency.direction, emergency.class)?;
        }
        tokio::time::sleep_until(started + duration).await;

        handle.shutdown()?;
        Ok::<_, anyhow::Error>(join.await?)
    })?;

    report(&simulation);
    Ok(())
}

fn report(simulation: &Simulation) {
    let stats = simulation.statistics();

    info!("Simulation completed!");
    info!("Simulated time: {:.2}s", simulation.registry().clock().as_secs_f64());
    info!("Total vehicles spawned: {}", stats.total_spawned);
    info!("Total vehicles completed: {}", stats.total_completed);
    info!("Active vehicles: {}", simulation.registry().live_count());
    info!("Ambulances served: {}", stats.ambulances_served);
    info!("Fire trucks served: {}", stats.firetrucks_served);

    for class in [VehicleClass::Ambulance, VehicleClass::Firetruck] {
        if let Some(average) = stats.average_transit(class) {
            info!("Average {} transit: {:.2}s", class, average.as_secs_f64());
        }
    }

    for (direction, waiting) in simulation.waiting_counts() {
        if waiting > 0 {
            info!("Waiting at {}: {}", direction, waiting);
        }
    }
}
