use anyhow::Result;
use intersection_sim::{
    config::SimulationConfig,
    engine::{Observation, RecordingObserver, Simulation},
    simulation::{Direction, SignalColor, VehicleClass},
    SimError,
};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn quiet_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.traffic.random.seed = Some(11);
    config.traffic.spawn_interval_ms = 60_000;
    config
}

fn recording(config: SimulationConfig) -> Simulation<RecordingObserver> {
    Simulation::with_observer(config, RecordingObserver::default())
}

fn run_for(simulation: &mut Simulation<RecordingObserver>, duration: Duration) {
    let frames = duration.as_millis() / FRAME.as_millis();
    for _ in 0..frames {
        simulation.advance_time(FRAME);
    }
}

#[test]
fn loads_bundled_configuration() -> Result<()> {
    let config = SimulationConfig::load_from_file("intersection.toml")?;
    assert_eq!(config.signals.green(), Duration::from_secs(8));
    assert_eq!(config.signals.yellow(), Duration::from_secs(2));
    assert_eq!(config.signals.control_interval(), Duration::from_millis(200));
    assert_eq!(config.traffic.random.seed, Some(42));
    Ok(())
}

#[test]
fn invalid_names_are_rejected_without_side_effects() {
    let mut simulation = recording(quiet_config());

    assert_eq!(
        simulation.spawn_emergency_named("up", "ambulance"),
        Err(SimError::UnknownDirection("up".to_string()))
    );
    assert_eq!(
        simulation.spawn_emergency_named("north", "helicopter"),
        Err(SimError::UnknownVehicleClass("helicopter".to_string()))
    );
    assert_eq!(
        simulation.spawn_emergency_named("north", "car"),
        Err(SimError::NotAnEmergencyVehicle(VehicleClass::Car))
    );

    assert!(!simulation.is_running());
    assert_eq!(simulation.registry().live_count(), 0);
    assert!(simulation.controller().queue().is_empty());
    assert!(simulation.observer().observations.is_empty());
}

#[test]
fn emergency_spawn_starts_a_stopped_simulation() {
    let mut simulation = recording(quiet_config());

    assert!(simulation.spawn_emergency_named("West", "AMBULANCE").unwrap());
    assert!(simulation.is_running());
    assert_eq!(simulation.registry().live_count(), 1);

    let events = simulation.observer().events();
    assert!(events.contains(&"Emergency queued: AMBULANCE from WEST"));
    assert!(events.contains(&"Simulation started"));
}

#[test]
fn crowded_entry_rejects_emergency_without_filing_a_request() {
    let mut simulation = recording(quiet_config());

    assert_eq!(simulation.spawn_emergency(Direction::North, VehicleClass::Ambulance), Ok(true));
    simulation.stop();
    simulation.observer_mut().clear();

    assert_eq!(simulation.spawn_emergency(Direction::North, VehicleClass::Firetruck), Ok(false));

    assert!(!simulation.is_running());
    assert_eq!(simulation.controller().queue_len(), 1);
    assert_eq!(simulation.registry().live_count(), 1);
    assert_eq!(simulation.statistics().total_spawned, 1);
    assert_eq!(simulation.observer().events(), vec!["Could not spawn firetruck - traffic too dense"]);
}

#[test]
fn nothing_advances_while_stopped() {
    let mut simulation = recording(quiet_config());
    simulation.spawn_vehicle(Some(Direction::North), VehicleClass::Car);
    let before = simulation.snapshot();

    assert_eq!(simulation.advance_time(Duration::from_secs(5)), 0);
    assert_eq!(simulation.snapshot(), before);
    assert_eq!(simulation.controller().state().remaining(), simulation.config().signals.green());
}

#[test]
fn ambulance_crosses_under_override() {
    let mut simulation = recording(quiet_config());

    simulation.spawn_emergency(Direction::West, VehicleClass::Ambulance).unwrap();
    run_for(&mut simulation, Duration::from_millis(400));

    let signals = simulation.signals();
    assert_eq!(signals[Direction::West], SignalColor::Green);
    assert_eq!(signals[Direction::North], SignalColor::Red);
    assert_eq!(simulation.observer().last_status(), Some("EMERGENCY ACTIVE: AMBULANCE from WEST"));

    run_for(&mut simulation, Duration::from_secs(8));

    let stats = simulation.statistics();
    assert_eq!(stats.ambulances_served, 1);
    assert_eq!(stats.total_completed, 1);
    assert_eq!(simulation.registry().live_count(), 0);

    let events = simulation.observer().events();
    assert!(events.contains(&"Emergency active: AMBULANCE from WEST"));
    assert!(events.contains(&"AMBULANCE from WEST cleared the intersection"));
    assert!(events.contains(&"Emergency override ended (WEST)"));
    assert!(simulation.signals().is_green(Direction::North));
}

#[test]
fn crossing_axes_are_never_green_together() {
    let mut config = SimulationConfig::default();
    config.traffic.random.seed = Some(3);
    config.traffic.spawn_interval_ms = 400;
    let mut simulation = recording(config);
    simulation.start();

    // Dispatch frames, 16 ms each.
    let dispatches = [
        (200, Direction::North, VehicleClass::Firetruck),
        (250, Direction::East, VehicleClass::Ambulance),
        (1300, Direction::South, VehicleClass::Ambulance),
    ];

    for frame in 0..2500u32 {
        let now = FRAME * frame;
        for (at, direction, class) in dispatches {
            if at == frame {
                simulation.spawn_emergency(direction, class).unwrap();
            }
        }
        simulation.advance_time(FRAME);

        let signals = simulation.signals();
        let ns = signals.is_green(Direction::North) || signals.is_green(Direction::South);
        let ew = signals.is_green(Direction::East) || signals.is_green(Direction::West);
        assert!(!(ns && ew), "both axes green at {:?}", now);
    }

    for observation in &simulation.observer().observations {
        if let Observation::Signals { signals, .. } = observation {
            assert!(signals.green_directions().len() <= 2);
        }
    }
}

#[test]
fn waiting_counts_track_red_approaches() {
    let mut simulation = recording(quiet_config());
    simulation.start();
    simulation.spawn_vehicle(Some(Direction::East), VehicleClass::Car);
    simulation.spawn_vehicle(Some(Direction::North), VehicleClass::Car);

    run_for(&mut simulation, Duration::from_secs(5));

    let counts = simulation.waiting_counts();
    assert_eq!(counts[0], (Direction::North, 0));
    assert!(counts.contains(&(Direction::East, 1)));
}

#[test]
fn zero_speed_multiplier_freezes_traffic() {
    let mut simulation = recording(quiet_config());
    simulation.start();
    simulation.spawn_vehicle(Some(Direction::South), VehicleClass::Bus);
    simulation.set_speed_multiplier(0.0);
    let before = simulation.snapshot();

    run_for(&mut simulation, Duration::from_secs(1));
    assert_eq!(simulation.snapshot(), before);

    simulation.set_speed_multiplier(-3.0);
    assert_eq!(simulation.speed_multiplier(), 0.0);
}

#[test]
fn spawn_interval_feeds_ambient_traffic() {
    let mut simulation = recording(quiet_config());
    simulation.start();
    simulation.set_spawn_interval(Duration::from_millis(500));
    assert_eq!(simulation.spawn_interval(), Duration::from_millis(500));

    run_for(&mut simulation, Duration::from_millis(2512));
    let spawned = simulation.statistics().total_spawned;
    assert!(spawned >= 1 && spawned <= 5, "spawned {}", spawned);
}

#[test]
fn reset_returns_to_a_clean_slate() {
    let mut simulation = recording(quiet_config());
    simulation.spawn_emergency(Direction::South, VehicleClass::Firetruck).unwrap();
    simulation.enqueue_emergency(Direction::East, VehicleClass::Ambulance).unwrap();
    run_for(&mut simulation, Duration::from_secs(1));

    simulation.reset();

    assert!(!simulation.is_running());
    assert_eq!(simulation.registry().live_count(), 0);
    assert_eq!(simulation.statistics().total_spawned, 0);
    assert!(simulation.controller().queue().is_empty());
    assert!(!simulation.controller().state().is_override());
    assert!(simulation.signals().is_green(Direction::North));
    assert_eq!(simulation.observer().last_status(), Some("Simulation reset"));
    assert_eq!(simulation.observer().last_timer(), Some(8));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn runner_serves_commands_between_ticks() -> Result<()> {
    use intersection_sim::engine::runner::{spawn_runner, Command};

    let mut config = quiet_config();
    config.signals.control_interval_ms = 20;
    config.signals.emergency_hold = 0.2;

    let (handle, join) = spawn_runner(recording(config));
    handle.send(Command::SetSpeedMultiplier(2.0))?;
    handle.spawn_emergency(Direction::West, VehicleClass::Ambulance)?;

    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.shutdown()?;
    let simulation = join.await?;

    assert!(!simulation.is_running());
    assert_eq!(simulation.speed_multiplier(), 2.0);
    let events = simulation.observer().events();
    assert!(events.contains(&"Emergency active: AMBULANCE from WEST"));
    assert_eq!(events.last(), Some(&"Simulation stopped"));

    assert!(handle.send(Command::Start).is_err());
    Ok(())
}
