use criterion::{black_box, criterion_group, criterion_main, Criterion};
use intersection_sim::{
    config::SimulationConfig,
    engine::Simulation,
    simulation::{Direction, SignalController, Vehicle, VehicleClass, VehicleId},
};
use std::time::Duration;

fn busy_simulation(seed: u64) -> Simulation {
    let mut config = SimulationConfig::default();
    config.traffic.random.seed = Some(seed);
    config.traffic.spawn_interval_ms = 100;

    let mut simulation = Simulation::new(config);
    simulation.start();

    // Pre-populate with queued traffic for realistic benchmarking
    for _ in 0..500 {
        simulation.advance_time(Duration::from_millis(16));
    }
    simulation
}

fn benchmark_animation_tick(c: &mut Criterion) {
    let mut simulation = busy_simulation(42);

    c.bench_function("animation_tick", |b| {
        b.iter(|| {
            black_box(&mut simulation).animation_tick();
        })
    });
}

fn benchmark_control_tick(c: &mut Criterion) {
    let config = SimulationConfig::default();
    let center = config.intersection.center();
    let vehicles: Vec<Vehicle> = (0..200)
        .map(|i| {
            let direction = Direction::ALL[i % 4];
            let position = center - direction.unit_vector() * (250.0 + i as f32 * 10.0);
            Vehicle::new(VehicleId(i as u64), direction, VehicleClass::Car, position, Duration::ZERO)
        })
        .collect();

    let mut controller = SignalController::new(&config);
    controller.start();
    let dt = config.signals.control_interval();

    c.bench_function("control_tick_200_vehicles", |b| {
        b.iter(|| {
            black_box(controller.advance(dt, black_box(&vehicles)));
        })
    });
}

fn benchmark_simulation_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_scaling");

    for spawn_interval_ms in [1500u64, 500, 100].iter() {
        let mut config = SimulationConfig::default();
        config.traffic.random.seed = Some(42);
        config.traffic.spawn_interval_ms = *spawn_interval_ms;

        let mut simulation = Simulation::new(config);
        simulation.start();

        group.bench_with_input(
            format!("one_second_spawn_every_{}ms", spawn_interval_ms),
            spawn_interval_ms,
            |b, _spawn_interval_ms| {
                b.iter(|| {
                    black_box(simulation.advance_time(Duration::from_secs(1)));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_animation_tick,
    benchmark_control_tick,
    benchmark_simulation_scaling
);
criterion_main!(benches);
