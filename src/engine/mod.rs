//! The simulation facade: one controller, one vehicle registry and the
//! schedule that drives them, plus the observer that receives their output.

use std::time::Duration;

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::simulation::{
    Direction, SignalController, SignalState, SimulationStats, TickReport, VehicleClass, VehicleRegistry,
    VehicleSnapshot,
};

pub mod clock;
pub mod observer;
#[cfg(feature = "async")]
pub mod runner;

pub use clock::*;
pub use observer::*;

pub struct Simulation<O: SimulationObserver = LogObserver> {
    config: SimulationConfig,
    controller: SignalController,
    registry: VehicleRegistry,
    timeline: Timeline,
    observer: O,
    running: bool,
    speed_multiplier: f32,
    last_status: Option<String>,
}

impl Simulation<LogObserver> {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_observer(config, LogObserver)
    }
}

impl<O: SimulationObserver> Simulation<O> {
    pub fn with_observer(config: SimulationConfig, observer: O) -> Self {
        let controller = SignalController::new(&config);
        let registry = VehicleRegistry::new(&config, config.traffic.random.seed);
        let timeline = Timeline::from_config(&config);
        let speed_multiplier = config.traffic.speed_multiplier;

        Self {
            config,
            controller,
            registry,
            timeline,
            observer,
            running: false,
            speed_multiplier,
            last_status: None,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.timeline.restart();

        if let Some(event) = self.controller.start() {
            self.observer.event_logged(&event.to_string());
        }
        self.observer.signals_changed(&self.controller.signals(), false);
        self.observer.timer_updated(self.controller.state().remaining().as_secs());
        self.push_status(self.controller.status());
        self.observer.event_logged("Simulation started");
    }

    /// Halts every periodic job. State stays as the last completed tick left it.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.controller.stop();
        self.push_status("Simulation stopped".to_string());
        self.observer.event_logged("Simulation stopped");
    }

    /// Stops, removes every vehicle, zeroes statistics and puts the lights back to `ns_green`.
    pub fn reset(&mut self) {
        self.stop();
        self.registry.clear();
        self.registry.reset_statistics();
        self.controller.reset();

        // Push the fresh state to observers
        self.observer.signals_changed(&self.controller.signals(), false);
        self.observer.timer_updated(self.controller.state().remaining().as_secs());
        self.push_status("Simulation reset".to_string());
        self.observer.event_logged("Simulation reset");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Spawns one vehicle; `false` when the entry is too crowded.
    pub fn spawn_vehicle(&mut self, direction: Option<Direction>, class: VehicleClass) -> bool {
        self.registry.spawn(direction, class).is_some()
    }

    /// Spawns an emergency vehicle and files its preemption request. Starts the
    /// simulation if it was stopped.
    pub fn spawn_emergency(&mut self, direction: Direction, class: VehicleClass) -> Result<bool, SimError> {
        if !class.is_emergency() {
            return Err(SimError::NotAnEmergencyVehicle(class));
        }

        // Vehicle first; no request is filed for a vehicle that never appeared
        if self.registry.spawn(Some(direction), class).is_none() {
            self.observer.event_logged(&format!("Could not spawn {} - traffic too dense", class));
            return Ok(false);
        }

        let event = self.controller.enqueue(direction, class)?;
        self.observer.event_logged(&event.to_string());
        self.observer.event_logged(&format!("Spawned {} from {}", class, direction));

        if !self.running {
            self.start();
        }
        Ok(true)
    }

    /// String boundary for UI buttons and command lines.
    pub fn spawn_emergency_named(&mut self, direction: &str, class: &str) -> Result<bool, SimError> {
        let direction: Direction = direction.parse()?;
        let class: VehicleClass = class.parse()?;
        self.spawn_emergency(direction, class)
    }

    /// Files a preemption request without spawning a vehicle.
    pub fn enqueue_emergency(&mut self, direction: Direction, class: VehicleClass) -> Result<(), SimError> {
        let event = self.controller.enqueue(direction, class)?;
        self.observer.event_logged(&event.to_string());
        Ok(())
    }

    pub fn control_tick(&mut self) {
        if !self.running {
            return;
        }

        let dt = self.config.signals.control_interval();
        if let Some(report) = self.controller.advance(dt, self.registry.vehicles()) {
            self.publish(report);
        }
    }

    pub fn animation_tick(&mut self) {
        if !self.running {
            return;
        }

        let signals = self.controller.signals();
        let dt = self.config.traffic.animation_interval();
        for departure in self.registry.tick(&signals, self.speed_multiplier, dt) {
            if departure.class.is_emergency() && departure.crossed {
                self.observer.event_logged(&format!(
                    "{} from {} cleared the intersection",
                    departure.class.as_str().to_uppercase(),
                    departure.direction.as_str().to_uppercase()
                ));
            }
        }
    }

    pub fn spawn_tick(&mut self) {
        if !self.running {
            return;
        }
        self.registry.spawn_ambient();
    }

    pub fn run_task(&mut self, kind: TaskKind) {
        match kind {
            TaskKind::Control => self.control_tick(),
            TaskKind::Animation => self.animation_tick(),
            TaskKind::Spawn => self.spawn_tick(),
        }
    }

    /// Moves simulated time forward, running every job that falls due.
    /// Returns how many jobs ran; nothing runs while stopped.
    pub fn advance_time(&mut self, elapsed: Duration) -> usize {
        if !self.running {
            return 0;
        }

        // Run due jobs in firing order
        let due = self.timeline.advance(elapsed);
        let count = due.len();
        for kind in due {
            self.run_task(kind);
        }
        count
    }

    fn publish(&mut self, report: TickReport) {
        for event in &report.events {
            self.observer.event_logged(&event.to_string());
        }
        if report.signals_changed {
            self.observer.signals_changed(&report.signals, report.override_active);
        }
        self.observer.timer_updated(report.remaining_secs);
        self.push_status(report.status);
    }

    fn push_status(&mut self, status: String) {
        if self.last_status.as_deref() != Some(status.as_str()) {
            self.observer.status_changed(&status);
            self.last_status = Some(status);
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(0.0);
    }

    pub fn spawn_interval(&self) -> Duration {
        self.timeline.period(TaskKind::Spawn)
    }

    pub fn set_spawn_interval(&mut self, interval: Duration) {
        self.timeline.set_period(TaskKind::Spawn, interval);
    }

    pub fn signals(&self) -> SignalState {
        self.controller.signals()
    }

    pub fn controller(&self) -> &SignalController {
        &self.controller
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn statistics(&self) -> &SimulationStats {
        self.registry.statistics()
    }

    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        self.registry.snapshot()
    }

    pub fn waiting_counts(&self) -> [(Direction, usize); 4] {
        let signals = self.controller.signals();
        Direction::ALL.map(|d| (d, self.registry.waiting_count(d, &signals)))
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}
