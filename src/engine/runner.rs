//! Wall-clock driver: one tokio task owns the [`Simulation`] and multiplexes
//! the periodic ticks with external commands, so no two of them ever overlap.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::{Simulation, SimulationObserver};
use crate::simulation::{Direction, VehicleClass};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Reset,
    Spawn {
        direction: Option<Direction>,
        class: VehicleClass,
    },
    SpawnEmergency {
        direction: Direction,
        class: VehicleClass,
    },
    SetSpeedMultiplier(f32),
    SetSpawnInterval(Duration),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct RunnerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl RunnerHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("simulation runner has already shut down"))
    }

    pub fn spawn_emergency(&self, direction: Direction, class: VehicleClass) -> Result<()> {
        self.send(Command::SpawnEmergency { direction, class })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}

/// Moves `simulation` onto a tokio task. The join handle yields it back after
/// `Shutdown`, or once every handle has been dropped.
pub fn spawn_runner<O>(simulation: Simulation<O>) -> (RunnerHandle, JoinHandle<Simulation<O>>)
where
    O: SimulationObserver + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_loop(simulation, rx));
    (RunnerHandle { commands: tx }, handle)
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn run_loop<O>(mut simulation: Simulation<O>, mut commands: mpsc::UnboundedReceiver<Command>) -> Simulation<O>
where
    O: SimulationObserver,
{
    let mut control = ticker(simulation.config().signals.control_interval());
    let mut animation = ticker(simulation.config().traffic.animation_interval());
    let mut spawn = ticker(simulation.spawn_interval());

    log::info!("Simulation runner started");

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(Command::SetSpawnInterval(period)) => {
                    simulation.set_spawn_interval(period);
                    spawn = ticker(simulation.spawn_interval());
                }
                Some(command) => apply(&mut simulation, command),
            },
            _ = control.tick() => simulation.control_tick(),
            _ = animation.tick() => simulation.animation_tick(),
            _ = spawn.tick() => simulation.spawn_tick(),
        }
    }

    simulation.stop();
    log::info!("Simulation runner shut down");
    simulation
}

fn apply<O: SimulationObserver>(simulation: &mut Simulation<O>, command: Command) {
    match command {
        Command::Start => simulation.start(),
        Command::Stop => simulation.stop(),
        Command::Reset => simulation.reset(),
        Command::Spawn { direction, class } => {
            simulation.spawn_vehicle(direction, class);
        }
        Command::SpawnEmergency { direction, class } => {
            if let Err(e) = simulation.spawn_emergency(direction, class) {
                log::warn!("Rejected emergency spawn: {}", e);
            }
        }
        Command::SetSpeedMultiplier(multiplier) => simulation.set_speed_multiplier(multiplier),
        Command::SetSpawnInterval(period) => simulation.set_spawn_interval(period),
        Command::Shutdown => {}
    }
}
