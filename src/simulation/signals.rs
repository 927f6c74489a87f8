//! Signal phase state machine and emergency preemption.
//!
//! [`ControllerState`] is the only source of truth for the lights; the
//! [`SignalState`] exposed to vehicles is recomputed from it after every
//! control tick. Timer arithmetic uses [`Duration`] so a phase always lapses
//! after an exact number of ticks.

use std::fmt;
use std::time::Duration;

use super::{Axis, Direction, Point, SignalColor, SignalState, Vehicle, VehicleClass, VehicleId};
use crate::config::{SignalTiming, SimulationConfig};
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NsGreen,
    NsYellow,
    EwGreen,
    EwYellow,
}

impl Phase {
    pub const CYCLE: [Phase; 4] = [Phase::NsGreen, Phase::NsYellow, Phase::EwGreen, Phase::EwYellow];

    pub fn next(self) -> Phase {
        match self {
            Phase::NsGreen => Phase::NsYellow,
            Phase::NsYellow => Phase::EwGreen,
            Phase::EwGreen => Phase::EwYellow,
            Phase::EwYellow => Phase::NsGreen,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Phase::NsGreen | Phase::NsYellow => Axis::NorthSouth,
            Phase::EwGreen | Phase::EwYellow => Axis::EastWest,
        }
    }

    pub fn color(self) -> SignalColor {
        match self {
            Phase::NsGreen | Phase::EwGreen => SignalColor::Green,
            Phase::NsYellow | Phase::EwYellow => SignalColor::Yellow,
        }
    }

    pub fn duration(self, timing: &SignalTiming) -> Duration {
        match self.color() {
            SignalColor::Yellow => timing.yellow(),
            _ => timing.green(),
        }
    }

    pub fn signals(self) -> SignalState {
        SignalState::for_axis(self.axis(), self.color())
    }

    pub fn status(self) -> String {
        match self.color() {
            SignalColor::Green => format!("Normal: {} GREEN", self.axis().label()),
            _ => format!("{} YELLOW", self.axis().label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    NormalCycle {
        phase: Phase,
        remaining: Duration,
    },
    EmergencyOverride {
        direction: Direction,
        class: VehicleClass,
        remaining: Duration,
    },
}

/// Timer-driven change produced by [`ControllerState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    PhaseChanged { from: Phase, to: Phase },
    OverrideLapsed { direction: Direction, class: VehicleClass },
}

impl ControllerState {
    pub fn initial(timing: &SignalTiming) -> Self {
        ControllerState::NormalCycle {
            phase: Phase::NsGreen,
            remaining: Phase::NsGreen.duration(timing),
        }
    }

    pub fn overriding(direction: Direction, class: VehicleClass, timing: &SignalTiming) -> Self {
        ControllerState::EmergencyOverride {
            direction,
            class,
            remaining: timing.hold(),
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, ControllerState::EmergencyOverride { .. })
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            ControllerState::NormalCycle { phase, .. } => Some(*phase),
            ControllerState::EmergencyOverride { .. } => None,
        }
    }

    pub fn remaining(&self) -> Duration {
        match self {
            ControllerState::NormalCycle { remaining, .. }
            | ControllerState::EmergencyOverride { remaining, .. } => *remaining,
        }
    }

    pub fn signals(&self) -> SignalState {
        match self {
            ControllerState::NormalCycle { phase, .. } => phase.signals(),
            ControllerState::EmergencyOverride { direction, .. } => {
                SignalState::for_axis(direction.axis(), SignalColor::Green)
            }
        }
    }

    pub fn status(&self) -> String {
        match self {
            ControllerState::NormalCycle { phase, .. } => phase.status(),
            ControllerState::EmergencyOverride { direction, class, .. } => format!(
                "EMERGENCY ACTIVE: {} from {}",
                class.as_str().to_uppercase(),
                direction.as_str().to_uppercase()
            ),
        }
    }

    /// Runs the timer for one control period. A lapsed override always falls
    /// back to a fresh `ns_green`; chaining to the next queued request is the
    /// controller's decision, not the state's.
    pub fn step(self, dt: Duration, timing: &SignalTiming) -> (ControllerState, Option<Transition>) {
        match self {
            ControllerState::NormalCycle { phase, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    let next = phase.next();
                    (
                        ControllerState::NormalCycle { phase: next, remaining: next.duration(timing) },
                        Some(Transition::PhaseChanged { from: phase, to: next }),
                    )
                } else {
                    (ControllerState::NormalCycle { phase, remaining }, None)
                }
            }
            ControllerState::EmergencyOverride { direction, class, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    (
                        ControllerState::initial(timing),
                        Some(Transition::OverrideLapsed { direction, class }),
                    )
                } else {
                    (ControllerState::EmergencyOverride { direction, class, remaining }, None)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyRequest {
    pub direction: Direction,
    pub class: VehicleClass,
    pub arrived_at: Duration,
    /// Breaks ties between requests stamped within the same control period.
    pub sequence: u64,
}

impl EmergencyRequest {
    fn priority_key(&self) -> (u8, Duration, u64) {
        (
            self.class.emergency_rank().unwrap_or(u8::MAX),
            self.arrived_at,
            self.sequence,
        )
    }
}

/// Outstanding preemption requests. Small enough that linear scans win.
#[derive(Debug, Clone, Default)]
pub struct EmergencyQueue {
    requests: Vec<EmergencyRequest>,
}

impl EmergencyQueue {
    pub fn push(&mut self, request: EmergencyRequest) {
        self.requests.push(request);
    }

    /// Ambulances before fire trucks, then earliest arrival.
    pub fn peek_best(&self) -> Option<&EmergencyRequest> {
        self.requests.iter().min_by_key(|r| r.priority_key())
    }

    pub fn pop_best(&mut self) -> Option<EmergencyRequest> {
        let index = self.requests
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.priority_key())
            .map(|(i, _)| i)?;
        Some(self.requests.remove(index))
    }

    /// Drops every request from `direction`, returning how many were removed.
    pub fn clear_direction(&mut self, direction: Direction) -> usize {
        let before = self.requests.len();
        self.requests.retain(|r| r.direction != direction);
        before - self.requests.len()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmergencyRequest> {
        self.requests.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreemptionTrigger {
    Queued,
    Proximity(VehicleId),
}

/// Observable controller activity, rendered into the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    PhaseEntered(Phase),
    EmergencyQueued {
        direction: Direction,
        class: VehicleClass,
    },
    OverrideStarted {
        direction: Direction,
        class: VehicleClass,
        trigger: PreemptionTrigger,
    },
    OverrideEnded {
        direction: Direction,
        class: VehicleClass,
        cleared: usize,
    },
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::PhaseEntered(phase) => write!(f, "Signal phase: {}", phase.status()),
            ControllerEvent::EmergencyQueued { direction, class } => write!(
                f,
                "Emergency queued: {} from {}",
                class.as_str().to_uppercase(),
                direction.as_str().to_uppercase()
            ),
            ControllerEvent::OverrideStarted { direction, class, trigger } => {
                write!(
                    f,
                    "Emergency active: {} from {}",
                    class.as_str().to_uppercase(),
                    direction.as_str().to_uppercase()
                )?;
                if let PreemptionTrigger::Proximity(id) = trigger {
                    write!(f, " (vehicle {} approaching)", id.0)?;
                }
                Ok(())
            }
            ControllerEvent::OverrideEnded { direction, .. } => write!(
                f,
                "Emergency override ended ({})",
                direction.as_str().to_uppercase()
            ),
        }
    }
}

/// Everything a control tick pushes outward.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub events: Vec<ControllerEvent>,
    pub signals: SignalState,
    pub signals_changed: bool,
    pub override_active: bool,
    /// Whole seconds left in the current phase or hold, rounded down.
    pub remaining_secs: u64,
    pub status: String,
}

pub struct SignalController {
    timing: SignalTiming,
    center: Point,
    state: ControllerState,
    signals: SignalState,
    queue: EmergencyQueue,
    running: bool,
    clock: Duration,
    next_sequence: u64,
}

impl SignalController {
    pub fn new(config: &SimulationConfig) -> Self {
        let state = ControllerState::initial(&config.signals);
        Self {
            timing: config.signals.clone(),
            center: config.intersection.center(),
            state,
            signals: state.signals(),
            queue: EmergencyQueue::default(),
            running: false,
            clock: Duration::ZERO,
            next_sequence: 0,
        }
    }

    pub fn start(&mut self) -> Option<ControllerEvent> {
        if self.running {
            return None;
        }
        self.running = true;
        self.state = ControllerState::initial(&self.timing);
        self.signals = self.state.signals();
        Some(ControllerEvent::PhaseEntered(Phase::NsGreen))
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops the controller and returns it to `ns_green` with an empty queue.
    pub fn reset(&mut self) {
        self.running = false;
        self.queue.clear();
        self.state = ControllerState::initial(&self.timing);
        self.signals = self.state.signals();
        self.clock = Duration::ZERO;
        self.next_sequence = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn signals(&self) -> SignalState {
        self.signals
    }

    pub fn status(&self) -> String {
        self.state.status()
    }

    pub fn queue(&self) -> &EmergencyQueue {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn next_emergency(&self) -> Option<&EmergencyRequest> {
        self.queue.peek_best()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Queues a preemption request stamped with the controller clock. Works
    /// while stopped; the request waits for the first tick after `start`.
    pub fn enqueue(&mut self, direction: Direction, class: VehicleClass) -> Result<ControllerEvent, SimError> {
        if !class.is_emergency() {
            return Err(SimError::NotAnEmergencyVehicle(class));
        }

        self.queue.push(EmergencyRequest {
            direction,
            class,
            arrived_at: self.clock,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;

        log::debug!("Queued {} from {} ({} pending)", class, direction, self.queue.len());
        Ok(ControllerEvent::EmergencyQueued { direction, class })
    }

    /// One control period. Returns `None` while stopped.
    pub fn advance(&mut self, dt: Duration, vehicles: &[Vehicle]) -> Option<TickReport> {
        if !self.running {
            return None;
        }

        self.clock += dt;
        let before = self.signals;
        let mut events = Vec::new();

        // Proximity preemption takes the whole tick
        if let Some(vehicle) = self.approaching_emergency(vehicles) {
            let (direction, class, id) = (vehicle.direction, vehicle.class, vehicle.id);
            self.begin_override(direction, class, PreemptionTrigger::Proximity(id), &mut events);
        } else if self.state.is_override() {
            let (next, transition) = self.state.step(dt, &self.timing);
            self.state = next;
            if let Some(Transition::OverrideLapsed { direction, class }) = transition {
                // Drop duplicates for the served approach, then chain
                let cleared = self.queue.clear_direction(direction);
                events.push(ControllerEvent::OverrideEnded { direction, class, cleared });
                log::info!("Override for {} from {} lapsed", class, direction);

                match self.queue.pop_best() {
                    Some(request) => {
                        self.begin_override(request.direction, request.class, PreemptionTrigger::Queued, &mut events)
                    }
                    None => events.push(ControllerEvent::PhaseEntered(Phase::NsGreen)),
                }
            }
        } else if let Some(request) = self.queue.pop_best() {
            // Serve queued request
            self.begin_override(request.direction, request.class, PreemptionTrigger::Queued, &mut events);
        } else {
            // Normal cycle
            let (next, transition) = self.state.step(dt, &self.timing);
            self.state = next;
            if let Some(Transition::PhaseChanged { from, to }) = transition {
                log::debug!("Phase {:?} -> {:?}", from, to);
                events.push(ControllerEvent::PhaseEntered(to));
            }
        }

        self.signals = self.state.signals();
        debug_assert!(
            !(self.signals.is_green(Direction::North) && self.signals.is_green(Direction::East)),
            "both axes green: {:?}",
            self.signals
        );

        Some(TickReport {
            events,
            signals: self.signals,
            signals_changed: self.signals != before,
            override_active: self.state.is_override(),
            remaining_secs: self.state.remaining().as_secs(),
            status: self.state.status(),
        })
    }

    /// First emergency vehicle still short of the crossing and within the
    /// approach radius, unless an override is already running.
    fn approaching_emergency<'a>(&self, vehicles: &'a [Vehicle]) -> Option<&'a Vehicle> {
        if self.state.is_override() {
            return None;
        }

        vehicles.iter().find(|v| {
            v.is_emergency()
                && !v.has_passed_intersection
                && (v.position - self.center).magnitude() < self.timing.approach_distance
        })
    }

    fn begin_override(
        &mut self,
        direction: Direction,
        class: VehicleClass,
        trigger: PreemptionTrigger,
        events: &mut Vec<ControllerEvent>,
    ) {
        self.state = ControllerState::overriding(direction, class, &self.timing);
        log::info!("Preempting for {} from {} ({:?})", class, direction, trigger);
        events.push(ControllerEvent::OverrideStarted { direction, class, trigger });
    }
}
