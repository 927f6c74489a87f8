use crate::simulation::SignalState;

/// Receives everything the core pushes outward: light colors, countdown,
/// status line and event log. Renderers, audio and UI implement this.
pub trait SimulationObserver {
    fn signals_changed(&mut self, _signals: &SignalState, _override_active: bool) {}

    fn timer_updated(&mut self, _remaining_secs: u64) {}

    fn status_changed(&mut self, _status: &str) {}

    fn event_logged(&mut self, _message: &str) {}
}

/// Forwards observations to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SimulationObserver for LogObserver {
    fn signals_changed(&mut self, signals: &SignalState, override_active: bool) {
        log::debug!("Signals{}: {:?}", if override_active { " (override)" } else { "" }, signals);
    }

    fn status_changed(&mut self, status: &str) {
        log::debug!("Status: {}", status);
    }

    fn event_logged(&mut self, message: &str) {
        log::info!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Signals { signals: SignalState, override_active: bool },
    Timer(u64),
    Status(String),
    Event(String),
}

/// Keeps every observation in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub observations: Vec<Observation>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<&str> {
        self.observations
            .iter()
            .filter_map(|o| match o {
                Observation::Event(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.observations.iter().rev().find_map(|o| match o {
            Observation::Status(status) => Some(status.as_str()),
            _ => None,
        })
    }

    pub fn last_timer(&self) -> Option<u64> {
        self.observations.iter().rev().find_map(|o| match o {
            Observation::Timer(secs) => Some(*secs),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.observations.clear();
    }
}

impl SimulationObserver for RecordingObserver {
    fn signals_changed(&mut self, signals: &SignalState, override_active: bool) {
        self.observations.push(Observation::Signals { signals: *signals, override_active });
    }

    fn timer_updated(&mut self, remaining_secs: u64) {
        self.observations.push(Observation::Timer(remaining_secs));
    }

    fn status_changed(&mut self, status: &str) {
        self.observations.push(Observation::Status(status.to_string()));
    }

    fn event_logged(&mut self, message: &str) {
        self.observations.push(Observation::Event(message.to_string()));
    }
}
