use std::time::Duration;

use crate::config::SimulationConfig;

/// Periodic jobs sharing one run loop. Ordering is also the tie-break when
/// two jobs fall due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Control,
    Animation,
    Spawn,
}

#[derive(Debug, Clone)]
struct PeriodicTask {
    kind: TaskKind,
    period: Duration,
    next_due: Duration,
}

/// Deterministic scheduler over simulated time.
#[derive(Debug, Clone)]
pub struct Timeline {
    now: Duration,
    tasks: Vec<PeriodicTask>,
}

impl Timeline {
    pub fn new(control: Duration, animation: Duration, spawn: Duration) -> Self {
        let tasks = [
            (TaskKind::Control, control),
            (TaskKind::Animation, animation),
            (TaskKind::Spawn, spawn),
        ]
        .into_iter()
        .map(|(kind, period)| {
            let period = period.max(Duration::from_millis(1));
            PeriodicTask { kind, period, next_due: period }
        })
        .collect();

        Self { now: Duration::ZERO, tasks }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.signals.control_interval(),
            config.traffic.animation_interval(),
            config.traffic.spawn_interval(),
        )
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn period(&self, kind: TaskKind) -> Duration {
        self.tasks
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.period)
            .unwrap_or_default()
    }

    /// Changes a period; the next run is rescheduled one new period from now.
    pub fn set_period(&mut self, kind: TaskKind, period: Duration) {
        let now = self.now;
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            task.period = period.max(Duration::from_millis(1));
            task.next_due = now + task.period;
        }
    }

    /// Schedules every task one full period after the current instant.
    pub fn restart(&mut self) {
        let now = self.now;
        for task in &mut self.tasks {
            task.next_due = now + task.period;
        }
    }

    /// Moves time forward and returns the jobs that fell due, in firing order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TaskKind> {
        let target = self.now + elapsed;
        let mut fired = Vec::new();

        while let Some(task) = self.tasks
            .iter_mut()
            .filter(|t| t.next_due <= target)
            .min_by_key(|t| (t.next_due, t.kind))
        {
            fired.push(task.kind);
            task.next_due += task.period;
        }

        self.now = target;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_runs_about_twelve_times_per_control_tick() {
        let mut timeline = Timeline::new(
            Duration::from_millis(200),
            Duration::from_millis(16),
            Duration::from_secs(60),
        );
        let fired = timeline.advance(Duration::from_millis(400));
        let control = fired.iter().filter(|k| **k == TaskKind::Control).count();
        let animation = fired.iter().filter(|k| **k == TaskKind::Animation).count();
        assert_eq!(control, 2);
        assert_eq!(animation, 25);
    }

    #[test]
    fn simultaneous_jobs_fire_control_first() {
        let mut timeline = Timeline::new(
            Duration::from_millis(100),
            Duration::from_millis(50),
            Duration::from_millis(100),
        );
        assert_eq!(
            timeline.advance(Duration::from_millis(100)),
            vec![TaskKind::Animation, TaskKind::Control, TaskKind::Animation, TaskKind::Spawn]
        );
    }

    #[test]
    fn set_period_reschedules_from_now() {
        let mut timeline = Timeline::new(
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_millis(1500),
        );
        timeline.advance(Duration::from_millis(1000));
        timeline.set_period(TaskKind::Spawn, Duration::from_millis(300));
        assert_eq!(timeline.advance(Duration::from_millis(299)), vec![]);
        assert_eq!(timeline.advance(Duration::from_millis(1)), vec![TaskKind::Spawn]);
    }
}
