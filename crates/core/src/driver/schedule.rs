//! Fixed-cadence tick schedules.

use std::time::Duration;

use super::config::{SweepConfig, ZoomConfig};

/// A phase expressed as an explicit tick count and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    pub ticks: u32,
    pub cadence: Duration,
}

impl TickSchedule {
    pub fn new(ticks: u32, cadence: Duration) -> Self {
        Self { ticks, cadence }
    }

    pub fn zoom(config: &ZoomConfig) -> Self {
        Self::new(config.ticks, Duration::from_millis(config.cadence_ms))
    }

    /// One tick per angle in `0, step, 2*step, ..` up to and including the
    /// target.
    pub fn sweep(config: &SweepConfig) -> Self {
        let ticks = if config.step_degrees == 0 {
            1
        } else {
            config.target_degrees / config.step_degrees + 1
        };
        Self::new(ticks, Duration::from_millis(config.cadence_ms))
    }

    /// Wall time between the first and the last tick.
    pub fn duration(&self) -> Duration {
        self.cadence * self.ticks.saturating_sub(1)
    }
}

/// Pan angles visited by a sweep, monotonically increasing.
pub fn sweep_angles(config: &SweepConfig) -> impl Iterator<Item = u32> + '_ {
    let ticks = TickSchedule::sweep(config).ticks;
    (0..ticks).map(move |i| i * config.step_degrees)
}
