//! Interaction driver implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::browser::BrowserPage;

use super::config::{InteractionConfig, SweepConfig};
use super::probes::{control_script, invoke_script, ProbeOutcome};
use super::schedule::{sweep_angles, TickSchedule};

/// Why a phase degraded to a no-op. Not an error: the run continues with
/// whatever the page loaded on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionNoOp {
    /// No zoom control matched any selector.
    ZoomControlMissing,
    /// No entry point exposed the method on any tick.
    EntryPointMissing,
}

/// What a phase did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Ticks were issued; `hits` of them reached a viewer entry point.
    Driven { ticks: u32, hits: u32 },
    NoOp(InteractionNoOp),
}

impl PhaseOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp(_))
    }

    fn from_ticks(ticks: u32, hits: u32) -> Self {
        if hits == 0 {
            Self::NoOp(InteractionNoOp::EntryPointMissing)
        } else {
            Self::Driven { ticks, hits }
        }
    }
}

/// Issues synthetic input against the embedded viewer.
pub struct InteractionDriver {
    config: InteractionConfig,
}

impl InteractionDriver {
    pub fn new(config: InteractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Hold the zoom-in control for a fixed number of zoom steps.
    pub async fn zoom(&self, page: &dyn BrowserPage) -> PhaseOutcome {
        let zoom = &self.config.zoom;

        let press = control_script(
            &zoom.control_selectors,
            "mousedown",
            &zoom.skin_object,
            &zoom.control_id,
            true,
        );
        let found = match page.evaluate(&press).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "Zoom control lookup failed");
                false
            }
        };
        if !found {
            info!("No zoom control found, skipping zoom phase");
            return PhaseOutcome::NoOp(InteractionNoOp::ZoomControlMissing);
        }

        let schedule = TickSchedule::zoom(zoom);
        info!(
            ticks = schedule.ticks,
            duration_ms = schedule.duration().as_millis() as u64,
            "Holding zoom control"
        );

        let step = invoke_script(&self.config.entry_points, &zoom.method, &zoom.args);
        let hits = run_ticks(page, schedule, "zoom", |_| step.clone()).await;

        let release = control_script(
            &zoom.control_selectors,
            "mouseup",
            &zoom.skin_object,
            &zoom.control_id,
            false,
        );
        if let Err(e) = page.evaluate(&release).await {
            warn!(error = %e, "Failed to release zoom control");
        }

        let outcome = PhaseOutcome::from_ticks(schedule.ticks, hits);
        info!(hits, ticks = schedule.ticks, "Zoom phase finished");
        outcome
    }

    /// Pan through `0..=target_degrees` at a fixed cadence.
    pub async fn sweep(&self, page: &dyn BrowserPage, sweep: &SweepConfig) -> PhaseOutcome {
        let schedule = TickSchedule::sweep(sweep);
        info!(
            target_degrees = sweep.target_degrees,
            step_degrees = sweep.step_degrees,
            ticks = schedule.ticks,
            "Starting rotation sweep"
        );

        let scripts: Vec<String> = sweep_angles(sweep)
            .map(|angle| invoke_script(&self.config.entry_points, &sweep.method, &angle.to_string()))
            .collect();
        let hits = run_ticks(page, schedule, "sweep", |tick| scripts[tick as usize].clone()).await;

        let outcome = PhaseOutcome::from_ticks(schedule.ticks, hits);
        info!(hits, ticks = schedule.ticks, "Rotation sweep finished");
        outcome
    }
}

/// Evaluate one script per tick at the schedule's cadence. Each tick stands
/// alone: a failed evaluation or a missing entry point is counted and the
/// loop moves on. Returns the number of ticks that reached the viewer.
async fn run_ticks<F>(page: &dyn BrowserPage, schedule: TickSchedule, label: &str, script_for: F) -> u32
where
    F: Fn(u32) -> String,
{
    let mut interval = tokio::time::interval(schedule.cadence.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut hits = 0;
    for tick in 0..schedule.ticks {
        interval.tick().await;
        match page.evaluate(&script_for(tick)).await {
            Ok(value) => {
                if ProbeOutcome::from_value(&value).is_hit() {
                    hits += 1;
                }
            }
            Err(e) => debug!(phase = label, tick, error = %e, "Tick evaluation failed"),
        }
        if (tick + 1) % 10 == 0 {
            debug!(phase = label, tick = tick + 1, total = schedule.ticks, "Tick progress");
        }
    }
    hits
}
