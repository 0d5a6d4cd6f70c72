//! Synthetic interaction with the embedded viewer.
//!
//! The viewer only requests its finer tiles while the user zooms and rotates.
//! The driver reproduces that with two kinds of phase:
//! - **Zoom**: hold the zoom-in control and step the field of view.
//! - **Sweep**: pan through a full angle range at a fixed cadence.
//!
//! Missing controls or entry points make a phase a no-op, never an error.

mod config;
#[allow(clippy::module_inception)]
mod driver;
mod probes;
mod schedule;

pub use config::{InteractionConfig, SweepConfig, ZoomConfig};
pub use driver::{InteractionDriver, InteractionNoOp, PhaseOutcome};
pub use probes::{control_script, invoke_script, ProbeOutcome};
pub use schedule::{sweep_angles, TickSchedule};
