//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page-load bounds and the settling delays inserted between phases.
///
/// The settling delays give requests triggered by an interaction time to
/// actually fire. They are empirical and can be tuned freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Upper bound for the initial navigation (milliseconds).
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Selector whose presence means the viewer has initialised.
    #[serde(default = "default_ready_selector")]
    pub ready_selector: String,

    /// Upper bound for the viewer-ready wait (milliseconds).
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,

    #[serde(default)]
    pub settle: SettleConfig,
}

/// Settling delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleConfig {
    /// After the viewer marker appears, before any interaction.
    #[serde(default = "default_initial")]
    pub initial_ms: u64,

    /// After the zoom phase.
    #[serde(default = "default_after_zoom")]
    pub after_zoom_ms: u64,

    /// After the first rotation sweep.
    #[serde(default = "default_after_sweep_a")]
    pub after_sweep_a_ms: u64,

    /// After the second rotation sweep.
    #[serde(default = "default_after_sweep_b")]
    pub after_sweep_b_ms: u64,
}

fn default_navigation_timeout() -> u64 {
    60_000
}

fn default_ready_selector() -> String {
    "object, .ggskin, #object2vr".to_string()
}

fn default_ready_timeout() -> u64 {
    30_000
}

fn default_initial() -> u64 {
    5000
}

fn default_after_zoom() -> u64 {
    3000
}

fn default_after_sweep_a() -> u64 {
    8000
}

fn default_after_sweep_b() -> u64 {
    5000
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_initial(),
            after_zoom_ms: default_after_zoom(),
            after_sweep_a_ms: default_after_sweep_a(),
            after_sweep_b_ms: default_after_sweep_b(),
        }
    }
}

impl SettleConfig {
    /// No settling at all.
    pub fn none() -> Self {
        Self {
            initial_ms: 0,
            after_zoom_ms: 0,
            after_sweep_a_ms: 0,
            after_sweep_b_ms: 0,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout(),
            ready_selector: default_ready_selector(),
            ready_timeout_ms: default_ready_timeout(),
            settle: SettleConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.navigation_timeout(), Duration::from_secs(60));
        assert_eq!(config.ready_timeout(), Duration::from_secs(30));
        assert_eq!(config.ready_selector, "object, .ggskin, #object2vr");
        assert_eq!(config.settle.initial_ms, 5000);
        assert_eq!(config.settle.after_zoom_ms, 3000);
        assert_eq!(config.settle.after_sweep_a_ms, 8000);
        assert_eq!(config.settle.after_sweep_b_ms, 5000);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            ready_timeout_ms = 1000
            [settle]
            initial_ms = 0
        "#;
        let config: ViewerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ready_timeout_ms, 1000);
        assert_eq!(config.settle.initial_ms, 0);
        assert_eq!(config.settle.after_sweep_a_ms, 8000);
        assert_eq!(config.navigation_timeout_ms, 60_000);
    }
}
