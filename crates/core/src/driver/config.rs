//! Interaction driver configuration.

use serde::{Deserialize, Serialize};

/// Synthetic-input settings. Tick counts and cadences are empirical; they
/// were tuned against one vendor page and carry no protocol guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Expressions that may resolve to the viewer's player object, tried in
    /// order on every tick. The first one exposing the wanted method wins.
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,

    #[serde(default)]
    pub zoom: ZoomConfig,

    /// First rotation sweep (one revolution).
    #[serde(default = "default_sweep_a")]
    pub sweep_a: SweepConfig,

    /// Second rotation sweep (two revolutions).
    #[serde(default = "default_sweep_b")]
    pub sweep_b: SweepConfig,
}

/// Sustained zoom-in phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// CSS selectors for the zoom-in control, tried in order.
    #[serde(default = "default_control_selectors")]
    pub control_selectors: Vec<String>,

    /// Skin object whose `elementMouseDown` map tracks held controls.
    #[serde(default = "default_skin_object")]
    pub skin_object: String,

    /// Key of the zoom-in control in `elementMouseDown`.
    #[serde(default = "default_control_id")]
    pub control_id: String,

    /// Player method performing one zoom step.
    #[serde(default = "default_zoom_method")]
    pub method: String,

    /// Literal argument list passed to `method`.
    #[serde(default = "default_zoom_args")]
    pub args: String,

    #[serde(default = "default_zoom_ticks")]
    pub ticks: u32,

    #[serde(default = "default_zoom_cadence")]
    pub cadence_ms: u64,
}

/// One rotation sweep from 0° to `target_degrees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Player method taking an absolute pan angle.
    #[serde(default = "default_pan_method")]
    pub method: String,

    pub target_degrees: u32,

    pub step_degrees: u32,

    pub cadence_ms: u64,
}

fn default_entry_points() -> Vec<String> {
    vec![
        "window.player".to_string(),
        "window.skinObj && window.skinObj.player".to_string(),
    ]
}

fn default_control_selectors() -> Vec<String> {
    vec![
        "[gg-id=\"zoomin\"]".to_string(),
        ".zoomin".to_string(),
        "#zoomin".to_string(),
    ]
}

fn default_skin_object() -> String {
    "window.skinObj".to_string()
}

fn default_control_id() -> String {
    "zoomin".to_string()
}

fn default_zoom_method() -> String {
    "changeFovLog".to_string()
}

fn default_zoom_args() -> String {
    "-1, true".to_string()
}

fn default_zoom_ticks() -> u32 {
    80
}

fn default_zoom_cadence() -> u64 {
    100
}

fn default_pan_method() -> String {
    "changePan".to_string()
}

fn default_sweep_a() -> SweepConfig {
    SweepConfig {
        method: default_pan_method(),
        target_degrees: 360,
        step_degrees: 15,
        cadence_ms: 200,
    }
}

fn default_sweep_b() -> SweepConfig {
    SweepConfig {
        method: default_pan_method(),
        target_degrees: 720,
        step_degrees: 20,
        cadence_ms: 150,
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            control_selectors: default_control_selectors(),
            skin_object: default_skin_object(),
            control_id: default_control_id(),
            method: default_zoom_method(),
            args: default_zoom_args(),
            ticks: default_zoom_ticks(),
            cadence_ms: default_zoom_cadence(),
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            entry_points: default_entry_points(),
            zoom: ZoomConfig::default(),
            sweep_a: default_sweep_a(),
            sweep_b: default_sweep_b(),
        }
    }
}

impl InteractionConfig {
    /// Shrink every tick count and cadence, keeping the phase structure.
    /// Useful when driving scripted pages in tests.
    pub fn fast() -> Self {
        let mut config = Self::default();
        config.zoom.ticks = 4;
        config.zoom.cadence_ms = 1;
        config.sweep_a.cadence_ms = 1;
        config.sweep_a.step_degrees = 90;
        config.sweep_b.cadence_ms = 1;
        config.sweep_b.step_degrees = 180;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InteractionConfig::default();
        assert_eq!(config.entry_points.len(), 2);
        assert_eq!(config.zoom.ticks, 80);
        assert_eq!(config.zoom.cadence_ms, 100);
        assert_eq!(config.sweep_a.target_degrees, 360);
        assert_eq!(config.sweep_a.step_degrees, 15);
        assert_eq!(config.sweep_b.target_degrees, 720);
        assert_eq!(config.sweep_b.cadence_ms, 150);
    }

    #[test]
    fn test_deserialize_sweep_override() {
        let toml = r#"
            [sweep_b]
            target_degrees = 1080
            step_degrees = 30
            cadence_ms = 100
        "#;
        let config: InteractionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sweep_b.target_degrees, 1080);
        assert_eq!(config.sweep_b.method, "changePan");
        assert_eq!(config.sweep_a, default_sweep_a());
    }
}
