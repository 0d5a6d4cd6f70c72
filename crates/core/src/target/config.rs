//! Viewer target configuration.

use serde::{Deserialize, Serialize};

/// Where the viewer pages live. Path templates may use `{model}` and must
/// use `{year}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model slug substituted for `{model}`.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_exterior_path")]
    pub exterior_path: String,

    #[serde(default = "default_interior_path")]
    pub interior_path: String,
}

fn default_base_url() -> String {
    "https://www.honda.mx".to_string()
}

fn default_model() -> String {
    "city".to_string()
}

fn default_exterior_path() -> String {
    "/autos/{model}/{year}/{model}_{year}_ext_360".to_string()
}

fn default_interior_path() -> String {
    "/autos/{model}/{year}/{model}_{year}_int_360".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            exterior_path: default_exterior_path(),
            interior_path: default_interior_path(),
        }
    }
}
