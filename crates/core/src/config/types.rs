use serde::{Deserialize, Serialize};

use crate::browser::LaunchConfig;
use crate::downloader::DownloadConfig;
use crate::driver::InteractionConfig;
use crate::observer::ClassifierConfig;
use crate::orchestrator::ViewerConfig;
use crate::target::TargetConfig;

/// Root configuration.
///
/// Every section is optional in the file; an empty document yields the
/// defaults tuned against the observed vendor page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub browser: LaunchConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub target: TargetConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.viewer.navigation_timeout_ms, 60_000);
        assert_eq!(config.interaction.zoom.ticks, 80);
        assert_eq!(config.download.max_concurrent, 4);
        assert!(config.target.base_url.starts_with("https://"));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml = r##"
[download]
max_concurrent = 8
destination = "/tmp/tiles"

[viewer]
ready_selector = "#pano"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.download.max_concurrent, 8);
        assert_eq!(config.download.destination.to_str().unwrap(), "/tmp/tiles");
        assert_eq!(config.viewer.ready_selector, "#pano");
        // untouched sections keep defaults
        assert_eq!(config.viewer.ready_timeout_ms, 30_000);
        assert_eq!(config.interaction.sweep_b.target_degrees, 720);
    }

    #[test]
    fn test_deserialize_classifier_markers() {
        let toml = r#"
[classifier]
extensions = [".jpg", ".webp"]
tile_markers = ["tiles/"]
high_markers = ["hd/"]
frame_marker = "lvl_"
reserved_frame_index = "0"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.classifier.extensions, vec![".jpg", ".webp"]);
        assert_eq!(config.classifier.high_markers, vec!["hd/"]);
        assert_eq!(config.classifier.frame_marker.as_deref(), Some("lvl_"));
    }
}
