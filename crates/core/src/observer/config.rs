//! Classifier configuration.

use serde::{Deserialize, Serialize};

/// URL marker sets used to recognise and grade tile requests.
///
/// The defaults mirror the path conventions of the one vendor page the tool
/// was tuned against. They are heuristics, not a protocol: expect both false
/// positives (non-tile images whose path happens to contain a marker) and
/// false negatives (tiles served under unfamiliar directory names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// File extensions that identify an image request.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Path fragments of which at least one must be present for a URL to
    /// count as a tile.
    #[serde(default = "default_tile_markers")]
    pub tile_markers: Vec<String>,

    /// Path fragments that alone mark a tile as high resolution.
    #[serde(default = "default_high_markers")]
    pub high_markers: Vec<String>,

    /// Frame-index marker. A URL containing it is high resolution unless the
    /// marker is immediately followed by `reserved_frame_index`.
    #[serde(default = "default_frame_marker")]
    pub frame_marker: Option<String>,

    /// Frame index used by the lower tier.
    #[serde(default = "default_reserved_frame_index")]
    pub reserved_frame_index: Option<String>,
}

fn default_extensions() -> Vec<String> {
    vec![".jpg".to_string()]
}

fn default_tile_markers() -> Vec<String> {
    ["tiles/", "exteriorlevel2/", "column", "cf_", "l_"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_high_markers() -> Vec<String> {
    ["exteriorlevel2/", "column", "cf_"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_frame_marker() -> Option<String> {
    Some("l_".to_string())
}

fn default_reserved_frame_index() -> Option<String> {
    Some("2".to_string())
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            tile_markers: default_tile_markers(),
            high_markers: default_high_markers(),
            frame_marker: default_frame_marker(),
            reserved_frame_index: default_reserved_frame_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.extensions, vec![".jpg"]);
        assert_eq!(config.tile_markers.len(), 5);
        assert!(config.high_markers.contains(&"cf_".to_string()));
        assert_eq!(config.frame_marker.as_deref(), Some("l_"));
        assert_eq!(config.reserved_frame_index.as_deref(), Some("2"));
    }

    #[test]
    fn test_deserialize_partial_markers() {
        let toml = r#"
            frame_marker = "l_"
            high_markers = []
        "#;
        let config: ClassifierConfig = toml::from_str(toml).unwrap();
        assert!(config.high_markers.is_empty());
        assert_eq!(config.extensions, vec![".jpg"]);
    }
}
