use super::{types::Config, ConfigError};

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.into()))
}

/// Validate configuration
/// Currently validates:
/// - Timeouts, tick counts, cadences and sweep steps are non-zero
/// - Download concurrency is non-zero
/// - Classifier marker lists and entry points are non-empty
/// - Target URL and path templates are well-formed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Browser
    if config.browser.request_timeout_ms == 0 {
        return invalid("browser.request_timeout_ms cannot be 0");
    }

    // Viewer
    if config.viewer.navigation_timeout_ms == 0 {
        return invalid("viewer.navigation_timeout_ms cannot be 0");
    }
    if config.viewer.ready_timeout_ms == 0 {
        return invalid("viewer.ready_timeout_ms cannot be 0");
    }
    if config.viewer.ready_selector.trim().is_empty() {
        return invalid("viewer.ready_selector cannot be empty");
    }

    // Interaction
    let interaction = &config.interaction;
    if interaction.entry_points.is_empty() {
        return invalid("interaction.entry_points cannot be empty");
    }
    if interaction.zoom.control_selectors.is_empty() {
        return invalid("interaction.zoom.control_selectors cannot be empty");
    }
    if interaction.zoom.ticks == 0 || interaction.zoom.cadence_ms == 0 {
        return invalid("interaction.zoom ticks and cadence_ms must be positive");
    }
    for (name, sweep) in [("sweep_a", &interaction.sweep_a), ("sweep_b", &interaction.sweep_b)] {
        if sweep.step_degrees == 0 || sweep.cadence_ms == 0 {
            return invalid(format!(
                "interaction.{name} step_degrees and cadence_ms must be positive"
            ));
        }
    }

    // Classifier
    if config.classifier.extensions.is_empty() {
        return invalid("classifier.extensions cannot be empty");
    }
    if config.classifier.tile_markers.is_empty() {
        return invalid("classifier.tile_markers cannot be empty");
    }
    if config.classifier.high_markers.is_empty() && config.classifier.frame_marker.is_none() {
        return invalid("classifier needs high_markers or a frame_marker");
    }

    // Download
    if config.download.max_concurrent == 0 {
        return invalid("download.max_concurrent cannot be 0");
    }
    if config.download.timeout_secs == 0 {
        return invalid("download.timeout_secs cannot be 0");
    }

    // Target
    let target = &config.target;
    if !(target.base_url.starts_with("https://") || target.base_url.starts_with("http://")) {
        return invalid(format!(
            "target.base_url must be an http(s) URL, got '{}'",
            target.base_url
        ));
    }
    for (name, template) in [
        ("exterior_path", &target.exterior_path),
        ("interior_path", &target.interior_path),
    ] {
        if !template.contains("{year}") {
            return invalid(format!("target.{name} must contain {{year}}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.download.max_concurrent = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("max_concurrent"));
    }

    #[test]
    fn test_validate_zero_ticks_fails() {
        let mut config = Config::default();
        config.interaction.zoom.ticks = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.interaction.sweep_b.cadence_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sweep_b"));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.viewer.ready_timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.browser.request_timeout_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_empty_markers_fails() {
        let mut config = Config::default();
        config.classifier.tile_markers.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_template_without_year_fails() {
        let mut config = Config::default();
        config.target.interior_path = "/autos/city/interior".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("interior_path"));
    }
}
