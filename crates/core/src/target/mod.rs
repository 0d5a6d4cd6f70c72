//! Viewer page resolution.
//!
//! A run targets either an explicit page URL or a (model year, view type)
//! pair that is expanded through the configured URL templates.

mod config;

pub use config::TargetConfig;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while resolving a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid model year '{0}'")]
    InvalidYear(String),

    #[error("invalid page URL '{0}'")]
    InvalidUrl(String),
}

/// Which panorama of a model to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Exterior,
    Interior,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exterior => write!(f, "exterior"),
            Self::Interior => write!(f, "interior"),
        }
    }
}

impl FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exterior" | "ext" => Ok(Self::Exterior),
            "interior" | "int" => Ok(Self::Interior),
            other => Err(format!(
                "unknown view type '{other}' (expected exterior or interior)"
            )),
        }
    }
}

/// The page an extraction runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewerTarget {
    /// An explicit viewer page.
    Url { url: String },
    /// A model year and view resolved through [`TargetConfig`].
    Model { year: String, view: ViewType },
}

impl ViewerTarget {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn model(year: impl Into<String>, view: ViewType) -> Self {
        Self::Model {
            year: year.into(),
            view,
        }
    }

    /// Expand into a page URL.
    pub fn resolve(&self, config: &TargetConfig) -> Result<String, TargetError> {
        match self {
            Self::Url { url } => {
                if url.starts_with("https://") || url.starts_with("http://") {
                    Ok(url.clone())
                } else {
                    Err(TargetError::InvalidUrl(url.clone()))
                }
            }
            Self::Model { year, view } => {
                if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
                    return Err(TargetError::InvalidYear(year.clone()));
                }
                let template = match view {
                    ViewType::Exterior => &config.exterior_path,
                    ViewType::Interior => &config.interior_path,
                };
                let path = template
                    .replace("{model}", &config.model)
                    .replace("{year}", year);
                Ok(format!("{}{}", config.base_url.trim_end_matches('/'), path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_year() {
        let config = TargetConfig::default();

        assert_eq!(
            ViewerTarget::model("2026", ViewType::Exterior).resolve(&config),
            Ok("https://www.honda.mx/autos/city/2026/city_2026_ext_360".to_string())
        );
        assert_eq!(
            ViewerTarget::model("2024", ViewType::Interior).resolve(&config),
            Ok("https://www.honda.mx/autos/city/2024/city_2024_int_360".to_string())
        );
    }

    #[test]
    fn test_resolve_custom_template() {
        let config = TargetConfig {
            base_url: "https://viewer.test/".to_string(),
            model: "civic".to_string(),
            exterior_path: "/{model}/{year}/ext".to_string(),
            interior_path: "/{model}/{year}/int".to_string(),
        };

        assert_eq!(
            ViewerTarget::model("2025", ViewType::Exterior).resolve(&config),
            Ok("https://viewer.test/civic/2025/ext".to_string())
        );
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        let config = TargetConfig::default();

        assert_eq!(
            ViewerTarget::model("26", ViewType::Exterior).resolve(&config),
            Err(TargetError::InvalidYear("26".to_string()))
        );
        assert_eq!(
            ViewerTarget::url("ftp://viewer.test").resolve(&config),
            Err(TargetError::InvalidUrl("ftp://viewer.test".to_string()))
        );
        assert!(ViewerTarget::url("http://localhost:8080/viewer")
            .resolve(&config)
            .is_ok());
    }

    #[test]
    fn test_view_type_parse() {
        assert_eq!("exterior".parse::<ViewType>(), Ok(ViewType::Exterior));
        assert_eq!("INT".parse::<ViewType>(), Ok(ViewType::Interior));
        assert!("roof".parse::<ViewType>().is_err());
    }
}
