//! Testing utilities and mock implementations.
//!
//! [`MockBrowserPage`] stands in for a real viewer page: it emits scripted
//! request URLs as the page is loaded and driven, answers the driver's probe
//! scripts and records everything it was asked to do.
//!
//! # Example
//!
//! ```rust,ignore
//! use tileharvest_core::testing::{fixtures, MockBrowserPage, MockLauncher};
//!
//! let page = MockBrowserPage::new();
//! page.set_load_requests(fixtures::viewer_requests("https://cdn.test")).await;
//! page.set_pan_requests(vec![fixtures::high_tile("https://cdn.test", 3)]).await;
//!
//! let launcher = MockLauncher::new(page.clone());
//! // hand the launcher to an ExtractionService...
//! ```

mod mock_launcher;
mod mock_page;

pub use mock_launcher::MockLauncher;
pub use mock_page::MockBrowserPage;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Config;
    use crate::driver::InteractionConfig;
    use crate::orchestrator::SettleConfig;

    /// A high-resolution tile URL under `base`.
    pub fn high_tile(base: &str, index: u32) -> String {
        format!("{base}/pano/tiles/exteriorlevel2/tile_h{index}.jpg")
    }

    /// A basic tile URL under `base`.
    pub fn basic_tile(base: &str, index: u32) -> String {
        format!("{base}/pano/tiles/exteriorlevel1/tile_b{index}.jpg")
    }

    /// Requests a viewer page issues on load: two basic tiles and a few
    /// non-tile assets.
    pub fn viewer_requests(base: &str) -> Vec<String> {
        vec![
            format!("{base}/index.html"),
            format!("{base}/pano/skin.js"),
            basic_tile(base, 0),
            basic_tile(base, 1),
            format!("{base}/pano/tiles/preview.png"),
        ]
    }

    /// Configuration with every delay shrunk to test scale and downloads
    /// allowed over plain HTTP.
    pub fn fast_config() -> Config {
        let mut config = Config::default();
        config.viewer.navigation_timeout_ms = 1000;
        config.viewer.ready_timeout_ms = 1000;
        config.viewer.settle = SettleConfig::none();
        config.interaction = InteractionConfig::fast();
        config.download.https_only = false;
        config.download.max_concurrent = 2;
        config
    }
}
