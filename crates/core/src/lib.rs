pub mod browser;
pub mod config;
pub mod downloader;
pub mod driver;
pub mod metrics;
pub mod observer;
pub mod orchestrator;
pub mod service;
pub mod target;
pub mod testing;

pub use browser::{BrowserError, BrowserPage, ChromiumLauncher, LaunchConfig, PageLauncher};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use downloader::{
    DownloadConfig, DownloadError, DownloadOutcome, DownloadPipeline, DownloadReport,
    TierSelection,
};
pub use driver::{InteractionConfig, InteractionDriver, InteractionNoOp, PhaseOutcome};
pub use observer::{
    file_name_for, ClassifierConfig, ObservedTiles, RequestObserver, ResolutionTier,
    TileClassifier, TileRecord,
};
pub use orchestrator::{
    ExtractionCounts, ExtractionError, ExtractionPhase, ExtractionSession, ExtractionSummary,
    TileExtractor, ViewerConfig,
};
pub use service::{
    ExtractionHandle, ExtractionRecord, ExtractionRequest, ExtractionService, ExtractionStatus,
};
pub use target::{TargetConfig, ViewType, ViewerTarget};
