//! `tileharvest extract`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info, warn};

use tileharvest_core::{
    validate_config, ChromiumLauncher, Config, ExtractionRequest, ExtractionService,
    ExtractionSummary, PhaseOutcome, TierSelection, ViewType,
};

use crate::metrics::encode_metrics;

/// Exit code for a run stopped by the user.
const EXIT_CANCELLED: i32 = 130;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Viewer page URL.
    #[arg(long, conflicts_with_all = ["year", "view"], required_unless_present = "year")]
    pub url: Option<String>,

    /// Model year, resolved through the configured URL templates.
    #[arg(long, requires = "view")]
    pub year: Option<String>,

    /// Which panorama: exterior or interior.
    #[arg(long, requires = "year")]
    pub view: Option<ViewType>,

    /// Output directory.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Tiers to write: all, high or basic.
    #[arg(long)]
    pub tiers: Option<TierSelection>,

    /// Maximum concurrent downloads.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Chrome/Chromium binary to launch.
    #[arg(long)]
    pub chrome: Option<PathBuf>,

    /// Show the browser window.
    #[arg(long)]
    pub headful: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,
}

impl ExtractArgs {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(concurrency) = self.concurrency {
            config.download.max_concurrent = concurrency;
        }
        if let Some(chrome) = &self.chrome {
            config.browser.executable = Some(chrome.clone());
        }
        if self.headful {
            config.browser.headless = false;
        }
    }

    fn request(&self) -> Result<ExtractionRequest> {
        let mut request = match (&self.url, &self.year, self.view) {
            (Some(url), _, _) => ExtractionRequest::for_url(url.clone()),
            (None, Some(year), Some(view)) => ExtractionRequest::for_model(year.clone(), view),
            _ => anyhow::bail!("either --url or both --year and --view are required"),
        };
        if let Some(tiers) = self.tiers {
            request = request.with_tiers(tiers);
        }
        if let Some(out) = &self.out {
            request = request.with_destination(out.clone());
        }
        Ok(request)
    }
}

pub async fn run(args: ExtractArgs, mut config: Config) -> Result<i32> {
    args.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    let request = args.request()?;

    let launcher = Arc::new(
        ChromiumLauncher::launch(
            config
                .browser
                .clone()
                .covering_navigation(config.viewer.navigation_timeout_ms),
        )
            .await
            .context("Failed to launch browser")?,
    );
    let service = ExtractionService::new(&config, launcher.clone())
        .context("Failed to set up extraction")?;

    let handle = service
        .start_extraction(request)
        .await
        .context("Failed to start extraction")?;
    info!(id = %handle.id(), "Extraction started, press Ctrl+C to cancel");

    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling extraction");
            cancel.cancel();
        }
    });

    let result = service.await_completion(handle).await;
    interrupt.abort();
    if let Err(e) = launcher.shutdown().await {
        warn!(error = %e, "Browser did not shut down cleanly");
    }

    let code = match result {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            0
        }
        Err(e) if e.is_cancelled() => {
            warn!("{}", e);
            EXIT_CANCELLED
        }
        Err(e) => {
            error!(phase = %e.phase(), "Extraction failed: {}", e);
            1
        }
    };

    if args.metrics {
        print!("{}", encode_metrics());
    }
    Ok(code)
}

fn describe(outcome: &PhaseOutcome) -> String {
    match outcome {
        PhaseOutcome::Driven { ticks, hits } => format!("{hits}/{ticks} ticks reached the viewer"),
        PhaseOutcome::NoOp(reason) => format!("skipped ({reason:?})"),
    }
}

fn print_summary(summary: &ExtractionSummary) {
    let download = &summary.download;
    println!("Extraction {} finished in {} ms", summary.id, summary.duration_ms);
    println!("  page:        {}", summary.page_url);
    println!("  zoom:        {}", describe(&summary.interaction.zoom));
    println!("  sweep A:     {}", describe(&summary.interaction.sweep_a));
    println!("  sweep B:     {}", describe(&summary.interaction.sweep_b));
    println!(
        "  observed:    {} tiles ({} high, {} basic)",
        summary.counts.observed, summary.counts.high, summary.counts.basic
    );
    println!("  destination: {}", download.destination.display());
    println!(
        "  downloaded:  {} ({} bytes), skipped {}, failed {}",
        download.downloaded,
        download.bytes_written,
        download.skipped,
        download.failed.len()
    );
    println!("  high tiles on disk: {}", download.high_on_disk);
    for failure in &download.failed {
        println!("  failed: {} ({})", failure.url, failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileharvest_core::ViewerTarget;

    fn args() -> ExtractArgs {
        ExtractArgs {
            url: None,
            year: None,
            view: None,
            out: None,
            tiers: None,
            concurrency: None,
            chrome: None,
            headful: false,
            json: false,
            metrics: false,
        }
    }

    #[test]
    fn test_request_from_model_year() {
        let args = ExtractArgs {
            year: Some("2026".to_string()),
            view: Some(ViewType::Interior),
            tiers: Some(TierSelection::High),
            out: Some(PathBuf::from("/tmp/tiles")),
            ..args()
        };

        let request = args.request().unwrap();
        assert_eq!(request.target, ViewerTarget::model("2026", ViewType::Interior));
        assert_eq!(request.tiers, Some(TierSelection::High));
        assert_eq!(request.destination, Some(PathBuf::from("/tmp/tiles")));
    }

    #[test]
    fn test_request_without_target_fails() {
        assert!(args().request().is_err());
    }

    #[test]
    fn test_overrides_applied() {
        let args = ExtractArgs {
            concurrency: Some(9),
            headful: true,
            ..args()
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.download.max_concurrent, 9);
        assert!(!config.browser.headless);
    }
}
