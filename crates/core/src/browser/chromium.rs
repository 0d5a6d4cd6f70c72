//! Chromium-backed pages using chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, SetUserAgentOverrideParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::LaunchConfig;
use super::{BrowserError, BrowserPage, PageLauncher, RequestStream};

/// Interval between selector probes while waiting for an element.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches one Chromium process and hands out pages from it.
pub struct ChromiumLauncher {
    config: LaunchConfig,
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumLauncher {
    /// Start the browser process.
    pub async fn launch(config: LaunchConfig) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.request_timeout())
            .args(config.args.iter().map(String::as_str));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
        });

        info!(
            headless = config.headless,
            request_timeout_ms = config.request_timeout_ms,
            "Chromium launched"
        );

        Ok(Self {
            config,
            browser: Mutex::new(Some(browser)),
            handler,
        })
    }

    /// Close the browser process. Pages handed out earlier stop working.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser
                .close()
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
            let _ = browser.wait().await;
            info!("Chromium closed");
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl PageLauncher for ChromiumLauncher {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| BrowserError::Launch("browser already shut down".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        page.set_user_agent(SetUserAgentOverrideParams::new(self.config.user_agent.clone()))
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        Ok(Box::new(ChromiumPage { page }))
    }
}

/// A single Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn selector_present(&self, selector: &str) -> Result<bool, BrowserError> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        let value = self
            .evaluate(&format!("document.querySelector({literal}) !== null"))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                debug!(url = %url, elapsed_ms = start.elapsed().as_millis() as u64, "Page loaded");
                Ok(())
            }
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn observe_requests(&self) -> Result<RequestStream, BrowserError> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        let events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        Ok(events.map(|event| event.request.url.clone()).boxed())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.selector_present(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                // The document may be swapped out mid-probe; keep polling.
                Err(e) => debug!(selector = %selector, error = %e, "Selector probe failed"),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::SelectorTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if let Err(e) = self.page.clone().close().await {
            warn!(error = %e, "Failed to close page");
        }
        Ok(())
    }
}
