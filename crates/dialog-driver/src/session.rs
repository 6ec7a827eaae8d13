use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Handler;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cdp::CdpDialogDriver;
use crate::errors::{DriverError, DriverResult};
use crate::model::SelectorSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Persistent profile directory, so a manual login survives between runs.
    pub user_data_dir: PathBuf,
    pub executable: Option<PathBuf>,
    /// DevTools websocket of an already running browser; skips launching.
    pub connect_url: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub request_timeout_ms: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            user_data_dir: PathBuf::from(".easyapply/browser-profile"),
            executable: None,
            connect_url: None,
            window_width: 1366,
            window_height: 900,
            request_timeout_ms: 30_000,
        }
    }
}

/// Owns the browser connection and its event-handler task for one batch run.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

impl BrowserSession {
    pub async fn launch(options: &BrowserOptions) -> DriverResult<Self> {
        let (browser, handler) = match options.connect_url.as_deref() {
            Some(url) => {
                info!(url, "connecting to running browser");
                Browser::connect(url)
                    .await
                    .map_err(|err| DriverError::Protocol(format!("browser connect failed: {err}")))?
            }
            None => {
                let config = browser_config(options)?;
                info!(profile = %options.user_data_dir.display(), headless = options.headless, "launching browser");
                Browser::launch(config)
                    .await
                    .map_err(|err| DriverError::Protocol(format!("browser launch failed: {err}")))?
            }
        };

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));
        Ok(Self {
            browser,
            handler_task,
            closed,
        })
    }

    /// Opens a blank tab and wraps it in a driver.
    pub async fn open_driver(&self, selectors: SelectorSet) -> DriverResult<CdpDialogDriver> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| DriverError::Protocol(format!("failed to open tab: {err}")))?;
        Ok(CdpDialogDriver::new(page, selectors))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn close(&mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "browser close failed");
        }
        if let Err(err) = self.browser.wait().await {
            warn!(error = %err, "browser process wait failed");
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

fn browser_config(options: &BrowserOptions) -> DriverResult<BrowserConfig> {
    std::fs::create_dir_all(&options.user_data_dir).map_err(|err| {
        DriverError::Protocol(format!(
            "failed to create user-data-dir {}: {err}",
            options.user_data_dir.display()
        ))
    })?;

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(options.request_timeout_ms))
        .window_size(options.window_width, options.window_height)
        .user_data_dir(options.user_data_dir.clone())
        .args(vec![
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-popup-blocking",
            "--password-store=basic",
        ]);
    if !options.headless {
        builder = builder.with_head();
    }
    if let Some(executable) = options.executable.as_ref() {
        builder = builder.chrome_executable(executable.clone());
    }
    builder
        .build()
        .map_err(|err| DriverError::Protocol(format!("browser config error: {err}")))
}

fn spawn_handler_task(mut handler: Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                warn!(error = %err, "browser handler event error");
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
}
