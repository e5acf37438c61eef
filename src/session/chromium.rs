//! Chromium-backed session using chromiumoxide.
//!
//! Responses are observed through the CDP network domain. A response is
//! only surfaced once `Network.loadingFinished` fired for it, so that
//! `Network.getResponseBody` has the complete body to hand back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId, SetCookiesParams,
};
use chromiumoxide::page::Page;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{InterceptedResponse, ResponseStream, Session, SessionCookie, SessionPage};
use crate::config::Config;

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

/// Default CDP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Path to Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Timeout for individual CDP commands.
    pub request_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for BrowserSettings {
    fn from(config: &Config) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            ..Self::default()
        }
    }
}

impl BrowserSettings {
    /// Command-line switches passed to Chromium. Chromiumoxide's own default
    /// switches are disabled, so this is the complete list.
    fn launch_args(&self) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(13);
        if self.headless {
            args.push("--headless=new");
        }
        args.extend([
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-software-rasterizer",
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-background-networking",
            "--disable-extensions",
            "--disable-sync",
            "--disable-translate",
            "--mute-audio",
            "--hide-scrollbars",
            "--lang=en-US,en",
        ]);
        args
    }

    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.viewport_width, self.viewport_height)
            .request_timeout(self.request_timeout)
            .no_sandbox()
            .disable_default_args();

        // Headless mode comes from `launch_args`; the builder would add a
        // second, plain `--headless` otherwise.
        builder = builder.with_head();
        for arg in self.launch_args() {
            builder = builder.arg(arg);
        }

        if let Some(ref chrome_path) = self.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))
    }
}

/// A running Chromium instance.
///
/// Cookies added through [`Session::add_cookies`] are queued and written to
/// the browser's cookie jar when the next page opens.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    pending_cookies: Mutex<Vec<CookieParam>>,
}

impl ChromiumSession {
    /// Launch a browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser config is invalid or Chromium fails
    /// to start.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!(headless = settings.headless, "Launching browser for capture");

        let (browser, mut handler) = Browser::launch(settings.to_browser_config()?)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            pending_cookies: Mutex::new(Vec::new()),
        })
    }

    /// Close the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser refuses to close.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        self.handler.abort();
        info!("Browser shutdown complete");
        Ok(())
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn add_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        let mut pending = self.pending_cookies.lock().await;
        pending.extend(cookies.iter().map(to_cookie_param));
        debug!(count = cookies.len(), "Queued session cookies");
        Ok(())
    }

    async fn new_page(&self) -> Result<Box<dyn SessionPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to create new page")?;

        let cookies = std::mem::take(&mut *self.pending_cookies.lock().await);
        if !cookies.is_empty() {
            let count = cookies.len();
            if let Err(e) = page.execute(SetCookiesParams::new(cookies)).await {
                if let Err(close_err) = page.close().await {
                    warn!("Failed to close page: {close_err}");
                }
                return Err(e).context("Failed to set session cookies");
            }
            debug!(count, "Applied session cookies");
        }

        Ok(Box::new(ChromiumPage { page }))
    }
}

fn to_cookie_param(cookie: &SessionCookie) -> CookieParam {
    let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
    param.domain = Some(cookie.domain.clone());
    param.path = Some(cookie.path.clone());
    param.secure = Some(cookie.secure);
    param.http_only = Some(cookie.http_only);
    param
}

/// A Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

enum NetworkEvent {
    Received(Arc<EventResponseReceived>),
    Finished(Arc<EventLoadingFinished>),
    Failed(Arc<EventLoadingFailed>),
}

#[async_trait]
impl SessionPage for ChromiumPage {
    async fn responses(&self) -> Result<ResponseStream> {
        self.page
            .execute(EnableParams::default())
            .await
            .context("Failed to enable network events")?;

        let received = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to subscribe to responses")?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .context("Failed to subscribe to loading events")?;
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .context("Failed to subscribe to loading events")?;

        let mut events = stream::select_all([
            received.map(NetworkEvent::Received).boxed(),
            finished.map(NetworkEvent::Finished).boxed(),
            failed.map(NetworkEvent::Failed).boxed(),
        ]);
        let page = self.page.clone();

        let responses = async_stream::stream! {
            let mut in_flight: HashMap<RequestId, String> = HashMap::new();
            while let Some(event) = events.next().await {
                match event {
                    NetworkEvent::Received(ev) => {
                        in_flight.insert(ev.request_id.clone(), ev.response.url.clone());
                    }
                    NetworkEvent::Finished(ev) => {
                        if let Some(url) = in_flight.remove(&ev.request_id) {
                            let response: Box<dyn InterceptedResponse> = Box::new(ChromiumResponse {
                                page: page.clone(),
                                request_id: ev.request_id.clone(),
                                url,
                            });
                            yield response;
                        }
                    }
                    NetworkEvent::Failed(ev) => {
                        in_flight.remove(&ev.request_id);
                    }
                }
            }
        };

        Ok(Box::pin(responses))
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.context("Failed to close page")
    }
}

/// A finished response, read lazily through `Network.getResponseBody`.
struct ChromiumResponse {
    page: Page,
    request_id: RequestId,
    url: String,
}

#[async_trait]
impl InterceptedResponse for ChromiumResponse {
    fn url(&self) -> &str {
        &self.url
    }

    async fn body(&self) -> Result<Vec<u8>> {
        let response = self
            .page
            .execute(GetResponseBodyParams::new(self.request_id.clone()))
            .await
            .with_context(|| format!("Failed to read response body for {}", self.url))?;

        let body = &response.result;
        if body.base64_encoded {
            BASE64
                .decode(&body.body)
                .context("Failed to decode base64 response body")
        } else {
            Ok(body.body.clone().into_bytes())
        }
    }
}
