//! Headless browser rendering for client-side rendered pages.
//!
//! A [`BrowserLauncher`] starts one [`BrowserSession`] per extractor call.
//! The session renders pages one at a time; a failed navigation is returned
//! to the caller and leaves the session usable. The caller closes the session
//! when it is done, and dropping it without closing (early return, panic)
//! still tears the browser down.

use crate::error::ScrapeResult;
use crate::fetch::BoxFuture;

/// A live browser that renders pages to HTML.
pub trait BrowserSession: Send {
    /// Navigates to `url` and returns the rendered DOM as HTML.
    ///
    /// # Errors
    ///
    /// Returns a `Timeout` or `Browser` [`ScrapeError`](crate::ScrapeError)
    /// for this page only.
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>>;

    /// Shuts the browser down.
    fn close(self: Box<Self>) -> BoxFuture<'static, ScrapeResult<()>>;
}

/// Starts browser sessions.
pub trait BrowserLauncher: Send + Sync {
    /// Launches a fresh browser.
    fn launch(&self) -> BoxFuture<'_, ScrapeResult<Box<dyn BrowserSession>>>;
}

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumLauncher, ChromiumSession};

#[cfg(feature = "chromium")]
mod chromium {
    use std::time::Duration;

    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::page::Page;
    use futures_util::StreamExt;
    use tokio::task::JoinHandle;
    use tracing::{debug, trace};

    use super::{BrowserLauncher, BrowserSession};
    use crate::config::HttpSettings;
    use crate::error::{ScrapeError, ScrapeResult};
    use crate::fetch::BoxFuture;

    /// Launches headless Chromium via the DevTools protocol.
    pub struct ChromiumLauncher {
        settings: HttpSettings,
    }

    impl ChromiumLauncher {
        pub fn new(settings: HttpSettings) -> Self {
            Self { settings }
        }

        async fn start(&self) -> ScrapeResult<ChromiumSession> {
            let config = BrowserConfig::builder()
                .arg(format!("--user-agent={}", self.settings.user_agent))
                .arg("--no-sandbox")
                .request_timeout(self.settings.timeout())
                .build()
                .map_err(|e| ScrapeError::browser(format!("invalid browser config: {}", e)))?;

            let (browser, mut events) = Browser::launch(config).await.map_err(|e| {
                ScrapeError::browser(format!("failed to launch browser: {}", e)).with_source(e)
            })?;

            // The CDP connection only makes progress while its handler is polled.
            let handler = tokio::spawn(async move { while events.next().await.is_some() {} });

            let page = match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    handler.abort();
                    return Err(
                        ScrapeError::browser(format!("failed to open tab: {}", e)).with_source(e)
                    );
                }
            };

            debug!("browser launched");
            Ok(ChromiumSession {
                browser: Some(browser),
                page,
                handler,
                timeout: self.settings.timeout(),
            })
        }
    }

    impl BrowserLauncher for ChromiumLauncher {
        fn launch(&self) -> BoxFuture<'_, ScrapeResult<Box<dyn BrowserSession>>> {
            Box::pin(async move {
                let session = self.start().await?;
                Ok(Box::new(session) as Box<dyn BrowserSession>)
            })
        }
    }

    /// One headless Chromium process with a single reusable tab.
    pub struct ChromiumSession {
        browser: Option<Browser>,
        page: Page,
        handler: JoinHandle<()>,
        timeout: Duration,
    }

    impl ChromiumSession {
        async fn navigate(&mut self, url: &str) -> ScrapeResult<String> {
            trace!(url = %url, "navigate");
            tokio::time::timeout(self.timeout, self.page.goto(url))
                .await
                .map_err(|_| ScrapeError::timeout("navigation timed out").with_url(url))?
                .map_err(|e| {
                    ScrapeError::browser(format!("navigation failed: {}", e))
                        .with_url(url)
                        .with_source(e)
                })?;

            self.page.content().await.map_err(|e| {
                ScrapeError::browser(format!("failed to read rendered page: {}", e))
                    .with_url(url)
                    .with_source(e)
            })
        }
    }

    impl BrowserSession for ChromiumSession {
        fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
            Box::pin(self.navigate(url))
        }

        fn close(mut self: Box<Self>) -> BoxFuture<'static, ScrapeResult<()>> {
            Box::pin(async move {
                if let Some(mut browser) = self.browser.take() {
                    browser.close().await.map_err(|e| {
                        ScrapeError::browser(format!("failed to close browser: {}", e))
                            .with_source(e)
                    })?;
                    // Reap the child so no zombie outlives the run.
                    let _ = browser.wait().await;
                }
                debug!("browser closed");
                Ok(())
            })
        }
    }

    impl Drop for ChromiumSession {
        fn drop(&mut self) {
            // Dropping `Browser` kills the child process; the handler task
            // would otherwise poll a dead connection forever.
            self.handler.abort();
        }
    }
}
