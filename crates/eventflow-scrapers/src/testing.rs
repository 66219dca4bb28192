//! In-memory fetcher and browser for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::browser::{BrowserLauncher, BrowserSession};
use crate::error::{ScrapeError, ScrapeResult};
use crate::fetch::{BoxFuture, PageFetcher};

/// Serves canned pages; any other URL is a 404.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// URLs fetched so far, in order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::not_found("page not found").with_url(url))
        })
    }
}

/// Launches sessions that render canned pages and count closes.
#[derive(Default)]
pub(crate) struct FakeLauncher {
    pages: HashMap<String, String>,
    fail_launch: bool,
    rendered: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub(crate) fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub(crate) fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> BoxFuture<'_, ScrapeResult<Box<dyn BrowserSession>>> {
        Box::pin(async move {
            if self.fail_launch {
                return Err(ScrapeError::browser("no browser installed"));
            }
            Ok(Box::new(FakeSession {
                pages: self.pages.clone(),
                rendered: self.rendered.clone(),
                closed: self.closed.clone(),
            }) as Box<dyn BrowserSession>)
        })
    }
}

struct FakeSession {
    pages: HashMap<String, String>,
    rendered: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl BrowserSession for FakeSession {
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
        Box::pin(async move {
            self.rendered.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::timeout("navigation timed out").with_url(url))
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ScrapeResult<()>> {
        Box::pin(async move {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
