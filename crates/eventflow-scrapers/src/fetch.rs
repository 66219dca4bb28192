//! Static page fetching over HTTP.
//!
//! [`PageFetcher`] is the seam extractors fetch through; [`HttpFetcher`] is
//! the production implementation backed by one pooled `reqwest` client.
//! A failed fetch is returned as a [`ScrapeError`] for the caller to log and
//! skip. Nothing is retried.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Response, StatusCode};
use tracing::trace;

use crate::config::HttpSettings;
use crate::error::{ScrapeError, ScrapeResult};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetches the raw HTML of a page.
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`, returning the body of a `200 OK` response.
    ///
    /// # Errors
    ///
    /// Returns a transport-classified [`ScrapeError`] on connection failure,
    /// timeout, or any non-200 status.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>>;
}

/// HTTP fetcher sharing one connection pool across every request of a run.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the pooled client with the configured user agent and timeout.
    pub fn new(settings: &HttpSettings) -> ScrapeResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| {
                ScrapeError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> ScrapeResult<String> {
        trace!(url = %url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            let err = if e.is_timeout() {
                ScrapeError::timeout(format!("request timed out: {}", e))
            } else {
                ScrapeError::network(format!("request failed: {}", e))
            };
            err.with_url(url).with_source(e)
        })?;
        handle_response(url, response).await
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
        Box::pin(self.get(url))
    }
}

async fn handle_response(url: &str, response: Response) -> ScrapeResult<String> {
    let status = response.status();
    trace!(status = %status, url = %url, "response");

    match status {
        StatusCode::OK => {
            let body = response.text().await.map_err(|e| {
                let err = if e.is_decode() {
                    ScrapeError::invalid_response(format!("undecodable body: {}", e))
                } else {
                    ScrapeError::network(format!("failed to read body: {}", e))
                };
                err.with_url(url).with_source(e)
            })?;
            check_body(url, body)
        }
        StatusCode::NOT_FOUND => Err(ScrapeError::not_found("page not found").with_url(url)),
        s if s.is_server_error() => {
            Err(ScrapeError::server(format!("server error ({})", s)).with_url(url))
        }
        s => Err(ScrapeError::http_status(format!("unexpected status {}", s)).with_url(url)),
    }
}

/// Rejects a `200 OK` body with nothing to parse.
fn check_body(url: &str, body: String) -> ScrapeResult<String> {
    if body.trim().is_empty() {
        return Err(ScrapeError::invalid_response("empty body").with_url(url));
    }
    Ok(body)
}
