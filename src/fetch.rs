//! HTTP access to slide sources.
//!
//! [`Fetcher`] resolves relative locators against the configured base and
//! issues requests. [`HttpProber`] runs the diagnostic request made after a
//! load failure; its outcome is only logged.

use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Fire-and-forget diagnostic request for a failed source.
pub trait Prober: Send + Sync {
    fn probe(&self, src: &str);
}

/// Shared HTTP client plus the base for relative locators.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base: Option<Url>,
}

impl Fetcher {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = base_url
            .map(|b| Url::parse(b).with_context(|| format!("Invalid base URL {}", b)))
            .transpose()?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base })
    }

    /// Absolute URL for `src`. Absolute locators pass through unchanged;
    /// anything else needs a base.
    pub fn resolve(&self, src: &str) -> Result<Url> {
        match Url::parse(src) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base
                    .as_ref()
                    .with_context(|| format!("Relative locator {} but no base URL configured", src))?;
                base.join(src)
                    .with_context(|| format!("Failed to resolve {} against {}", src, base))
            }
            Err(e) => Err(e).with_context(|| format!("Invalid locator {}", src)),
        }
    }

    /// Send a GET for `src` and fail on non-success statuses.
    pub async fn get(&self, src: &str) -> Result<reqwest::Response> {
        let url = self.resolve(src)?;
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        response.error_for_status().context("Server returned error")
    }

    /// Whole response body for `src`.
    pub async fn bytes(&self, src: &str) -> Result<Vec<u8>> {
        let response = self.get(src).await?;
        let bytes = response.bytes().await.context("Failed to read response")?;
        Ok(bytes.to_vec())
    }
}

/// Logs status and content type of a failed source.
#[derive(Debug, Clone)]
pub struct HttpProber {
    fetcher: Fetcher,
}

impl HttpProber {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

impl Prober for HttpProber {
    fn probe(&self, src: &str) {
        let fetcher = self.fetcher.clone();
        let src = src.to_string();
        tokio::spawn(async move {
            match fetcher.get(&src).await {
                Ok(response) => {
                    let content_type = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown")
                        .to_string();
                    tracing::info!(
                        "Probe {}: status {}, content-type {}",
                        src,
                        response.status(),
                        content_type
                    );
                }
                Err(e) => tracing::warn!("Probe {} failed: {:#}", src, e),
            }
        });
    }
}
