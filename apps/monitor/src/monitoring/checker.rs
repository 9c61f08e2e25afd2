use std::error::Error as _;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

/// A completed HTTP exchange: the final status after redirects plus the
/// time until the response headers were received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchange {
    pub status_code: u16,
    pub latency_ms: f64,
}

/// Issues a single availability check against one target.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform one check. A completed exchange is `Ok` regardless of the
    /// status class; transport failures (DNS, connection refused, TLS,
    /// timeout expiry) are `Err` with a human-readable description.
    async fn check(&self, url: &str, timeout: Duration) -> Result<Exchange>;
}

/// HTTP checker issuing GET requests, following redirects.
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("upcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, url: &str, timeout: Duration) -> Result<Exchange> {
        let start = Instant::now();

        // The timeout is per endpoint, so it is attached to the request
        // rather than the shared client.
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| describe_failure(&err, timeout))?;

        let latency_ms = round_to_hundredths(start.elapsed().as_secs_f64() * 1000.0);
        let status_code = response.status().as_u16();

        Ok(Exchange { status_code, latency_ms })
    }
}

/// Reduce a transport failure to a one-line description, surfacing the
/// underlying cause chain instead of reqwest's outer wrapper alone.
fn describe_failure(err: &reqwest::Error, timeout: Duration) -> anyhow::Error {
    if err.is_timeout() {
        return anyhow!("request timed out after {}s", timeout.as_secs_f32());
    }

    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }

    anyhow!(description)
}

fn round_to_hundredths(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
