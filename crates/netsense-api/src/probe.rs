// HTTP download probe and TCP reachability probe.
//
// Both probes report raw measurements only. Turning them into Mbps and
// running averages is `netsense-core`'s job.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Outcome of a single timed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSample {
    /// Body bytes actually received.
    pub bytes: u64,
    /// Wall time from request start to end of body.
    pub elapsed: Duration,
    /// HTTP status of the response. Non-2xx bodies are still timed.
    pub status: u16,
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachabilitySample {
    /// Time spent probing, whether or not the host answered.
    pub elapsed: Duration,
    pub reachable: bool,
}

/// Thin wrapper around a `reqwest::Client` used for speed-test probes.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    http: reqwest::Client,
}

impl ProbeClient {
    /// Build a probe client from transport settings.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Wrap an existing client (tests, shared connection pools).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch `url` and read the whole body, timing the transfer.
    ///
    /// Only transport failures are errors; an HTTP error status still
    /// yields a sample so callers can decide what to do with it.
    pub async fn download(&self, url: &str) -> Result<DownloadSample, Error> {
        let url = Url::parse(url)?;
        let start = Instant::now();

        let mut response = self.http.get(url.clone()).send().await?;
        let status = response.status().as_u16();

        let mut bytes: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            bytes = bytes.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        }

        let elapsed = start.elapsed();
        debug!(%url, status, bytes, elapsed_ms = elapsed.as_millis(), "download probe finished");
        Ok(DownloadSample {
            bytes,
            elapsed,
            status,
        })
    }

    /// Probe whether `host:port` accepts a TCP connection within `timeout`.
    ///
    /// The elapsed time is reported regardless of the outcome, so an
    /// unreachable host reads as a latency close to `timeout`. Fails only
    /// when the host name does not resolve.
    pub async fn measure_reachability(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<ReachabilitySample, Error> {
        let addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|_| Error::Unresolvable {
                host: host.to_owned(),
            })?
            .next()
            .ok_or_else(|| Error::Unresolvable {
                host: host.to_owned(),
            })?;

        let start = Instant::now();
        let reachable = matches!(
            tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        );
        let elapsed = start.elapsed();

        debug!(%addr, reachable, elapsed_ms = elapsed.as_millis(), "reachability probe finished");
        Ok(ReachabilitySample { elapsed, reachable })
    }
}
