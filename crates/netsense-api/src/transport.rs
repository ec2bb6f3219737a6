// Shared transport configuration for building the probe's reqwest::Client.
//
// The speed test only downloads public payloads, so there is no auth,
// cookie jar or custom CA here: just timeouts and a user agent.
//
// No whole-request deadline: only a stalled read aborts a probe.

use std::time::Duration;

/// Default idle-read timeout for download probes. Resets on every read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: format!("netsense/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Override the idle-read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let client = reqwest::Client::builder()
            .read_timeout(self.read_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}
