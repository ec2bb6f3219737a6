// ── Network telemetry source ──
//
// Classifies the active network, reads Wi-Fi and cellular details and
// runs the download probes. Every failure degrades to a placeholder value;
// nothing here returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_core::Stream;
use tracing::{debug, info};

use netsense_api::platform::Transport;
use netsense_api::{Platform, ProbeClient, TransportConfig};

use crate::config::SpeedTestConfig;
use crate::convert::{
    classify_connection, int_to_ip, radio_label, split_operator, strip_quotes,
};
use crate::error::CoreError;
use crate::model::{CellularInfo, ConnectionType, NetworkInfo, SpeedTestResult, WifiInfo};

/// Signal buckets reported for Wi-Fi.
const WIFI_SIGNAL_LEVELS: u8 = 5;

/// Signal bucket reported for every non-Wi-Fi connection. Cellular signal
/// strength is not queried.
const PLACEHOLDER_SIGNAL: u8 = 3;

/// Throughput in Mbps for `bytes` transferred over `elapsed`.
///
/// A zero duration yields 0 rather than infinity.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (secs * 1_000_000.0)
}

/// Network connection classification and bandwidth probes.
///
/// Cheap to clone; clones share the platform handles and HTTP client.
#[derive(Clone)]
pub struct NetworkSource {
    inner: Arc<NetworkSourceInner>,
}

struct NetworkSourceInner {
    platform: Platform,
    probe: ProbeClient,
    config: SpeedTestConfig,
}

impl NetworkSource {
    pub fn new(platform: Platform, probe: ProbeClient, config: SpeedTestConfig) -> Self {
        Self {
            inner: Arc::new(NetworkSourceInner {
                platform,
                probe,
                config,
            }),
        }
    }

    /// Build the probe client. `config.read_timeout` bounds each read,
    /// not the whole download.
    pub fn from_config(platform: Platform, config: SpeedTestConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_read_timeout(config.read_timeout);
        let probe = ProbeClient::new(&transport)?;
        Ok(Self::new(platform, probe, config))
    }

    pub fn config(&self) -> &SpeedTestConfig {
        &self.inner.config
    }

    // ── Classification ───────────────────────────────────────────────

    fn connection_type(&self) -> ConnectionType {
        let platform = &self.inner.platform;
        let transports = match platform.connectivity.active_transports() {
            Ok(transports) => transports,
            Err(e) => {
                debug!(error = %e, "active transports unavailable");
                return ConnectionType::Unknown;
            }
        };
        let radio = if transports.contains(&Transport::Cellular) {
            platform
                .telephony
                .data_network_type()
                .inspect_err(|e| debug!(error = %e, "radio technology unavailable"))
                .ok()
        } else {
            None
        };
        classify_connection(&transports, radio)
    }

    fn network_name(&self, connection_type: ConnectionType) -> Option<String> {
        let platform = &self.inner.platform;
        if connection_type == ConnectionType::Wifi {
            platform
                .wifi
                .connection_info()
                .ok()
                .and_then(|c| c.ssid)
                .map(|ssid| strip_quotes(&ssid))
        } else {
            platform.telephony.network_operator_name().ok().flatten()
        }
    }

    fn signal_strength(&self, connection_type: ConnectionType) -> u8 {
        if connection_type != ConnectionType::Wifi {
            return PLACEHOLDER_SIGNAL;
        }
        let wifi = &self.inner.platform.wifi;
        match wifi.connection_info() {
            Ok(conn) => wifi.calculate_signal_level(conn.rssi, WIFI_SIGNAL_LEVELS),
            Err(e) => {
                debug!(error = %e, "wifi signal unavailable");
                0
            }
        }
    }

    /// Classify the active network and fold in one quick speed probe.
    pub async fn current_network_info(&self) -> NetworkInfo {
        let connection_type = self.connection_type();
        let network_name = self.network_name(connection_type);
        let signal_strength = self.signal_strength(connection_type);
        let quick = self.quick_speed_test().await;

        info!(%connection_type, signal_strength, "network classified");
        NetworkInfo {
            connection_type,
            network_name,
            signal_strength,
            download_mbps: quick.download_mbps,
            upload_mbps: quick.upload_mbps,
            latency_ms: quick.latency_ms,
            timestamp: Utc::now(),
        }
    }

    // ── Details ──────────────────────────────────────────────────────

    /// Wi-Fi association details, or all-empty when unavailable.
    pub fn wifi_details(&self) -> WifiInfo {
        self.try_wifi_details().unwrap_or_else(|e| {
            debug!(error = %e, "wifi details unavailable");
            WifiInfo::empty()
        })
    }

    fn try_wifi_details(&self) -> Result<WifiInfo, CoreError> {
        let wifi = &self.inner.platform.wifi;
        let conn = wifi.connection_info()?;
        let ip = wifi.dhcp_ip_address()?;
        Ok(WifiInfo {
            ssid: conn.ssid.as_deref().map(strip_quotes),
            bssid: conn.bssid,
            ip_address: Some(int_to_ip(ip)),
            frequency_mhz: conn.frequency_mhz,
            link_speed_mbps: conn.link_speed_mbps,
            rssi: conn.rssi,
            network_id: conn.network_id,
        })
    }

    /// Cellular radio details, or the `"Unknown"` placeholder.
    pub fn cellular_details(&self) -> CellularInfo {
        self.try_cellular_details().unwrap_or_else(|e| {
            debug!(error = %e, "cellular details unavailable");
            CellularInfo::unknown()
        })
    }

    fn try_cellular_details(&self) -> Result<CellularInfo, CoreError> {
        let telephony = &self.inner.platform.telephony;
        let radio = telephony.data_network_type()?;
        let operator_name = telephony.network_operator_name()?;
        let (mcc, mnc) = match telephony.network_operator()? {
            Some(code) => {
                let (mcc, mnc) = split_operator(&code).ok_or_else(|| CoreError::Unavailable {
                    what: format!("operator code {code:?}"),
                })?;
                (Some(mcc), Some(mnc))
            }
            None => (None, None),
        };
        Ok(CellularInfo {
            network_type: radio_label(radio).to_owned(),
            operator_name,
            mcc,
            mnc,
            signal_strength: PLACEHOLDER_SIGNAL,
            cell_id: None,
            lac: None,
        })
    }

    // ── Speed test ───────────────────────────────────────────────────

    /// Latency to the configured host in milliseconds; 0 if it won't resolve.
    async fn measure_latency(&self) -> u64 {
        let config = &self.inner.config;
        match self
            .inner
            .probe
            .measure_reachability(&config.latency_host, config.latency_port, config.latency_timeout)
            .await
        {
            Ok(sample) => u64::try_from(sample.elapsed.as_millis()).unwrap_or(u64::MAX),
            Err(e) => {
                debug!(error = %e, "latency probe failed");
                0
            }
        }
    }

    /// One latency probe plus one timed download of `url`.
    async fn single_probe(&self, url: &str) -> Result<SpeedTestResult, CoreError> {
        let latency_ms = self.measure_latency().await;
        let sample = self.inner.probe.download(url).await?;
        debug!(url, bytes = sample.bytes, status = sample.status, "download probe finished");
        Ok(SpeedTestResult {
            download_mbps: throughput_mbps(self.inner.config.nominal_payload_bytes, sample.elapsed),
            upload_mbps: 0.0,
            latency_ms,
            jitter_ms: 0,
            packet_loss_pct: 0.0,
            test_duration: sample.elapsed,
            timestamp: Utc::now(),
        })
    }

    /// Run the full speed test.
    ///
    /// Yields one result per successful probe, carrying the running mean
    /// of download speed and latency over the successes so far. Failed
    /// probes are skipped, so the stream may be shorter than the URL list
    /// or empty.
    pub fn perform_speed_test(&self) -> impl Stream<Item = SpeedTestResult> + Send + 'static {
        let source = self.clone();
        async_stream::stream! {
            let mut total_download = 0.0_f64;
            let mut total_latency: u64 = 0;
            let mut successes: u32 = 0;

            for url in &source.inner.config.urls {
                let probe = match source.single_probe(url).await {
                    Ok(probe) => probe,
                    Err(e) => {
                        debug!(%url, error = %e, "speed test probe skipped");
                        continue;
                    }
                };

                total_download += probe.download_mbps;
                total_latency = total_latency.saturating_add(probe.latency_ms);
                successes += 1;

                yield SpeedTestResult {
                    download_mbps: total_download / f64::from(successes),
                    latency_ms: total_latency / u64::from(successes),
                    ..probe
                };
            }

            info!(successes, "speed test finished");
        }
    }

    /// One probe against the quick-test URL; zeros on any failure.
    pub async fn quick_speed_test(&self) -> SpeedTestResult {
        let url = self.inner.config.quick_url.clone();
        self.single_probe(&url).await.unwrap_or_else(|e| {
            debug!(error = %e, "quick speed test failed");
            SpeedTestResult::zero()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use netsense_api::platform::simulated::SimulatedPlatform;
    use netsense_api::platform::{RadioTechnology, WifiConnection};

    use super::*;

    fn source(sim: SimulatedPlatform) -> NetworkSource {
        let platform = Platform::from_backend(Arc::new(sim));
        let probe = ProbeClient::new(&TransportConfig::default()).unwrap();
        NetworkSource::new(platform, probe, SpeedTestConfig::default())
    }

    #[test]
    fn throughput_formula() {
        // 1,000,000 bytes in one second is 8 Mbps
        assert!((throughput_mbps(1_000_000, Duration::from_secs(1)) - 8.0).abs() < 1e-9);
        assert!((throughput_mbps(1_000_000, Duration::from_millis(500)) - 16.0).abs() < 1e-9);
        assert_eq!(throughput_mbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn wifi_details_strip_quotes_and_render_ip() {
        let sim = SimulatedPlatform::builder()
            .transports([Transport::Wifi])
            .wifi(WifiConnection {
                ssid: Some("\"Lab\"".into()),
                bssid: Some("00:11:22:33:44:55".into()),
                frequency_mhz: 2437,
                link_speed_mbps: 144,
                rssi: -61,
                network_id: 7,
            })
            .dhcp_ip(0x0101_080A)
            .build();
        let info = source(sim).wifi_details();
        assert_eq!(info.ssid.as_deref(), Some("Lab"));
        assert_eq!(info.ip_address.as_deref(), Some("10.8.1.1"));
        assert_eq!(info.network_id, 7);
    }

    #[test]
    fn missing_wifi_gives_empty_details() {
        let info = source(SimulatedPlatform::builder().build()).wifi_details();
        assert_eq!(info, WifiInfo::empty());
    }

    #[test]
    fn cellular_details_split_operator_code() {
        let sim = SimulatedPlatform::builder()
            .cellular(RadioTechnology::Hspap, Some("Carrier"), Some("26201"))
            .build();
        let info = source(sim).cellular_details();
        assert_eq!(info.network_type, "HSPA+");
        assert_eq!(info.operator_name.as_deref(), Some("Carrier"));
        assert_eq!(info.mcc.as_deref(), Some("262"));
        assert_eq!(info.mnc.as_deref(), Some("01"));
        assert_eq!(info.signal_strength, 3);
    }

    #[test]
    fn short_operator_code_gives_unknown_placeholder() {
        for code in ["", "31"] {
            let sim = SimulatedPlatform::builder()
                .cellular(RadioTechnology::Lte, Some("Carrier"), Some(code))
                .build();
            assert_eq!(source(sim).cellular_details(), CellularInfo::unknown());
        }
    }

    #[test]
    fn missing_operator_code_keeps_radio_details() {
        let sim = SimulatedPlatform::builder()
            .cellular(RadioTechnology::Lte, Some("Carrier"), None)
            .build();
        let info = source(sim).cellular_details();
        assert_eq!(info.network_type, "LTE");
        assert_eq!(info.mcc, None);
        assert_eq!(info.mnc, None);
        assert_eq!(info.signal_strength, 3);
    }

    #[test]
    fn denied_telephony_gives_unknown_placeholder() {
        let sim = SimulatedPlatform::builder()
            .cellular(RadioTechnology::Lte, Some("Carrier"), Some("310260"))
            .deny_telephony()
            .build();
        assert_eq!(source(sim).cellular_details(), CellularInfo::unknown());
    }

    #[test]
    fn classification_uses_radio_for_cellular() {
        let sim = SimulatedPlatform::builder()
            .transports([Transport::Cellular])
            .cellular(RadioTechnology::Nr, Some("Carrier"), None)
            .build();
        let src = source(sim);
        let kind = src.connection_type();
        assert_eq!(kind, ConnectionType::Mobile5g);
        assert_eq!(src.network_name(kind).as_deref(), Some("Carrier"));
        assert_eq!(src.signal_strength(kind), 3);
    }

    #[test]
    fn wifi_signal_is_bucketed() {
        let sim = SimulatedPlatform::builder()
            .transports([Transport::Wifi, Transport::Cellular])
            .wifi(WifiConnection {
                rssi: -50,
                ..WifiConnection::default()
            })
            .build();
        let src = source(sim);
        assert_eq!(src.connection_type(), ConnectionType::Wifi);
        assert_eq!(src.signal_strength(ConnectionType::Wifi), 4);
    }
}
