// ── Runtime configuration for the telemetry sources ──
//
// These types are constructed by the binary (usually from netsense-config)
// and handed to the sources. Core never reads config files.

use std::time::Duration;

use netsense_api::platform::SamplingRate;

/// Download targets for the full speed test, smallest-risk first.
pub const DEFAULT_SPEED_TEST_URLS: [&str; 3] = [
    "https://speed.cloudflare.com/__down?bytes=25000000",
    "https://httpbin.org/bytes/10000000",
    "https://www.google.com/images/branding/googlelogo/1x/googlelogo_color_272x92dp.png",
];

/// Single download target used when folding throughput into `NetworkInfo`.
pub const DEFAULT_QUICK_TEST_URL: &str = "https://httpbin.org/bytes/1000000";

/// Host probed for latency.
pub const DEFAULT_LATENCY_HOST: &str = "8.8.8.8";

/// Payload size assumed by the Mbps computation, whatever was downloaded.
pub const NOMINAL_PAYLOAD_BYTES: u64 = 1_000_000;

/// Speed-test probe settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedTestConfig {
    pub urls: Vec<String>,
    pub quick_url: String,
    pub latency_host: String,
    pub latency_port: u16,
    pub latency_timeout: Duration,
    pub read_timeout: Duration,
    pub nominal_payload_bytes: u64,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            urls: DEFAULT_SPEED_TEST_URLS.iter().map(|u| (*u).to_owned()).collect(),
            quick_url: DEFAULT_QUICK_TEST_URL.to_owned(),
            latency_host: DEFAULT_LATENCY_HOST.to_owned(),
            latency_port: 53,
            latency_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            nominal_payload_bytes: NOMINAL_PAYLOAD_BYTES,
        }
    }
}

/// Sensor and location subscription settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub sampling_rate: SamplingRate,
    pub location_interval: Duration,
    pub location_min_distance_m: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: SamplingRate::Normal,
            location_interval: Duration::from_secs(1),
            location_min_distance_m: 1.0,
        }
    }
}

/// Everything the sources need beyond the platform itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceConfig {
    pub speed_test: SpeedTestConfig,
    pub sensors: SensorConfig,
}
