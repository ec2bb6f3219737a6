// ── Network domain types ──

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Classified transport of the active network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionType {
    Wifi,
    MobileLte,
    Mobile4g,
    Mobile3g,
    Mobile2g,
    Mobile5g,
    Ethernet,
    Unknown,
}

impl ConnectionType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Wifi => "Wi-Fi",
            Self::MobileLte => "LTE",
            Self::Mobile4g => "4G",
            Self::Mobile3g => "3G",
            Self::Mobile2g => "2G",
            Self::Mobile5g => "5G",
            Self::Ethernet => "Ethernet",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(
            self,
            Self::MobileLte | Self::Mobile4g | Self::Mobile3g | Self::Mobile2g | Self::Mobile5g
        )
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the active network with a folded-in quick speed probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInfo {
    pub connection_type: ConnectionType,
    pub network_name: Option<String>,
    /// Signal bucket, 0 to 5.
    pub signal_strength: u8,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl NetworkInfo {
    /// Placeholder used before the first reading and when classification fails.
    pub fn unknown() -> Self {
        Self {
            connection_type: ConnectionType::Unknown,
            network_name: None,
            signal_strength: 0,
            download_mbps: 0.0,
            upload_mbps: 0.0,
            latency_ms: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Result of one speed-test step: running averages plus the latest probe's
/// duration. Upload, jitter and packet loss are never measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedTestResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: u64,
    pub jitter_ms: u64,
    pub packet_loss_pct: f64,
    pub test_duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl SpeedTestResult {
    pub fn zero() -> Self {
        Self {
            download_mbps: 0.0,
            upload_mbps: 0.0,
            latency_ms: 0,
            jitter_ms: 0,
            packet_loss_pct: 0.0,
            test_duration: Duration::ZERO,
            timestamp: Utc::now(),
        }
    }
}

/// Wi-Fi association details. All fields empty when not on Wi-Fi.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WifiInfo {
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub ip_address: Option<String>,
    pub frequency_mhz: i32,
    pub link_speed_mbps: i32,
    pub rssi: i32,
    pub network_id: i32,
}

impl WifiInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 2.4 GHz / 5 GHz / 6 GHz, from the channel frequency.
    pub fn band(&self) -> Option<&'static str> {
        match self.frequency_mhz {
            2400..=2500 => Some("2.4 GHz"),
            4900..=5924 => Some("5 GHz"),
            5925..=7125 => Some("6 GHz"),
            _ => None,
        }
    }
}

/// Cellular radio details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellularInfo {
    pub network_type: String,
    pub operator_name: Option<String>,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub signal_strength: u8,
    pub cell_id: Option<i32>,
    pub lac: Option<i32>,
}

impl CellularInfo {
    pub fn unknown() -> Self {
        Self {
            network_type: "Unknown".to_owned(),
            operator_name: None,
            mcc: None,
            mnc: None,
            signal_strength: 0,
            cell_id: None,
            lac: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_classification() {
        assert!(ConnectionType::Mobile5g.is_mobile());
        assert!(!ConnectionType::Wifi.is_mobile());
        assert!(!ConnectionType::Ethernet.is_mobile());
    }

    #[test]
    fn wifi_band_from_frequency() {
        let mut info = WifiInfo::empty();
        assert_eq!(info.band(), None);
        info.frequency_mhz = 2437;
        assert_eq!(info.band(), Some("2.4 GHz"));
        info.frequency_mhz = 5180;
        assert_eq!(info.band(), Some("5 GHz"));
        info.frequency_mhz = 5955;
        assert_eq!(info.band(), Some("6 GHz"));
    }
}
