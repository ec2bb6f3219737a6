//! System service abstractions.
//!
//! Each trait mirrors one platform service: connectivity, Wi-Fi, telephony,
//! sensors and location. Backends implement all five and are bundled into a
//! [`Platform`] that the telemetry sources receive at construction.
//!
//! Listener registration is callback-free: a backend pushes events into the
//! `mpsc` sender it was handed until the listener is unregistered or the
//! receiving side is dropped.

#[cfg(target_os = "linux")]
pub mod linux;
pub mod simulated;
mod types;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::Error;

pub use types::{
    HardwareSensor, ListenerId, LocationFix, LocationProvider, RadioTechnology, SamplingRate,
    SensorDescriptor, SensorEvent, Transport, UpdateRequest, WifiConnection,
};

/// RSSI at or below which the signal level is 0.
pub const MIN_RSSI: i32 = -100;
/// RSSI at or above which the signal level is the top bucket.
pub const MAX_RSSI: i32 = -55;

/// Bucket an RSSI reading into `num_levels` levels (`0..num_levels`).
pub fn calculate_signal_level(rssi: i32, num_levels: u8) -> u8 {
    let Some(top) = num_levels.checked_sub(1) else {
        return 0;
    };
    if rssi <= MIN_RSSI {
        0
    } else if rssi >= MAX_RSSI {
        top
    } else {
        let scaled = (rssi - MIN_RSSI) * i32::from(top) / (MAX_RSSI - MIN_RSSI);
        u8::try_from(scaled).unwrap_or(top)
    }
}

// ── Service traits ───────────────────────────────────────────────────

/// Network connectivity state.
pub trait Connectivity: Send + Sync {
    /// Transports of the currently active network. Empty when offline.
    fn active_transports(&self) -> Result<Vec<Transport>, Error>;
}

/// Wi-Fi association details.
pub trait WifiManager: Send + Sync {
    fn connection_info(&self) -> Result<WifiConnection, Error>;

    /// IPv4 address leased by DHCP, little-endian packed.
    fn dhcp_ip_address(&self) -> Result<u32, Error>;

    fn calculate_signal_level(&self, rssi: i32, num_levels: u8) -> u8 {
        calculate_signal_level(rssi, num_levels)
    }
}

/// Cellular radio details.
pub trait Telephony: Send + Sync {
    fn data_network_type(&self) -> Result<RadioTechnology, Error>;
    fn network_operator_name(&self) -> Result<Option<String>, Error>;
    /// MCC followed by MNC, e.g. `"310260"`.
    fn network_operator(&self) -> Result<Option<String>, Error>;
}

/// Hardware sensor access.
pub trait SensorManager: Send + Sync {
    /// The default sensor of `kind`, or `None` if the device has none.
    fn default_sensor(&self, kind: HardwareSensor) -> Option<SensorDescriptor>;

    /// Start delivering events for every present sensor in `sensors` to
    /// `sink`. Missing sensors are skipped.
    fn register_listener(
        &self,
        sensors: &[HardwareSensor],
        rate: SamplingRate,
        sink: UnboundedSender<SensorEvent>,
    ) -> Result<ListenerId, Error>;

    fn unregister_listener(&self, id: ListenerId);
}

/// Location fixes.
pub trait LocationManager: Send + Sync {
    fn is_provider_enabled(&self, provider: LocationProvider) -> bool;

    /// Subscribe `sink` to fixes from one provider.
    fn request_location_updates(
        &self,
        request: UpdateRequest,
        sink: UnboundedSender<LocationFix>,
    ) -> Result<ListenerId, Error>;

    fn remove_updates(&self, id: ListenerId);
}

// ── Bundle ───────────────────────────────────────────────────────────

/// The five system services a telemetry source depends on.
#[derive(Clone)]
pub struct Platform {
    pub connectivity: Arc<dyn Connectivity>,
    pub wifi: Arc<dyn WifiManager>,
    pub telephony: Arc<dyn Telephony>,
    pub sensors: Arc<dyn SensorManager>,
    pub location: Arc<dyn LocationManager>,
}

impl Platform {
    /// Bundle a backend that implements every service.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Connectivity + WifiManager + Telephony + SensorManager + LocationManager + 'static,
    {
        Self {
            connectivity: backend.clone(),
            wifi: backend.clone(),
            telephony: backend.clone(),
            sensors: backend.clone(),
            location: backend,
        }
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_level_stays_in_range() {
        let extremes = [
            i32::MIN,
            i32::MIN + 1,
            MIN_RSSI - 1,
            MIN_RSSI + 1,
            MAX_RSSI - 1,
            MAX_RSSI + 1,
            i32::MAX - 1,
            i32::MAX,
        ];
        for rssi in (-130..=0).chain(extremes) {
            let level = calculate_signal_level(rssi, 5);
            assert!(level <= 4, "rssi {rssi} gave level {level}");
        }
    }

    #[test]
    fn signal_level_saturates_outside_window() {
        assert_eq!(calculate_signal_level(i32::MIN, 5), 0);
        assert_eq!(calculate_signal_level(MIN_RSSI + 1, 5), 0);
        assert_eq!(calculate_signal_level(MAX_RSSI - 1, 5), 3);
        assert_eq!(calculate_signal_level(i32::MAX, 5), 4);
        assert_eq!(calculate_signal_level(i32::MAX, u8::MAX), u8::MAX - 1);
    }

    #[test]
    fn signal_level_edges() {
        assert_eq!(calculate_signal_level(MIN_RSSI, 5), 0);
        assert_eq!(calculate_signal_level(MAX_RSSI, 5), 4);
        assert_eq!(calculate_signal_level(-78, 5), 1);
        assert_eq!(calculate_signal_level(-60, 5), 3);
        assert_eq!(calculate_signal_level(-60, 0), 0);
    }
}
