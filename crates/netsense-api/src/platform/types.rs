// ── Raw platform types ──
//
// Values as the system services hand them out, before any domain
// conversion. Numeric codes follow the handset platform's constants so
// backends can pass them straight through.

use std::time::Duration;

use strum::{Display, EnumIter};

/// Handle for a registered sensor or location listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

// ── Connectivity ─────────────────────────────────────────────────────

/// Transport capability of the active network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    Vpn,
    Other,
}

/// Wi-Fi association details as reported by the Wi-Fi service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiConnection {
    /// SSID, possibly wrapped in double quotes.
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub frequency_mhz: i32,
    pub link_speed_mbps: i32,
    pub rssi: i32,
    pub network_id: i32,
}

/// Data radio technology reported by telephony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioTechnology {
    Unknown,
    Gprs,
    Edge,
    Umts,
    Cdma,
    Hsdpa,
    Hsupa,
    Hspa,
    Lte,
    Hspap,
    Gsm,
    Nr,
    /// A code with no dedicated variant.
    Other(i32),
}

impl RadioTechnology {
    /// Map a raw network-type code to a technology.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Gprs,
            2 => Self::Edge,
            3 => Self::Umts,
            4 => Self::Cdma,
            8 => Self::Hsdpa,
            9 => Self::Hsupa,
            10 => Self::Hspa,
            13 => Self::Lte,
            15 => Self::Hspap,
            16 => Self::Gsm,
            20 => Self::Nr,
            other => Self::Other(other),
        }
    }

    /// The raw network-type code.
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Gprs => 1,
            Self::Edge => 2,
            Self::Umts => 3,
            Self::Cdma => 4,
            Self::Hsdpa => 8,
            Self::Hsupa => 9,
            Self::Hspa => 10,
            Self::Lte => 13,
            Self::Hspap => 15,
            Self::Gsm => 16,
            Self::Nr => 20,
            Self::Other(code) => code,
        }
    }
}

// ── Sensors ──────────────────────────────────────────────────────────

/// Hardware sensor kinds, tagged with their platform type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum HardwareSensor {
    Accelerometer,
    MagneticField,
    Orientation,
    Gyroscope,
    Light,
    Pressure,
    Proximity,
    Gravity,
    LinearAcceleration,
    RotationVector,
    RelativeHumidity,
    AmbientTemperature,
    StepCounter,
    HeartRate,
}

impl HardwareSensor {
    /// Platform sensor type code.
    pub fn type_code(self) -> i32 {
        match self {
            Self::Accelerometer => 1,
            Self::MagneticField => 2,
            Self::Orientation => 3,
            Self::Gyroscope => 4,
            Self::Light => 5,
            Self::Pressure => 6,
            Self::Proximity => 8,
            Self::Gravity => 9,
            Self::LinearAcceleration => 10,
            Self::RotationVector => 11,
            Self::RelativeHumidity => 12,
            Self::AmbientTemperature => 13,
            Self::StepCounter => 19,
            Self::HeartRate => 21,
        }
    }

    /// Number of values carried by one event of this sensor.
    pub fn value_count(self) -> usize {
        match self {
            Self::Accelerometer
            | Self::MagneticField
            | Self::Orientation
            | Self::Gyroscope
            | Self::Gravity
            | Self::LinearAcceleration => 3,
            Self::RotationVector => 4,
            Self::Light
            | Self::Pressure
            | Self::Proximity
            | Self::RelativeHumidity
            | Self::AmbientTemperature
            | Self::StepCounter
            | Self::HeartRate => 1,
        }
    }
}

/// Static description of a sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescriptor {
    pub kind: HardwareSensor,
    pub name: String,
    pub vendor: String,
    pub version: i32,
    pub max_range: f32,
    pub resolution: f32,
    /// Power draw in milliamps.
    pub power_ma: f32,
    /// Minimum delay between events in microseconds (0 = on-change).
    pub min_delay_us: i32,
}

/// One callback from a sensor listener.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub sensor: HardwareSensor,
    pub values: Vec<f32>,
    pub accuracy: i32,
    /// Monotonic event time in nanoseconds.
    pub timestamp_ns: i64,
}

/// Requested sensor delivery rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingRate {
    Fastest,
    Game,
    Ui,
    #[default]
    Normal,
}

impl SamplingRate {
    /// Nominal delivery period.
    pub fn period(self) -> Duration {
        match self {
            Self::Fastest => Duration::from_millis(5),
            Self::Game => Duration::from_millis(20),
            Self::Ui => Duration::from_millis(60),
            Self::Normal => Duration::from_millis(200),
        }
    }
}

// ── Location ─────────────────────────────────────────────────────────

/// Location fix source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationProvider {
    Gps,
    Network,
}

impl LocationProvider {
    pub const ALL: [Self; 2] = [Self::Gps, Self::Network];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Network => "network",
        }
    }
}

/// Parameters for a location subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRequest {
    pub provider: LocationProvider,
    pub min_interval: Duration,
    pub min_distance_m: f32,
}

/// A single location fix.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f32,
    pub speed: f32,
    pub bearing: f32,
    pub provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn radio_codes_round_trip_through_known_variants() {
        for code in [0, 1, 2, 3, 4, 8, 9, 10, 13, 15, 16, 20] {
            assert_eq!(RadioTechnology::from_code(code).code(), code);
            assert!(!matches!(
                RadioTechnology::from_code(code),
                RadioTechnology::Other(_)
            ));
        }
        assert_eq!(RadioTechnology::from_code(18), RadioTechnology::Other(18));
    }

    #[test]
    fn hardware_type_codes_are_unique() {
        let mut codes: Vec<i32> = HardwareSensor::iter().map(HardwareSensor::type_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 14);
    }

    #[test]
    fn normal_rate_is_200ms() {
        assert_eq!(SamplingRate::default().period(), Duration::from_millis(200));
    }
}
