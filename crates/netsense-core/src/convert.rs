// ── Platform-to-domain conversions ──
//
// Bridges raw `netsense_api::platform` values into `netsense_core::model`
// types: transport classification, radio labels, address rendering and
// sensor-kind mapping.

use chrono::Utc;

use netsense_api::platform::{
    HardwareSensor, LocationFix, RadioTechnology, SensorDescriptor, SensorEvent, Transport,
};

use crate::model::{ConnectionType, LocationData, SensorReading, SensorType};

// ── Connectivity ─────────────────────────────────────────────────────

/// Connection type for a cellular data radio.
///
/// Unlisted technologies, including CDMA variants and unknown codes, land
/// in the generic `Mobile4g` bucket.
pub fn connection_type_for_radio(radio: RadioTechnology) -> ConnectionType {
    match radio {
        RadioTechnology::Nr => ConnectionType::Mobile5g,
        RadioTechnology::Lte => ConnectionType::MobileLte,
        RadioTechnology::Hspap
        | RadioTechnology::Hspa
        | RadioTechnology::Hsupa
        | RadioTechnology::Hsdpa
        | RadioTechnology::Umts => ConnectionType::Mobile3g,
        RadioTechnology::Edge | RadioTechnology::Gprs => ConnectionType::Mobile2g,
        RadioTechnology::Unknown
        | RadioTechnology::Cdma
        | RadioTechnology::Gsm
        | RadioTechnology::Other(_) => ConnectionType::Mobile4g,
    }
}

/// Classify the active network. Wi-Fi wins over cellular, cellular over
/// ethernet. `radio` is consulted only for cellular; `None` means the
/// telephony lookup failed.
pub fn classify_connection(
    transports: &[Transport],
    radio: Option<RadioTechnology>,
) -> ConnectionType {
    if transports.contains(&Transport::Wifi) {
        ConnectionType::Wifi
    } else if transports.contains(&Transport::Cellular) {
        radio.map_or(ConnectionType::Mobile4g, connection_type_for_radio)
    } else if transports.contains(&Transport::Ethernet) {
        ConnectionType::Ethernet
    } else {
        ConnectionType::Unknown
    }
}

/// Human label for a cellular radio technology.
pub fn radio_label(radio: RadioTechnology) -> &'static str {
    match radio {
        RadioTechnology::Nr => "5G NR",
        RadioTechnology::Lte => "LTE",
        RadioTechnology::Hspap => "HSPA+",
        RadioTechnology::Hspa => "HSPA",
        RadioTechnology::Hsupa => "HSUPA",
        RadioTechnology::Hsdpa => "HSDPA",
        RadioTechnology::Umts => "UMTS",
        RadioTechnology::Edge => "EDGE",
        RadioTechnology::Gprs => "GPRS",
        _ => "Unknown",
    }
}

/// Render a little-endian packed IPv4 address as dotted quad.
pub fn int_to_ip(ip: u32) -> String {
    let [a, b, c, d] = ip.to_le_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// Strip the double quotes some platforms wrap SSIDs in.
pub fn strip_quotes(ssid: &str) -> String {
    ssid.replace('"', "")
}

/// Split an operator code into (MCC, MNC). `None` for codes shorter than
/// three characters, including the empty code of an unregistered radio.
pub fn split_operator(code: &str) -> Option<(String, String)> {
    let mcc = code.get(..3)?;
    let mnc = code.get(3..)?;
    Some((mcc.to_owned(), mnc.to_owned()))
}

// ── Sensors ──────────────────────────────────────────────────────────

impl From<SensorType> for HardwareSensor {
    fn from(kind: SensorType) -> Self {
        match kind {
            SensorType::Accelerometer => Self::Accelerometer,
            SensorType::Gyroscope => Self::Gyroscope,
            SensorType::Magnetometer => Self::MagneticField,
            SensorType::Gravity => Self::Gravity,
            SensorType::LinearAcceleration => Self::LinearAcceleration,
            SensorType::RotationVector => Self::RotationVector,
            SensorType::Orientation => Self::Orientation,
            SensorType::Pressure => Self::Pressure,
            SensorType::Temperature => Self::AmbientTemperature,
            SensorType::Humidity => Self::RelativeHumidity,
            SensorType::Light => Self::Light,
            SensorType::Proximity => Self::Proximity,
            SensorType::StepCounter => Self::StepCounter,
            SensorType::HeartRate => Self::HeartRate,
        }
    }
}

impl From<HardwareSensor> for SensorType {
    fn from(kind: HardwareSensor) -> Self {
        match kind {
            HardwareSensor::Accelerometer => Self::Accelerometer,
            HardwareSensor::Gyroscope => Self::Gyroscope,
            HardwareSensor::MagneticField => Self::Magnetometer,
            HardwareSensor::Gravity => Self::Gravity,
            HardwareSensor::LinearAcceleration => Self::LinearAcceleration,
            HardwareSensor::RotationVector => Self::RotationVector,
            HardwareSensor::Orientation => Self::Orientation,
            HardwareSensor::Pressure => Self::Pressure,
            HardwareSensor::AmbientTemperature => Self::Temperature,
            HardwareSensor::RelativeHumidity => Self::Humidity,
            HardwareSensor::Light => Self::Light,
            HardwareSensor::Proximity => Self::Proximity,
            HardwareSensor::StepCounter => Self::StepCounter,
            HardwareSensor::HeartRate => Self::HeartRate,
        }
    }
}

impl From<SensorEvent> for SensorReading {
    fn from(event: SensorEvent) -> Self {
        Self {
            sensor_type: event.sensor.into(),
            values: event.values,
            accuracy: event.accuracy,
            timestamp_ns: event.timestamp_ns,
        }
    }
}

impl From<LocationFix> for LocationData {
    fn from(fix: LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy: fix.accuracy,
            speed: fix.speed,
            bearing: fix.bearing,
            provider: fix.provider.unwrap_or_else(|| "Unknown".to_owned()),
            timestamp: Utc::now(),
        }
    }
}

/// Multi-line description of a sensor.
pub fn describe_sensor(sensor: &SensorDescriptor) -> String {
    format!(
        "Name: {}\nVendor: {}\nVersion: {}\nType: {}\nMax Range: {}\nResolution: {}\nPower: {} mA\nMin Delay: {} μs",
        sensor.name,
        sensor.vendor,
        sensor.version,
        sensor.kind.type_code(),
        sensor.max_range,
        sensor.resolution,
        sensor.power_ma,
        sensor.min_delay_us,
    )
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn radio_labels_exact() {
        let cases = [
            (RadioTechnology::Nr, "5G NR"),
            (RadioTechnology::Lte, "LTE"),
            (RadioTechnology::Hspap, "HSPA+"),
            (RadioTechnology::Hspa, "HSPA"),
            (RadioTechnology::Hsupa, "HSUPA"),
            (RadioTechnology::Hsdpa, "HSDPA"),
            (RadioTechnology::Umts, "UMTS"),
            (RadioTechnology::Edge, "EDGE"),
            (RadioTechnology::Gprs, "GPRS"),
        ];
        for (radio, label) in cases {
            assert_eq!(radio_label(radio), label);
        }
        assert_eq!(radio_label(RadioTechnology::Cdma), "Unknown");
        assert_eq!(radio_label(RadioTechnology::from_code(99)), "Unknown");
    }

    #[test]
    fn transport_precedence() {
        use Transport::{Cellular, Ethernet, Vpn, Wifi};

        let lte = Some(RadioTechnology::Lte);
        assert_eq!(classify_connection(&[Cellular, Wifi], lte), ConnectionType::Wifi);
        assert_eq!(classify_connection(&[Ethernet, Wifi], None), ConnectionType::Wifi);
        assert_eq!(
            classify_connection(&[Ethernet, Cellular], lte),
            ConnectionType::MobileLte
        );
        assert_eq!(classify_connection(&[Ethernet], None), ConnectionType::Ethernet);
        assert_eq!(classify_connection(&[Vpn], None), ConnectionType::Unknown);
        assert_eq!(classify_connection(&[], None), ConnectionType::Unknown);
    }

    #[test]
    fn cellular_fallback_bucket() {
        assert_eq!(
            classify_connection(&[Transport::Cellular], None),
            ConnectionType::Mobile4g
        );
        assert_eq!(
            connection_type_for_radio(RadioTechnology::Other(42)),
            ConnectionType::Mobile4g
        );
        assert_eq!(connection_type_for_radio(RadioTechnology::Nr), ConnectionType::Mobile5g);
        assert_eq!(connection_type_for_radio(RadioTechnology::Umts), ConnectionType::Mobile3g);
        assert_eq!(connection_type_for_radio(RadioTechnology::Edge), ConnectionType::Mobile2g);
    }

    #[test]
    fn ip_rendering_is_little_endian() {
        assert_eq!(int_to_ip(0x0101_080A), "10.8.1.1");
        assert_eq!(int_to_ip(0), "0.0.0.0");
        assert_eq!(int_to_ip(0x2A01_A8C0), "192.168.1.42");
    }

    #[test]
    fn operator_split() {
        assert_eq!(
            split_operator("310260"),
            Some(("310".to_owned(), "260".to_owned()))
        );
        assert_eq!(split_operator("310"), Some(("310".to_owned(), String::new())));
        assert_eq!(split_operator("31"), None);
        assert_eq!(split_operator(""), None);
    }

    #[test]
    fn ssid_quotes_removed() {
        assert_eq!(strip_quotes("\"HomeNet\""), "HomeNet");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn sensor_kind_mapping_round_trips() {
        for kind in SensorType::iter() {
            let hw: HardwareSensor = kind.into();
            assert_eq!(SensorType::from(hw), kind);
        }
    }

    #[test]
    fn sensor_description_format() {
        let descriptor = SensorDescriptor {
            kind: HardwareSensor::Light,
            name: "TSL2561".into(),
            vendor: "AMS".into(),
            version: 2,
            max_range: 40000.0,
            resolution: 0.5,
            power_ma: 0.25,
            min_delay_us: 0,
        };
        assert_eq!(
            describe_sensor(&descriptor),
            "Name: TSL2561\nVendor: AMS\nVersion: 2\nType: 5\nMax Range: 40000\nResolution: 0.5\nPower: 0.25 mA\nMin Delay: 0 μs"
        );
    }
}
