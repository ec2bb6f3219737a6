// ── Sensor domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::EnumIter;

/// Sensor kinds the app knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, EnumIter)]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Gravity,
    LinearAcceleration,
    RotationVector,
    Orientation,
    Pressure,
    Temperature,
    Humidity,
    Light,
    Proximity,
    StepCounter,
    HeartRate,
}

impl SensorType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Accelerometer => "Accelerometer",
            Self::Gyroscope => "Gyroscope",
            Self::Magnetometer => "Magnetometer",
            Self::Gravity => "Gravity",
            Self::LinearAcceleration => "Linear Acceleration",
            Self::RotationVector => "Rotation Vector",
            Self::Orientation => "Orientation",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Light => "Light",
            Self::Proximity => "Proximity",
            Self::StepCounter => "Step Counter",
            Self::HeartRate => "Heart Rate",
        }
    }

    /// Display unit for values of this sensor.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Accelerometer | Self::Gravity | Self::LinearAcceleration => "m/s²",
            Self::Gyroscope => "rad/s",
            Self::Magnetometer => "µT",
            Self::RotationVector => "",
            Self::Orientation => "°",
            Self::Pressure => "hPa",
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Light => "lx",
            Self::Proximity => "cm",
            Self::StepCounter => "steps",
            Self::HeartRate => "bpm",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One raw reading from a single sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub sensor_type: SensorType,
    pub values: Vec<f32>,
    pub accuracy: i32,
    /// Platform event time in nanoseconds.
    pub timestamp_ns: i64,
}

/// Fused snapshot of the six motion sensors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceMotion {
    pub accelerometer: [f32; 3],
    pub gyroscope: [f32; 3],
    pub magnetometer: [f32; 3],
    pub gravity: [f32; 3],
    pub linear_acceleration: [f32; 3],
    pub rotation_vector: [f32; 4],
    pub timestamp: DateTime<Utc>,
}

impl DeviceMotion {
    pub fn zeroed() -> Self {
        Self {
            accelerometer: [0.0; 3],
            gyroscope: [0.0; 3],
            magnetometer: [0.0; 3],
            gravity: [0.0; 3],
            linear_acceleration: [0.0; 3],
            rotation_vector: [0.0; 4],
            timestamp: Utc::now(),
        }
    }
}

/// Fused snapshot of the ambient sensors. `None` until a sensor reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalData {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub pressure: Option<f32>,
    pub light_level: Option<f32>,
    pub proximity: Option<f32>,
    pub timestamp: DateTime<Utc>,
}

impl EnvironmentalData {
    pub fn empty() -> Self {
        Self {
            temperature: None,
            humidity: None,
            pressure: None,
            light_level: None,
            proximity: None,
            timestamp: Utc::now(),
        }
    }
}

/// A location fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f32,
    pub speed: f32,
    pub bearing: f32,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn fourteen_sensor_types_in_declaration_order() {
        let all: Vec<SensorType> = SensorType::iter().collect();
        assert_eq!(all.len(), 14);
        assert_eq!(all.first(), Some(&SensorType::Accelerometer));
        assert_eq!(all.last(), Some(&SensorType::HeartRate));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(SensorType::LinearAcceleration.to_string(), "Linear Acceleration");
        assert_eq!(SensorType::Temperature.unit(), "°C");
    }
}
