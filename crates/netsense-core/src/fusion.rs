// ── Incremental sensor fusion ──
//
// Last-known-value state for the fused motion and environment streams.
// Each event produces a new state with only the firing sensor's slot
// replaced; everything else carries over.

use chrono::Utc;

use netsense_api::platform::{HardwareSensor, SensorEvent};

use crate::model::{DeviceMotion, EnvironmentalData};

/// Sensors feeding [`MotionFusion`].
pub const MOTION_SENSORS: [HardwareSensor; 6] = [
    HardwareSensor::Accelerometer,
    HardwareSensor::Gyroscope,
    HardwareSensor::MagneticField,
    HardwareSensor::Gravity,
    HardwareSensor::LinearAcceleration,
    HardwareSensor::RotationVector,
];

/// Sensors feeding [`EnvironmentFusion`].
pub const ENVIRONMENT_SENSORS: [HardwareSensor; 5] = [
    HardwareSensor::AmbientTemperature,
    HardwareSensor::RelativeHumidity,
    HardwareSensor::Pressure,
    HardwareSensor::Light,
    HardwareSensor::Proximity,
];

/// Copy up to `N` leading values, zero-filling the rest.
fn vector<const N: usize>(values: &[f32]) -> [f32; N] {
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}

/// Last known vector per motion channel. Channels start zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionFusion {
    accelerometer: [f32; 3],
    gyroscope: [f32; 3],
    magnetometer: [f32; 3],
    gravity: [f32; 3],
    linear_acceleration: [f32; 3],
    rotation_vector: [f32; 4],
}

impl MotionFusion {
    /// State after `event`, or `None` if the event isn't a motion channel.
    pub fn updated(&self, event: &SensorEvent) -> Option<Self> {
        let mut next = *self;
        match event.sensor {
            HardwareSensor::Accelerometer => next.accelerometer = vector(&event.values),
            HardwareSensor::Gyroscope => next.gyroscope = vector(&event.values),
            HardwareSensor::MagneticField => next.magnetometer = vector(&event.values),
            HardwareSensor::Gravity => next.gravity = vector(&event.values),
            HardwareSensor::LinearAcceleration => {
                next.linear_acceleration = vector(&event.values);
            }
            HardwareSensor::RotationVector => next.rotation_vector = vector(&event.values),
            _ => return None,
        }
        Some(next)
    }

    pub fn snapshot(&self) -> DeviceMotion {
        DeviceMotion {
            accelerometer: self.accelerometer,
            gyroscope: self.gyroscope,
            magnetometer: self.magnetometer,
            gravity: self.gravity,
            linear_acceleration: self.linear_acceleration,
            rotation_vector: self.rotation_vector,
            timestamp: Utc::now(),
        }
    }
}

/// Last known scalar per ambient channel. Channels start absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentFusion {
    temperature: Option<f32>,
    humidity: Option<f32>,
    pressure: Option<f32>,
    light_level: Option<f32>,
    proximity: Option<f32>,
}

impl EnvironmentFusion {
    /// State after `event`, or `None` if the event isn't an ambient channel
    /// or carries no value.
    pub fn updated(&self, event: &SensorEvent) -> Option<Self> {
        let value = event.values.first().copied()?;
        let mut next = *self;
        match event.sensor {
            HardwareSensor::AmbientTemperature => next.temperature = Some(value),
            HardwareSensor::RelativeHumidity => next.humidity = Some(value),
            HardwareSensor::Pressure => next.pressure = Some(value),
            HardwareSensor::Light => next.light_level = Some(value),
            HardwareSensor::Proximity => next.proximity = Some(value),
            _ => return None,
        }
        Some(next)
    }

    pub fn snapshot(&self) -> EnvironmentalData {
        EnvironmentalData {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            light_level: self.light_level,
            proximity: self.proximity,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sensor: HardwareSensor, values: &[f32]) -> SensorEvent {
        SensorEvent {
            sensor,
            values: values.to_vec(),
            accuracy: 3,
            timestamp_ns: 0,
        }
    }

    #[test]
    fn motion_carries_previous_channels() {
        let start = MotionFusion::default();
        let after_accel = start
            .updated(&event(HardwareSensor::Accelerometer, &[1.0, 2.0, 3.0]))
            .unwrap();
        let after_gyro = after_accel
            .updated(&event(HardwareSensor::Gyroscope, &[0.1, 0.2, 0.3]))
            .unwrap();

        let snap = after_gyro.snapshot();
        assert_eq!(snap.accelerometer, [1.0, 2.0, 3.0]);
        assert_eq!(snap.gyroscope, [0.1, 0.2, 0.3]);
        assert_eq!(snap.magnetometer, [0.0; 3]);
        assert_eq!(snap.gravity, [0.0; 3]);
        assert_eq!(snap.rotation_vector, [0.0; 4]);

        // the earlier state is untouched
        assert_eq!(after_accel.snapshot().gyroscope, [0.0; 3]);
    }

    #[test]
    fn rotation_vector_is_padded_or_truncated() {
        let state = MotionFusion::default()
            .updated(&event(HardwareSensor::RotationVector, &[0.1, 0.2, 0.3]))
            .unwrap();
        assert_eq!(state.snapshot().rotation_vector, [0.1, 0.2, 0.3, 0.0]);

        let state = state
            .updated(&event(HardwareSensor::RotationVector, &[1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        assert_eq!(state.snapshot().rotation_vector, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn motion_ignores_other_sensors() {
        assert!(
            MotionFusion::default()
                .updated(&event(HardwareSensor::Light, &[10.0]))
                .is_none()
        );
    }

    #[test]
    fn environment_fields_absent_until_reported() {
        let state = EnvironmentFusion::default()
            .updated(&event(HardwareSensor::AmbientTemperature, &[22.5]))
            .unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.temperature, Some(22.5));
        assert_eq!(snap.humidity, None);
        assert_eq!(snap.pressure, None);

        let state = state
            .updated(&event(HardwareSensor::Pressure, &[1012.0]))
            .unwrap();
        assert_eq!(state.snapshot().temperature, Some(22.5));
        assert_eq!(state.snapshot().pressure, Some(1012.0));
    }

    #[test]
    fn environment_ignores_empty_events() {
        assert!(
            EnvironmentFusion::default()
                .updated(&event(HardwareSensor::Light, &[]))
                .is_none()
        );
    }
}
