// ── Sensors screen state ──

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{StateCell, spawn_scoped};
use crate::model::{DeviceMotion, EnvironmentalData, LocationData, SensorReading, SensorType};
use crate::source::SensorSource;
use crate::stream::StateStream;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorsState {
    pub available_sensors: BTreeSet<SensorType>,
    /// Descriptor text per available sensor.
    pub descriptions: BTreeMap<SensorType, String>,
    pub active_sensors: BTreeSet<SensorType>,
    pub readings: BTreeMap<SensorType, SensorReading>,
    pub location: Option<LocationData>,
    pub motion: Option<DeviceMotion>,
    pub environment: Option<EnvironmentalData>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for SensorsState {
    fn default() -> Self {
        Self {
            available_sensors: BTreeSet::new(),
            descriptions: BTreeMap::new(),
            active_sensors: BTreeSet::new(),
            readings: BTreeMap::new(),
            location: None,
            motion: None,
            environment: None,
            is_loading: true,
            error: None,
        }
    }
}

/// Drives the sensors screen: one reading feed per present sensor, plus
/// the fused motion, ambient and location feeds.
pub struct SensorsHolder {
    inner: Arc<SensorsInner>,
}

struct SensorsInner {
    sensors: SensorSource,
    state: StateCell<SensorsState>,
    cancel: CancellationToken,
}

impl SensorsInner {
    async fn collect_readings(self: Arc<Self>, kind: SensorType) {
        let mut readings = self.sensors.sensor_reading(kind);
        while let Some(reading) = readings.next().await {
            self.state.update(|s| {
                s.readings.insert(kind, reading);
            });
        }
    }

    async fn collect_motion(self: Arc<Self>) {
        let mut motion = self.sensors.device_motion();
        while let Some(m) = motion.next().await {
            self.state.update(|s| s.motion = Some(m));
        }
    }

    async fn collect_environment(self: Arc<Self>) {
        let mut env = self.sensors.environmental_data();
        while let Some(e) = env.next().await {
            self.state.update(|s| s.environment = Some(e));
        }
    }

    async fn collect_location(self: Arc<Self>) {
        let mut fixes = self.sensors.location_data();
        while let Some(fix) = fixes.next().await {
            match fix {
                Ok(loc) => self.state.update(|s| s.location = Some(loc)),
                Err(e) => {
                    warn!(error = %e, "location unavailable");
                    self.state.update(|s| s.error = Some(e.to_string()));
                }
            }
        }
    }
}

impl SensorsHolder {
    pub fn new(sensors: SensorSource) -> Self {
        Self {
            inner: Arc::new(SensorsInner {
                sensors,
                state: StateCell::new(SensorsState::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn start(&self) {
        let available = self.inner.sensors.available_sensors();
        let descriptions: BTreeMap<SensorType, String> = available
            .iter()
            .map(|kind| (*kind, self.inner.sensors.sensor_info(*kind)))
            .collect();
        let cancel = &self.inner.cancel;
        for kind in &available {
            spawn_scoped(cancel, Arc::clone(&self.inner).collect_readings(*kind));
        }
        spawn_scoped(cancel, Arc::clone(&self.inner).collect_motion());
        spawn_scoped(cancel, Arc::clone(&self.inner).collect_environment());
        spawn_scoped(cancel, Arc::clone(&self.inner).collect_location());

        info!(count = available.len(), "sensors screen started");
        self.inner.state.update(|s| {
            s.active_sensors.clone_from(&available);
            s.available_sensors = available;
            s.descriptions = descriptions;
            s.is_loading = false;
        });
    }

    /// Descriptor text for one sensor.
    pub fn sensor_info(&self, sensor_type: SensorType) -> String {
        self.inner.sensors.sensor_info(sensor_type)
    }

    pub fn snapshot(&self) -> Arc<SensorsState> {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> StateStream<SensorsState> {
        self.inner.state.subscribe()
    }

    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }
}

impl Drop for SensorsHolder {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}
