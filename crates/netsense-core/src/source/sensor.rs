// ── Sensor telemetry source ──
//
// Turns platform sensor and location listeners into streams. Each stream
// owns its registrations through `ListenerGuard`s, so dropping the stream
// is the only way to stop delivery.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::{StreamExt, future, stream};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use netsense_api::Platform;
use netsense_api::platform::{HardwareSensor, LocationProvider, SensorEvent, UpdateRequest};

use crate::config::SensorConfig;
use crate::convert::describe_sensor;
use crate::error::CoreError;
use crate::fusion::{ENVIRONMENT_SENSORS, EnvironmentFusion, MOTION_SENSORS, MotionFusion};
use crate::model::{DeviceMotion, EnvironmentalData, LocationData, SensorReading, SensorType};
use crate::stream::{ListenerGuard, SensorStream};

/// Sensor and location streams over the platform services.
#[derive(Clone)]
pub struct SensorSource {
    inner: Arc<SensorSourceInner>,
}

struct SensorSourceInner {
    platform: Platform,
    config: SensorConfig,
}

impl SensorSource {
    pub fn new(platform: Platform, config: SensorConfig) -> Self {
        Self {
            inner: Arc::new(SensorSourceInner { platform, config }),
        }
    }

    /// Register one listener over whichever of `sensors` are present.
    fn listen(
        &self,
        sensors: &[HardwareSensor],
    ) -> Option<(mpsc::UnboundedReceiver<SensorEvent>, ListenerGuard)> {
        let manager = &self.inner.platform.sensors;
        let present: Vec<HardwareSensor> = sensors
            .iter()
            .copied()
            .filter(|s| manager.default_sensor(*s).is_some())
            .collect();
        if present.is_empty() {
            debug!(?sensors, "no matching hardware");
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match manager.register_listener(&present, self.inner.config.sampling_rate, tx) {
            Ok(id) => Some((rx, ListenerGuard::sensor(Arc::clone(manager), id))),
            Err(e) => {
                debug!(error = %e, "sensor registration failed");
                None
            }
        }
    }

    /// Raw readings from one sensor. Ends immediately, with no items, when
    /// the device lacks that sensor.
    pub fn sensor_reading(&self, sensor_type: SensorType) -> SensorStream<SensorReading> {
        let Some((rx, guard)) = self.listen(&[sensor_type.into()]) else {
            return SensorStream::empty();
        };
        SensorStream::new(
            UnboundedReceiverStream::new(rx).map(SensorReading::from),
            vec![guard],
        )
    }

    /// Fused motion snapshots, one per motion event.
    pub fn device_motion(&self) -> SensorStream<DeviceMotion> {
        let Some((rx, guard)) = self.listen(&MOTION_SENSORS) else {
            return SensorStream::empty();
        };
        let fused = UnboundedReceiverStream::new(rx)
            .scan(MotionFusion::default(), |state, event| {
                let snapshot = state.updated(&event).map(|next| {
                    *state = next;
                    next.snapshot()
                });
                future::ready(Some(snapshot))
            })
            .filter_map(future::ready);
        SensorStream::new(fused, vec![guard])
    }

    /// Fused ambient snapshots, one per ambient event.
    pub fn environmental_data(&self) -> SensorStream<EnvironmentalData> {
        let Some((rx, guard)) = self.listen(&ENVIRONMENT_SENSORS) else {
            return SensorStream::empty();
        };
        let fused = UnboundedReceiverStream::new(rx)
            .scan(EnvironmentFusion::default(), |state, event| {
                let snapshot = state.updated(&event).map(|next| {
                    *state = next;
                    next.snapshot()
                });
                future::ready(Some(snapshot))
            })
            .filter_map(future::ready);
        SensorStream::new(fused, vec![guard])
    }

    /// Location fixes from every enabled provider, interleaved.
    ///
    /// A permission failure yields a single `Err` and ends the stream. With
    /// no enabled provider the stream ends with no items.
    pub fn location_data(&self) -> SensorStream<Result<LocationData, CoreError>> {
        let location = &self.inner.platform.location;
        let config = &self.inner.config;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guards = Vec::new();

        for provider in LocationProvider::ALL {
            if !location.is_provider_enabled(provider) {
                continue;
            }
            let request = UpdateRequest {
                provider,
                min_interval: config.location_interval,
                min_distance_m: config.location_min_distance_m,
            };
            match location.request_location_updates(request, tx.clone()) {
                Ok(id) => guards.push(ListenerGuard::location(Arc::clone(location), id)),
                Err(e) if e.is_permission_denied() => {
                    warn!(provider = provider.as_str(), error = %e, "location permission denied");
                    // releases any provider already registered
                    drop(guards);
                    return SensorStream::new(stream::iter([Err(CoreError::from(e))]), Vec::new());
                }
                Err(e) => {
                    debug!(provider = provider.as_str(), error = %e, "location provider skipped");
                }
            }
        }

        if guards.is_empty() {
            return SensorStream::empty();
        }
        drop(tx);
        SensorStream::new(
            UnboundedReceiverStream::new(rx).map(|fix| Ok(LocationData::from(fix))),
            guards,
        )
    }

    /// Sensor types present on this device.
    pub fn available_sensors(&self) -> BTreeSet<SensorType> {
        let manager = &self.inner.platform.sensors;
        SensorType::iter()
            .filter(|kind| manager.default_sensor((*kind).into()).is_some())
            .collect()
    }

    /// Multi-line description of a sensor, or `"Sensor not available"`.
    pub fn sensor_info(&self, sensor_type: SensorType) -> String {
        self.inner
            .platform
            .sensors
            .default_sensor(sensor_type.into())
            .map_or_else(|| "Sensor not available".to_owned(), |d| describe_sensor(&d))
    }

    /// Whether any location provider is enabled.
    pub fn location_available(&self) -> bool {
        LocationProvider::ALL
            .into_iter()
            .any(|p| self.inner.platform.location.is_provider_enabled(p))
    }
}
