//! Simulated handset backend.
//!
//! Answers every service query from values fixed at build time and keeps a
//! registry of live listeners. With auto-emission on, each listener gets a
//! background task producing synthetic events at its requested rate; with
//! it off, events arrive only through [`SimulatedPlatform::inject_sensor_event`]
//! and [`SimulatedPlatform::inject_fix`], which is what tests use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use strum::IntoEnumIterator;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    Connectivity, HardwareSensor, ListenerId, LocationFix, LocationManager, LocationProvider,
    RadioTechnology, SamplingRate, SensorDescriptor, SensorEvent, SensorManager, Telephony,
    Transport, UpdateRequest, WifiConnection, WifiManager,
};
use crate::error::Error;

/// Base coordinates for synthetic fixes.
const BASE_LATITUDE: f64 = 37.422;
const BASE_LONGITUDE: f64 = -122.084;

struct SensorListener {
    sensors: Vec<HardwareSensor>,
    sink: UnboundedSender<SensorEvent>,
    cancel: CancellationToken,
}

struct LocationListener {
    provider: LocationProvider,
    sink: UnboundedSender<LocationFix>,
    cancel: CancellationToken,
}

#[derive(Debug, Clone)]
struct CellularProfile {
    radio: RadioTechnology,
    operator_name: Option<String>,
    operator: Option<String>,
}

/// A deterministic stand-in for a handset's system services.
pub struct SimulatedPlatform {
    transports: Vec<Transport>,
    wifi: Option<WifiConnection>,
    dhcp_ip: u32,
    cellular: Option<CellularProfile>,
    telephony_permitted: bool,
    sensors: HashMap<HardwareSensor, SensorDescriptor>,
    providers: Vec<LocationProvider>,
    location_permitted: bool,
    auto_emit: bool,

    sensor_listeners: DashMap<ListenerId, SensorListener>,
    location_listeners: DashMap<ListenerId, LocationListener>,
    next_id: AtomicU64,
    started: Instant,
    cancel: CancellationToken,
}

impl SimulatedPlatform {
    pub fn builder() -> SimulatedPlatformBuilder {
        SimulatedPlatformBuilder::default()
    }

    /// A phone on Wi-Fi with an LTE radio, every sensor except heart rate,
    /// both location providers, and synthetic events flowing.
    pub fn handset() -> Self {
        Self::builder()
            .transports([Transport::Wifi])
            .wifi(WifiConnection {
                ssid: Some("\"netsense-lab\"".into()),
                bssid: Some("a4:2b:b0:1c:7e:10".into()),
                frequency_mhz: 5180,
                link_speed_mbps: 866,
                rssi: -58,
                network_id: 3,
            })
            .dhcp_ip(0x2A01_A8C0)
            .cellular(RadioTechnology::Lte, Some("Simulated Mobile"), Some("310260"))
            .sensors(HardwareSensor::iter().filter(|s| *s != HardwareSensor::HeartRate))
            .location_providers(LocationProvider::ALL)
            .auto_emit(true)
            .build()
    }

    /// Deliver `event` to every listener registered for its sensor.
    /// Returns the number of listeners reached.
    pub fn inject_sensor_event(&self, event: &SensorEvent) -> usize {
        self.sensor_listeners
            .iter()
            .filter(|l| l.sensors.contains(&event.sensor))
            .filter(|l| l.sink.send(event.clone()).is_ok())
            .count()
    }

    /// Deliver `fix` to every listener subscribed to `provider`.
    pub fn inject_fix(&self, provider: LocationProvider, fix: &LocationFix) -> usize {
        self.location_listeners
            .iter()
            .filter(|l| l.provider == provider)
            .filter(|l| l.sink.send(fix.clone()).is_ok())
            .count()
    }

    /// Live sensor listener registrations.
    pub fn sensor_listener_count(&self) -> usize {
        self.sensor_listeners.len()
    }

    /// Live location subscriptions.
    pub fn location_listener_count(&self) -> usize {
        self.location_listeners.len()
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn spawn_sensor_feed(
        &self,
        sensors: Vec<HardwareSensor>,
        rate: SamplingRate,
        sink: UnboundedSender<SensorEvent>,
        cancel: CancellationToken,
    ) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime; synthetic sensor feed disabled");
            return;
        };
        let started = self.started;
        handle.spawn(async move {
            let mut tick = tokio::time::interval(rate.period());
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = tick.tick() => {
                        let elapsed = started.elapsed();
                        for &sensor in &sensors {
                            let event = SensorEvent {
                                sensor,
                                values: synthetic_values(sensor, elapsed.as_secs_f32()),
                                accuracy: 3,
                                timestamp_ns: i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX),
                            };
                            if sink.send(event).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });
    }

    fn spawn_location_feed(
        request: UpdateRequest,
        sink: UnboundedSender<LocationFix>,
        cancel: CancellationToken,
    ) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime; synthetic location feed disabled");
            return;
        };
        handle.spawn(async move {
            let period = request.min_interval.max(Duration::from_millis(100));
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut step: u32 = 0;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = tick.tick() => {
                        let fix = synthetic_fix(request.provider, step);
                        step = step.wrapping_add(1);
                        if sink.send(fix).is_err() {
                            return;
                        }
                    }
                }
            }
        });
    }
}

impl Drop for SimulatedPlatform {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Service impls ────────────────────────────────────────────────────

impl Connectivity for SimulatedPlatform {
    fn active_transports(&self) -> Result<Vec<Transport>, Error> {
        Ok(self.transports.clone())
    }
}

impl WifiManager for SimulatedPlatform {
    fn connection_info(&self) -> Result<WifiConnection, Error> {
        self.wifi.clone().ok_or_else(|| Error::HardwareUnavailable {
            what: "wifi".into(),
        })
    }

    fn dhcp_ip_address(&self) -> Result<u32, Error> {
        if self.wifi.is_none() {
            return Err(Error::HardwareUnavailable {
                what: "wifi".into(),
            });
        }
        Ok(self.dhcp_ip)
    }
}

impl Telephony for SimulatedPlatform {
    fn data_network_type(&self) -> Result<RadioTechnology, Error> {
        Ok(self.cellular_profile()?.radio)
    }

    fn network_operator_name(&self) -> Result<Option<String>, Error> {
        Ok(self.cellular_profile()?.operator_name.clone())
    }

    fn network_operator(&self) -> Result<Option<String>, Error> {
        Ok(self.cellular_profile()?.operator.clone())
    }
}

impl SimulatedPlatform {
    fn cellular_profile(&self) -> Result<&CellularProfile, Error> {
        if !self.telephony_permitted {
            return Err(Error::PermissionDenied {
                capability: "phone state",
            });
        }
        self.cellular
            .as_ref()
            .ok_or(Error::Unsupported("telephony"))
    }
}

impl SensorManager for SimulatedPlatform {
    fn default_sensor(&self, kind: HardwareSensor) -> Option<SensorDescriptor> {
        self.sensors.get(&kind).cloned()
    }

    fn register_listener(
        &self,
        sensors: &[HardwareSensor],
        rate: SamplingRate,
        sink: UnboundedSender<SensorEvent>,
    ) -> Result<ListenerId, Error> {
        let present: Vec<HardwareSensor> = sensors
            .iter()
            .copied()
            .filter(|s| self.sensors.contains_key(s))
            .collect();
        if present.is_empty() {
            return Err(Error::HardwareUnavailable {
                what: format!("{sensors:?}"),
            });
        }

        let id = self.allocate_id();
        let cancel = self.cancel.child_token();
        if self.auto_emit {
            self.spawn_sensor_feed(present.clone(), rate, sink.clone(), cancel.clone());
        }
        debug!(?id, sensors = ?present, "sensor listener registered");
        self.sensor_listeners.insert(
            id,
            SensorListener {
                sensors: present,
                sink,
                cancel,
            },
        );
        Ok(id)
    }

    fn unregister_listener(&self, id: ListenerId) {
        if let Some((_, listener)) = self.sensor_listeners.remove(&id) {
            listener.cancel.cancel();
            debug!(?id, "sensor listener unregistered");
        }
    }
}

impl LocationManager for SimulatedPlatform {
    fn is_provider_enabled(&self, provider: LocationProvider) -> bool {
        self.providers.contains(&provider)
    }

    fn request_location_updates(
        &self,
        request: UpdateRequest,
        sink: UnboundedSender<LocationFix>,
    ) -> Result<ListenerId, Error> {
        if !self.location_permitted {
            return Err(Error::PermissionDenied {
                capability: "location",
            });
        }
        if !self.is_provider_enabled(request.provider) {
            return Err(Error::ProviderDisabled {
                provider: request.provider.as_str().into(),
            });
        }

        let id = self.allocate_id();
        let cancel = self.cancel.child_token();
        if self.auto_emit {
            Self::spawn_location_feed(request, sink.clone(), cancel.clone());
        }
        self.location_listeners.insert(
            id,
            LocationListener {
                provider: request.provider,
                sink,
                cancel,
            },
        );
        Ok(id)
    }

    fn remove_updates(&self, id: ListenerId) {
        if let Some((_, listener)) = self.location_listeners.remove(&id) {
            listener.cancel.cancel();
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Builder for [`SimulatedPlatform`]. Starts from an offline device with
/// no hardware, permissions granted and auto-emission off.
#[derive(Debug, Clone)]
pub struct SimulatedPlatformBuilder {
    transports: Vec<Transport>,
    wifi: Option<WifiConnection>,
    dhcp_ip: u32,
    cellular: Option<CellularProfile>,
    telephony_permitted: bool,
    sensors: HashMap<HardwareSensor, SensorDescriptor>,
    providers: Vec<LocationProvider>,
    location_permitted: bool,
    auto_emit: bool,
}

impl Default for SimulatedPlatformBuilder {
    fn default() -> Self {
        Self {
            transports: Vec::new(),
            wifi: None,
            dhcp_ip: 0,
            cellular: None,
            telephony_permitted: true,
            sensors: HashMap::new(),
            providers: Vec::new(),
            location_permitted: true,
            auto_emit: false,
        }
    }
}

impl SimulatedPlatformBuilder {
    pub fn transports(mut self, transports: impl IntoIterator<Item = Transport>) -> Self {
        self.transports = transports.into_iter().collect();
        self
    }

    pub fn wifi(mut self, connection: WifiConnection) -> Self {
        self.wifi = Some(connection);
        self
    }

    pub fn dhcp_ip(mut self, ip: u32) -> Self {
        self.dhcp_ip = ip;
        self
    }

    pub fn cellular(
        mut self,
        radio: RadioTechnology,
        operator_name: Option<&str>,
        operator: Option<&str>,
    ) -> Self {
        self.cellular = Some(CellularProfile {
            radio,
            operator_name: operator_name.map(str::to_owned),
            operator: operator.map(str::to_owned),
        });
        self
    }

    pub fn deny_telephony(mut self) -> Self {
        self.telephony_permitted = false;
        self
    }

    /// Add one sensor with a generated descriptor.
    pub fn sensor(mut self, kind: HardwareSensor) -> Self {
        self.sensors.insert(kind, default_descriptor(kind));
        self
    }

    pub fn sensors(mut self, kinds: impl IntoIterator<Item = HardwareSensor>) -> Self {
        for kind in kinds {
            self.sensors.insert(kind, default_descriptor(kind));
        }
        self
    }

    /// Add a sensor with an explicit descriptor.
    pub fn sensor_descriptor(mut self, descriptor: SensorDescriptor) -> Self {
        self.sensors.insert(descriptor.kind, descriptor);
        self
    }

    pub fn location_providers(mut self, providers: impl IntoIterator<Item = LocationProvider>) -> Self {
        self.providers = providers.into_iter().collect();
        self
    }

    pub fn deny_location(mut self) -> Self {
        self.location_permitted = false;
        self
    }

    pub fn auto_emit(mut self, enabled: bool) -> Self {
        self.auto_emit = enabled;
        self
    }

    pub fn build(self) -> SimulatedPlatform {
        SimulatedPlatform {
            transports: self.transports,
            wifi: self.wifi,
            dhcp_ip: self.dhcp_ip,
            cellular: self.cellular,
            telephony_permitted: self.telephony_permitted,
            sensors: self.sensors,
            providers: self.providers,
            location_permitted: self.location_permitted,
            auto_emit: self.auto_emit,
            sensor_listeners: DashMap::new(),
            location_listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
            started: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }
}

// ── Synthetic data ───────────────────────────────────────────────────

fn default_descriptor(kind: HardwareSensor) -> SensorDescriptor {
    let max_range = match kind {
        HardwareSensor::Accelerometer
        | HardwareSensor::Gravity
        | HardwareSensor::LinearAcceleration => 78.45,
        HardwareSensor::Gyroscope => 34.9,
        HardwareSensor::MagneticField => 4912.0,
        HardwareSensor::Orientation => 360.0,
        HardwareSensor::RotationVector => 1.0,
        HardwareSensor::Light => 40_000.0,
        HardwareSensor::Pressure => 1100.0,
        HardwareSensor::Proximity => 5.0,
        HardwareSensor::RelativeHumidity => 100.0,
        HardwareSensor::AmbientTemperature => 85.0,
        HardwareSensor::StepCounter => 1_000_000.0,
        HardwareSensor::HeartRate => 250.0,
    };
    SensorDescriptor {
        kind,
        name: format!("Simulated {kind}"),
        vendor: "netsense".into(),
        version: 1,
        max_range,
        resolution: 0.01,
        power_ma: 0.5,
        min_delay_us: 10_000,
    }
}

/// Slow sinusoidal values around plausible resting readings.
fn synthetic_values(kind: HardwareSensor, t: f32) -> Vec<f32> {
    let (s, c) = t.sin_cos();
    match kind {
        HardwareSensor::Accelerometer => vec![0.12 * s, 0.08 * c, 9.81],
        HardwareSensor::Gravity => vec![0.0, 0.0, 9.81],
        HardwareSensor::LinearAcceleration => vec![0.12 * s, 0.08 * c, 0.0],
        HardwareSensor::Gyroscope => vec![0.02 * s, 0.01 * c, 0.005],
        HardwareSensor::MagneticField => vec![22.0 + s, -5.0 + c, 42.0],
        HardwareSensor::Orientation => vec![(t * 10.0) % 360.0, 1.5 * s, 0.5 * c],
        HardwareSensor::RotationVector => {
            let (hs, hc) = (t / 20.0).sin_cos();
            vec![0.0, 0.0, hs, hc]
        }
        HardwareSensor::Light => vec![320.0 + 40.0 * s],
        HardwareSensor::Pressure => vec![1013.25 + 0.4 * s],
        HardwareSensor::Proximity => vec![5.0],
        HardwareSensor::RelativeHumidity => vec![45.0 + 2.0 * c],
        HardwareSensor::AmbientTemperature => vec![21.5 + 0.6 * s],
        HardwareSensor::StepCounter => vec![(t / 2.0).floor()],
        HardwareSensor::HeartRate => vec![72.0 + 3.0 * s],
    }
}

fn synthetic_fix(provider: LocationProvider, step: u32) -> LocationFix {
    let drift = f64::from(step) * 0.000_05;
    let (accuracy, altitude) = match provider {
        LocationProvider::Gps => (4.0, 32.0),
        LocationProvider::Network => (25.0, 0.0),
    };
    LocationFix {
        latitude: BASE_LATITUDE + drift,
        longitude: BASE_LONGITUDE - drift / 2.0,
        altitude,
        accuracy,
        speed: 1.2,
        bearing: 45.0,
        provider: Some(provider.as_str().into()),
    }
}
